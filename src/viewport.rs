//! Keeps cached page geometry in step with the zoom factor

use log::debug;

use crate::highlight::HighlightSet;
use crate::selection::SelectionState;
use crate::zoom::ZoomTransform;

/// Tracks the zoom a page's cached geometry was produced at
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportController {
    zoom: f32,
}

impl ViewportController {
    #[must_use]
    pub fn new(zoom: f32) -> Self {
        Self { zoom }
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Rescale the selection and all highlights to `new_zoom`.
    ///
    /// Rects are transformed directly rather than queried again, and no
    /// conflict resolution runs afterwards: uniform scaling keeps the
    /// containment and overlap relations between rects as they were.
    /// Returns the transform that was applied, if the zoom changed.
    pub fn on_zoom_changed(
        &mut self,
        new_zoom: f32,
        selection: &mut SelectionState,
        highlights: &mut HighlightSet,
    ) -> Option<ZoomTransform> {
        let transform = ZoomTransform::new(self.zoom, new_zoom);
        if transform.is_identity() {
            return None;
        }
        debug!("Rescaling page geometry from {} to {}", self.zoom, new_zoom);

        selection.rescale(transform);
        highlights.rescale(transform);
        self.zoom = new_zoom;
        Some(transform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::highlight::{Highlight, Rgba};

    #[test]
    fn unchanged_zoom_is_a_no_op() {
        let mut viewport = ViewportController::new(1.5);
        let mut selection = SelectionState::new();
        let mut highlights = HighlightSet::new();
        assert_eq!(
            viewport.on_zoom_changed(1.5, &mut selection, &mut highlights),
            None
        );
    }

    #[test]
    fn highlights_follow_zoom() {
        let mut viewport = ViewportController::new(1.0);
        let mut selection = SelectionState::new();
        let mut highlights = HighlightSet::new();
        highlights.add_with_conflict_resolution(Highlight::new(
            Rgba::new(255, 0, 0, 125),
            vec![Rect::new(10.0, 20.0, 30.0, 10.0)],
        ));

        viewport.on_zoom_changed(2.0, &mut selection, &mut highlights);

        assert_eq!(viewport.zoom(), 2.0);
        assert_eq!(
            highlights.highlights()[0].rects,
            vec![Rect::new(20.0, 40.0, 60.0, 20.0)]
        );
    }
}
