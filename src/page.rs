//! A single document page with selection and highlights
//!
//! [`PageView`] is what a viewer embeds for every page on display. It owns the
//! page's selection, highlights and gesture state, feeds UI events through
//! the [`GestureController`] and carries out the resulting effects.

use std::time::Instant;

use log::{debug, error, info};

use crate::geometry::{Point, Rect};
use crate::gesture::{
    Effect, GestureConfig, GestureController, GestureEvent, Key, Modifiers, PointerButton,
    PointerShape,
};
use crate::highlight::{ColorCycle, Highlight, HighlightSet, Rgba};
use crate::oracle::{LinkTarget, OsServices, Renderer, TextGeometryOracle};
use crate::paint::{PaintCommand, PaintLayer};
use crate::selection::SelectionState;
use crate::viewport::ViewportController;
use crate::zoom::ZoomTransform;

/// Per-page behaviour knobs
#[derive(Clone, Debug, PartialEq)]
pub struct PageConfig {
    pub gestures: GestureConfig,
    /// Successive highlights alternate between these
    pub highlight_colors: [Rgba; 2],
    pub selection_color: Rgba,
}

impl PageConfig {
    pub const DEFAULT_SELECTION_COLOR: Rgba = Rgba::new(134, 171, 175, 125);
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            gestures: GestureConfig::default(),
            highlight_colors: ColorCycle::DEFAULT_COLORS,
            selection_color: Self::DEFAULT_SELECTION_COLOR,
        }
    }
}

pub struct PageView<D> {
    document: D,
    page: usize,
    selection: SelectionState,
    highlights: HighlightSet,
    gestures: GestureController,
    viewport: ViewportController,
    colors: ColorCycle,
    selection_color: Rgba,
    pointer_shape: PointerShape,
}

impl<D: TextGeometryOracle + Renderer> PageView<D> {
    pub fn new(document: D, page: usize, config: &PageConfig) -> Self {
        let zoom = document.current_zoom();
        Self {
            document,
            page,
            selection: SelectionState::new(),
            highlights: HighlightSet::new(),
            gestures: GestureController::new(config.gestures),
            viewport: ViewportController::new(zoom),
            colors: ColorCycle::new(config.highlight_colors),
            selection_color: config.selection_color,
            pointer_shape: PointerShape::default(),
        }
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn zoom(&self) -> f32 {
        self.viewport.zoom()
    }

    pub fn pointer_shape(&self) -> PointerShape {
        self.pointer_shape
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn current_highlights(&self) -> &[Highlight] {
        self.highlights.highlights()
    }

    pub fn current_selection_rects(&self) -> &[Rect] {
        self.selection.rects()
    }

    /// Deadline of the triple-click window, for scheduling [`Self::on_timer`]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.gestures.next_deadline()
    }

    /// Shift+press extends a non-empty selection to `point`
    pub fn on_pointer_press(
        &mut self,
        point: Point,
        button: PointerButton,
        modifiers: Modifiers,
        now: Instant,
        services: &mut dyn OsServices,
    ) {
        let on_link = self.document.is_over_link(point);
        let extend = modifiers.shift && !self.selection.is_empty();
        let effects = self.gestures.handle(GestureEvent::Press {
            point,
            button,
            on_link,
            extend,
            now,
        });
        self.apply(effects, services);
    }

    pub fn on_pointer_move(&mut self, point: Point, services: &mut dyn OsServices) {
        let hover = self.hover_shape(point);
        let effects = self.gestures.handle(GestureEvent::Move { point, hover });
        self.apply(effects, services);
    }

    pub fn on_pointer_release(
        &mut self,
        point: Point,
        button: PointerButton,
        services: &mut dyn OsServices,
    ) {
        let on_link = self.document.is_over_link(point);
        let on_selection = self.selection.contains_point(point);
        let effects = self.gestures.handle(GestureEvent::Release {
            point,
            button,
            on_link,
            on_selection,
        });
        self.apply(effects, services);
    }

    pub fn on_key_press(&mut self, key: Key, modifiers: Modifiers, services: &mut dyn OsServices) {
        let effects = self.gestures.handle(GestureEvent::Key { key, modifiers });
        self.apply(effects, services);
    }

    /// Deliver the triple-click timer expiry
    pub fn on_timer(&mut self, now: Instant, services: &mut dyn OsServices) {
        let effects = self.gestures.handle(GestureEvent::TimerFired { now });
        self.apply(effects, services);
    }

    /// Re-layout the page at `new_zoom` and rescale cached geometry
    pub fn on_zoom_changed(&mut self, new_zoom: f32) {
        self.document.set_zoom(new_zoom);
        if let Some(transform) =
            self.viewport
                .on_zoom_changed(new_zoom, &mut self.selection, &mut self.highlights)
        {
            self.gestures.rescale(transform);
        }
    }

    /// Select the text across a zoom-independent rect, e.g. a search hit.
    ///
    /// The selection runs from the middle of the left edge to the middle of
    /// the right edge.
    pub fn select_region(&mut self, normalized: Rect) {
        let to_page = ZoomTransform::new(1.0, self.viewport.zoom());
        let middle = normalized.center().y;
        let start = to_page.point(Point::new(normalized.x, middle));
        let end = to_page.point(Point::new(normalized.right(), middle));
        self.selection.select_between(&self.document, start, end);
    }

    /// Add a highlight from elsewhere (e.g. restored from storage)
    pub fn add_highlight(&mut self, highlight: Highlight) -> bool {
        self.highlights.add_with_conflict_resolution(highlight)
    }

    /// Highlight the current selection with the next color in the cycle
    pub fn commit_highlight(&mut self) -> bool {
        if self.selection.is_empty() {
            return false;
        }
        let rects = self.selection.take_rects();
        let color = self.colors.next_color();
        info!(
            "Highlighting {} rect(s) on page {} with {color}",
            rects.len(),
            self.page
        );
        self.highlights
            .add_with_conflict_resolution(Highlight::new(color, rects))
    }

    /// Drop the selection, e.g. when another page takes focus
    pub fn reset_selection(&mut self) {
        self.selection.clear();
    }

    /// The page leaves its document: forget everything
    pub fn detach(&mut self) {
        self.selection.clear();
        self.highlights.clear();
    }

    /// Fills to draw on top of the rendered page, selection first
    pub fn paint_commands(&self) -> Vec<PaintCommand> {
        let selection = self.selection.rects().iter().map(|rect| PaintCommand {
            rect: *rect,
            color: self.selection_color,
            layer: PaintLayer::Selection,
        });
        let highlights = self.highlights.iter().flat_map(|highlight| {
            highlight.rects.iter().map(|rect| PaintCommand {
                rect: *rect,
                color: highlight.color,
                layer: PaintLayer::Highlight,
            })
        });
        selection.chain(highlights).collect()
    }

    fn hover_shape(&self, point: Point) -> PointerShape {
        if self.document.is_over_link(point) {
            PointerShape::PointingHand
        } else if self.document.is_over_text(point) {
            PointerShape::IBeam
        } else {
            PointerShape::Arrow
        }
    }

    fn apply(&mut self, effects: Vec<Effect>, services: &mut dyn OsServices) {
        for effect in effects {
            match effect {
                Effect::ClearSelection => self.selection.clear(),
                Effect::BeginSelection(point) => self.selection.begin(point),
                Effect::ExtendSelection(point) => self.selection.extend_to(&self.document, point),
                Effect::SelectWords { anchor, cursor } => {
                    self.selection
                        .word_selection(&self.document, anchor, cursor);
                }
                Effect::SelectLine(point) => self.selection.line_selection(&self.document, point),
                Effect::CommitHighlight => {
                    self.commit_highlight();
                }
                Effect::CopySelection => self.copy_selection(services),
                Effect::FollowLink(point) => self.follow_link(point, services),
                Effect::SetPointerShape(shape) => self.pointer_shape = shape,
            }
        }
    }

    fn copy_selection(&self, services: &mut dyn OsServices) {
        let Some(text) = self.selection.text(&self.document) else {
            debug!("Nothing selected, skipping copy");
            return;
        };
        match services.set_clipboard_text(&text) {
            Ok(()) => info!("Copied {} chars to clipboard", text.chars().count()),
            Err(e) => error!("Failed to copy selection: {e}"),
        }
    }

    fn follow_link(&self, point: Point, services: &mut dyn OsServices) {
        match self.document.link_at(point) {
            Some(LinkTarget::External { uri }) => {
                info!("Opening external link {uri}");
                if let Err(e) = services.open_external_url(&uri) {
                    error!("Failed to open link: {e}");
                }
            }
            Some(LinkTarget::Internal { page, y_offset }) => {
                info!("Following link to page {page} at {y_offset}");
                services.navigate_to_page_location(page, y_offset);
            }
            None => debug!("Link vanished under {point:?}"),
        }
    }
}
