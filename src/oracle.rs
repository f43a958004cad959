//! Capabilities the highlight engine consumes from its surroundings
//!
//! The engine never renders pages or inspects document text itself. A
//! document backend answers geometry questions through
//! [`TextGeometryOracle`] and reports its zoom through [`Renderer`]; side
//! effects that leave the page go through [`OsServices`].

use crate::error::Result;
use crate::geometry::{Point, Rect};

/// Link target type
#[derive(Clone, Debug, PartialEq)]
pub enum LinkTarget {
    /// Location inside the document (0-indexed page, offset in page pixels)
    Internal { page: usize, y_offset: f32 },
    External { uri: String },
}

/// Text geometry queries against the page currently on display.
///
/// All points and rects are page pixels at the renderer's current zoom.
/// Queries must be cheap; they are made synchronously from event handlers.
pub trait TextGeometryOracle {
    /// Rectangles covering the text between two points, one per line
    fn rects_between(&self, from: Point, to: Point) -> Vec<Rect>;

    /// The two points expanded outwards to whole-word boundaries
    fn word_bounds_at(&self, from: Point, to: Point) -> Option<(Point, Point)>;

    /// Start and end of the text line under `point`
    fn line_bounds_at(&self, point: Point) -> Option<(Point, Point)>;

    /// Plain text between two points
    fn text_between(&self, from: Point, to: Point) -> String;

    fn is_over_text(&self, point: Point) -> bool;

    fn link_at(&self, point: Point) -> Option<LinkTarget>;

    fn is_over_link(&self, point: Point) -> bool {
        self.link_at(point).is_some()
    }
}

/// Page renderer state the page view depends on
pub trait Renderer {
    fn current_zoom(&self) -> f32;

    /// Re-layout the page for a new zoom factor
    fn set_zoom(&mut self, zoom: f32);
}

/// Side effects outside the page: clipboard, browser, document navigation
pub trait OsServices {
    fn set_clipboard_text(&mut self, text: &str) -> Result<()>;

    fn open_external_url(&mut self, uri: &str) -> Result<()>;

    fn navigate_to_page_location(&mut self, page: usize, y_offset: f32);
}
