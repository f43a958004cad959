//! Live text selection on a page
//!
//! The selection is defined by two points; the rectangles painted for it are
//! always derived from those points through the [`TextGeometryOracle`].

use crate::geometry::{Point, Rect};
use crate::oracle::TextGeometryOracle;
use crate::zoom::ZoomTransform;

/// Selection anchor/cursor and the rectangles derived from them
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SelectionState {
    /// Where the selection started
    anchor: Point,
    /// Where the selection currently ends
    cursor: Point,
    /// Text rectangles between anchor and cursor
    buffered_rects: Vec<Rect>,
}

impl SelectionState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn anchor(&self) -> Point {
        self.anchor
    }

    pub fn cursor(&self) -> Point {
        self.cursor
    }

    pub fn rects(&self) -> &[Rect] {
        &self.buffered_rects
    }

    /// Check if any text is selected
    pub fn is_empty(&self) -> bool {
        self.buffered_rects.is_empty()
    }

    /// Start a new selection at a point without selecting anything yet
    pub fn begin(&mut self, point: Point) {
        self.anchor = point;
        self.cursor = point;
        self.buffered_rects.clear();
    }

    /// Move the cursor end and regenerate
    pub fn extend_to(&mut self, oracle: &dyn TextGeometryOracle, point: Point) {
        self.cursor = point;
        self.generate(oracle);
    }

    /// Set both endpoints explicitly and regenerate
    pub fn select_between(&mut self, oracle: &dyn TextGeometryOracle, anchor: Point, cursor: Point) {
        self.anchor = anchor;
        self.cursor = cursor;
        self.generate(oracle);
    }

    /// Re-derive the rectangles from the current endpoints
    pub fn generate(&mut self, oracle: &dyn TextGeometryOracle) {
        self.buffered_rects = oracle.rects_between(self.anchor, self.cursor);
    }

    /// Select the words spanned by two points
    pub fn word_selection(&mut self, oracle: &dyn TextGeometryOracle, anchor: Point, cursor: Point) {
        match oracle.word_bounds_at(anchor, cursor) {
            Some((start, end)) => self.select_between(oracle, start, end),
            None => {
                self.anchor = anchor;
                self.cursor = cursor;
                self.buffered_rects.clear();
            }
        }
    }

    /// Select the whole line under a point
    pub fn line_selection(&mut self, oracle: &dyn TextGeometryOracle, point: Point) {
        match oracle.line_bounds_at(point) {
            Some((start, end)) => self.select_between(oracle, start, end),
            None => {
                self.anchor = point;
                self.cursor = point;
                self.buffered_rects.clear();
            }
        }
    }

    /// Clear selection
    pub fn clear(&mut self) {
        self.buffered_rects.clear();
        self.anchor = Point::default();
        self.cursor = Point::default();
    }

    /// True when `point` lies on one of the selected rectangles
    pub fn contains_point(&self, point: Point) -> bool {
        self.buffered_rects.iter().any(|r| r.contains_point(point))
    }

    /// Text currently selected, if any
    pub fn text(&self, oracle: &dyn TextGeometryOracle) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        Some(oracle.text_between(self.anchor, self.cursor))
    }

    /// Give up ownership of the selected rectangles, clearing the selection
    pub fn take_rects(&mut self) -> Vec<Rect> {
        let rects = std::mem::take(&mut self.buffered_rects);
        self.clear();
        rects
    }

    /// Rescale endpoints and rectangles without asking the oracle again.
    ///
    /// Cached rects can drift from what the oracle would report after many
    /// rescales; a single round trip is exact up to float rounding.
    pub fn rescale(&mut self, transform: ZoomTransform) {
        if self.anchor.is_null() && self.cursor.is_null() {
            return;
        }
        self.anchor = transform.point(self.anchor);
        self.cursor = transform.point(self.cursor);
        transform.rects_in_place(&mut self.buffered_rects);
    }
}
