//! Paint commands handed to whatever draws the page

use crate::geometry::Rect;
use crate::highlight::Rgba;

/// Which overlay a paint command belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaintLayer {
    Selection,
    Highlight,
}

/// Fill `rect` with `color`, multiplied onto the rendered page
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PaintCommand {
    pub rect: Rect,
    pub color: Rgba,
    pub layer: PaintLayer,
}
