//! Zoom state and zoom-to-zoom coordinate mapping
//!
//! Geometry cached for a page (selection rectangles, highlights) is expressed
//! in pixels at the zoom it was produced with. When the zoom changes, every
//! cached value goes through [`ZoomTransform`]; nothing is recomputed from raw
//! pixels.

use crate::geometry::{Point, Rect};

/// Maps page coordinates from one zoom factor to another
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoomTransform {
    pub old: f32,
    pub new: f32,
}

impl ZoomTransform {
    /// Both factors must be positive and finite
    #[must_use]
    pub fn new(old: f32, new: f32) -> Self {
        debug_assert!(
            old.is_finite() && old > 0.0,
            "zoom factor must be positive, got {old}"
        );
        debug_assert!(
            new.is_finite() && new > 0.0,
            "zoom factor must be positive, got {new}"
        );
        Self { old, new }
    }

    pub fn is_identity(&self) -> bool {
        self.old == self.new
    }

    #[must_use]
    pub fn inverse(&self) -> Self {
        Self::new(self.new, self.old)
    }

    #[must_use]
    pub fn point(&self, point: Point) -> Point {
        Point::new(self.apply(point.x), self.apply(point.y))
    }

    #[must_use]
    pub fn rect(&self, rect: Rect) -> Rect {
        Rect::new(
            self.apply(rect.x),
            self.apply(rect.y),
            self.apply(rect.width),
            self.apply(rect.height),
        )
    }

    /// Rescale a list of rectangles in place
    pub fn rects_in_place(&self, rects: &mut [Rect]) {
        for rect in rects {
            *rect = self.rect(*rect);
        }
    }

    fn apply(&self, value: f32) -> f32 {
        value / self.old * self.new
    }
}

/// Zoom state of a page view
#[derive(Debug)]
pub struct Zoom {
    /// Current zoom factor (1.0 = 100%)
    pub factor: f32,
}

impl Default for Zoom {
    fn default() -> Self {
        Self { factor: 1.0 }
    }
}

impl Zoom {
    /// Zoom in rate multiplier per step - 10%
    pub const ZOOM_IN_RATE: f32 = 1.1;
    /// Zoom out rate divisor per step - 5%
    pub const ZOOM_OUT_RATE: f32 = 1.05;
    /// Minimum allowed zoom factor
    pub const MIN_SCALE: f32 = 0.1;
    /// Maximum allowed zoom factor
    pub const MAX_SCALE: f32 = 8.0;

    #[must_use]
    pub fn new(factor: f32) -> Self {
        Self {
            factor: Self::clamp_factor(factor),
        }
    }

    /// Returns the current zoom factor
    pub fn factor(&self) -> f32 {
        self.factor
    }

    /// Zoom in by one step, returning the mapping from the old factor
    pub fn step_in(&mut self) -> ZoomTransform {
        self.set(self.factor * Self::ZOOM_IN_RATE)
    }

    /// Zoom out by one step, returning the mapping from the old factor
    pub fn step_out(&mut self) -> ZoomTransform {
        self.set(self.factor / Self::ZOOM_OUT_RATE)
    }

    /// Jump to an explicit factor
    pub fn set(&mut self, factor: f32) -> ZoomTransform {
        let old = self.factor;
        self.factor = Self::clamp_factor(factor);
        ZoomTransform::new(old, self.factor)
    }

    /// Clamp factor to valid range, handling NaN/Inf
    pub fn clamp_factor(factor: f32) -> f32 {
        if !factor.is_finite() {
            1.0
        } else {
            factor.clamp(Self::MIN_SCALE, Self::MAX_SCALE)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: Rect, b: Rect) -> bool {
        const EPS: f32 = 1e-3;
        (a.x - b.x).abs() < EPS
            && (a.y - b.y).abs() < EPS
            && (a.width - b.width).abs() < EPS
            && (a.height - b.height).abs() < EPS
    }

    #[test]
    fn doubling_zoom_doubles_geometry() {
        let t = ZoomTransform::new(1.0, 2.0);
        assert_eq!(
            t.rect(Rect::new(10.0, 20.0, 30.0, 5.0)),
            Rect::new(20.0, 40.0, 60.0, 10.0)
        );
        assert_eq!(t.point(Point::new(3.0, 4.0)), Point::new(6.0, 8.0));
    }

    #[test]
    fn round_trip_restores_rects() {
        let rects = [
            Rect::new(12.5, 40.0, 133.0, 17.0),
            Rect::new(0.0, 57.0, 480.25, 17.0),
        ];
        let forward = ZoomTransform::new(1.0, 1.37);
        let mut scaled = rects;
        forward.rects_in_place(&mut scaled);
        forward.inverse().rects_in_place(&mut scaled);
        for (orig, back) in rects.iter().zip(scaled.iter()) {
            assert!(approx_eq(*orig, *back), "{orig:?} != {back:?}");
        }
    }

    #[test]
    fn step_in_then_out_reports_transforms() {
        let mut zoom = Zoom::default();
        let t = zoom.step_in();
        assert_eq!(t.old, 1.0);
        assert!((zoom.factor() - 1.1).abs() < f32::EPSILON);
        let t = zoom.step_out();
        assert!((t.old - 1.1).abs() < f32::EPSILON);
        assert!(zoom.factor() < 1.1);
    }

    #[test]
    fn clamp_factor_handles_bad_input() {
        assert_eq!(Zoom::clamp_factor(f32::NAN), 1.0);
        assert_eq!(Zoom::clamp_factor(0.0), Zoom::MIN_SCALE);
        assert_eq!(Zoom::clamp_factor(100.0), Zoom::MAX_SCALE);
    }
}
