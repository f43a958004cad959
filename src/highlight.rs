//! User highlights and the conflict resolution that keeps them disjoint
//!
//! A page keeps its highlights in creation order. Adding a highlight never
//! leaves two highlights overlapping on the same text line: the newest one
//! wins the contested area and older ones are cut back, or dropped entirely
//! once nothing of them remains.

use std::fmt;
use std::str::FromStr;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::geometry::{Point, Rect};
use crate::zoom::ZoomTransform;

/// 8-bit RGBA color, written as `#RRGGBBAA` in configuration files
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{:02x}{:02x}{:02x}{:02x}",
            self.r, self.g, self.b, self.a
        )
    }
}

impl FromStr for Rgba {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidColor(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(invalid)?;
        if !matches!(hex.len(), 6 | 8) || !hex.is_ascii() {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        let a = if hex.len() == 8 { channel(6)? } else { 255 };
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?, a))
    }
}

impl TryFrom<String> for Rgba {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgba> for String {
    fn from(color: Rgba) -> Self {
        color.to_string()
    }
}

/// One user-created highlight, possibly spanning several text lines
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    pub color: Rgba,
    pub rects: Vec<Rect>,
}

impl Highlight {
    #[must_use]
    pub fn new(color: Rgba, rects: Vec<Rect>) -> Self {
        Self { color, rects }
    }

    pub fn contains_point(&self, point: Point) -> bool {
        self.rects.iter().any(|r| r.contains_point(point))
    }
}

/// How a rectangle of a new highlight relates to an existing one
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Conflict {
    /// New rect covers the existing rect completely
    Engulfs,
    /// Existing rect already covers the new rect
    Engulfed,
    /// Horizontal overlap on the same text line
    SameLineOverlap,
    None,
}

fn classify(new: &Rect, existing: &Rect) -> Conflict {
    if new.contains(existing) {
        return Conflict::Engulfs;
    }
    if existing.contains(new) {
        return Conflict::Engulfed;
    }
    if !new.intersects(existing) {
        return Conflict::None;
    }

    // Lines stacked on top of each other can touch with some fonts. Only treat
    // the pair as a conflict when the overlap spans the full height of the
    // shorter rect.
    let shorter = new.height().min(existing.height());
    let overlap_height = new.intersection(existing).height();
    if overlap_height == shorter {
        Conflict::SameLineOverlap
    } else {
        Conflict::None
    }
}

/// Cut the part of `existing` that `new` overlaps, keeping the remainder on
/// the side that `existing` sticks out of.
#[must_use]
pub fn shrink(new: &Rect, existing: &Rect) -> Rect {
    let overlap = existing.intersection(new);
    let mut shrunk = *existing;
    if existing.x < new.x {
        shrunk.width = existing.width - overlap.width;
    } else {
        shrunk.x = existing.x + overlap.width;
        shrunk.width = existing.right() - shrunk.x;
    }
    shrunk
}

/// Resolve the rects of a new highlight against the rects of one existing
/// highlight. Both vectors are rebuilt so removal never disturbs iteration.
fn resolve_against(new_rects: &mut Vec<Rect>, existing_rects: &mut Vec<Rect>) {
    let mut kept_new = Vec::with_capacity(new_rects.len());

    for rect in std::mem::take(new_rects) {
        let mut engulfed = false;
        let mut survivors = Vec::with_capacity(existing_rects.len());

        for existing in std::mem::take(existing_rects) {
            if engulfed {
                survivors.push(existing);
                continue;
            }
            match classify(&rect, &existing) {
                Conflict::Engulfs => {}
                Conflict::Engulfed => {
                    engulfed = true;
                    survivors.push(existing);
                }
                Conflict::SameLineOverlap => survivors.push(shrink(&rect, &existing)),
                Conflict::None => survivors.push(existing),
            }
        }

        *existing_rects = survivors;
        if !engulfed {
            kept_new.push(rect);
        }
    }

    *new_rects = kept_new;
}

/// Highlights of a single page, in creation order
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HighlightSet {
    highlights: Vec<Highlight>,
}

impl HighlightSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a highlight, cutting back or removing whatever it overlaps.
    ///
    /// Returns `false` when nothing of the new highlight survived because
    /// existing highlights already cover all of it.
    pub fn add_with_conflict_resolution(&mut self, mut highlight: Highlight) -> bool {
        let existing = std::mem::take(&mut self.highlights);
        self.highlights.reserve(existing.len() + 1);

        for mut current in existing {
            resolve_against(&mut highlight.rects, &mut current.rects);
            if current.rects.is_empty() {
                debug!("Highlight {} fully replaced by new highlight", current.color);
                continue;
            }
            self.highlights.push(current);
        }

        if highlight.rects.is_empty() {
            debug!("New highlight already covered by existing highlights");
            return false;
        }
        self.highlights.push(highlight);
        true
    }

    /// Rescale every rect of every highlight
    pub fn rescale(&mut self, transform: ZoomTransform) {
        for highlight in &mut self.highlights {
            transform.rects_in_place(&mut highlight.rects);
        }
    }

    /// Index of the topmost highlight under `point`
    pub fn highlight_at(&self, point: Point) -> Option<usize> {
        self.highlights
            .iter()
            .rposition(|highlight| highlight.contains_point(point))
    }

    pub fn clear(&mut self) {
        self.highlights.clear();
    }

    pub fn highlights(&self) -> &[Highlight] {
        &self.highlights
    }

    pub fn iter(&self) -> impl Iterator<Item = &Highlight> {
        self.highlights.iter()
    }

    pub fn len(&self) -> usize {
        self.highlights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.highlights.is_empty()
    }
}

/// Alternates between two colors for successive highlights
#[derive(Clone, Debug)]
pub struct ColorCycle {
    colors: [Rgba; 2],
    next: usize,
}

impl ColorCycle {
    pub const DEFAULT_COLORS: [Rgba; 2] = [Rgba::new(255, 0, 0, 125), Rgba::new(0, 255, 0, 125)];

    #[must_use]
    pub fn new(colors: [Rgba; 2]) -> Self {
        Self { colors, next: 0 }
    }

    pub fn next_color(&mut self) -> Rgba {
        let color = self.colors[self.next];
        self.next = (self.next + 1) % self.colors.len();
        color
    }
}

impl Default for ColorCycle {
    fn default() -> Self {
        Self::new(Self::DEFAULT_COLORS)
    }
}
