//! Plain-text page laid out on a fixed glyph grid
//!
//! Every character occupies `display width` glyph cells of a fixed size, so
//! pixel geometry is a simple function of line index and display column. At
//! zoom 1.0 a glyph cell is [`GlyphMetrics`] pixels; other zooms scale it.
//! This is the document backend used by the terminal viewer and by tests.

use std::sync::LazyLock;

use regex::Regex;
use unicode_width::UnicodeWidthChar;

use crate::geometry::{Point, Rect};
use crate::oracle::{LinkTarget, Renderer, TextGeometryOracle};

/// Form feed separates pages in plain-text documents
pub const PAGE_BREAK: char = '\x0c';

const TAB_WIDTH: usize = 4;

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?://[^\s<>()\[\]"']+"#).expect("Failed to compile url regex")
});
static PAGE_REF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bpage (\d+)\b").expect("Failed to compile page reference regex")
});

/// Glyph cell size in pixels at zoom 1.0
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlyphMetrics {
    pub width: f32,
    pub height: f32,
}

impl Default for GlyphMetrics {
    fn default() -> Self {
        Self {
            width: 8.0,
            height: 16.0,
        }
    }
}

/// Caret position between characters
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Caret {
    line: usize,
    index: usize,
}

#[derive(Clone, Debug)]
struct LinkSpan {
    /// Char range within the line
    start: usize,
    end: usize,
    target: LinkTarget,
}

#[derive(Clone, Debug)]
struct GridLine {
    chars: Vec<char>,
    /// Display column where each char starts, plus the line's end column
    columns: Vec<usize>,
    links: Vec<LinkSpan>,
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '\''
}

fn expand_tabs(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut column = 0;
    for c in line.chars() {
        if c == '\t' {
            let pad = TAB_WIDTH - column % TAB_WIDTH;
            out.extend(std::iter::repeat_n(' ', pad));
            column += pad;
        } else {
            out.push(c);
            column += c.width().unwrap_or(0);
        }
    }
    out
}

fn find_links(text: &str) -> Vec<LinkSpan> {
    let char_index = |byte: usize| text[..byte].chars().count();
    let mut links = Vec::new();

    for m in URL_RE.find_iter(text) {
        let uri = m.as_str().trim_end_matches(['.', ',', ';', ':', '!', '?']);
        let start = char_index(m.start());
        links.push(LinkSpan {
            start,
            end: start + uri.chars().count(),
            target: LinkTarget::External {
                uri: uri.to_string(),
            },
        });
    }

    for caps in PAGE_REF_RE.captures_iter(text) {
        let (Some(whole), Some(number)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let Ok(page) = number.as_str().parse::<usize>() else {
            continue;
        };
        if page == 0 {
            continue;
        }
        links.push(LinkSpan {
            start: char_index(whole.start()),
            end: char_index(whole.end()),
            target: LinkTarget::Internal {
                page: page - 1,
                y_offset: 0.0,
            },
        });
    }

    links
}

impl GridLine {
    fn new(raw: &str) -> Self {
        let text = expand_tabs(raw);
        let chars: Vec<char> = text.chars().collect();
        let mut columns = Vec::with_capacity(chars.len() + 1);
        let mut column = 0;
        for c in &chars {
            columns.push(column);
            column += c.width().unwrap_or(0);
        }
        columns.push(column);

        Self {
            links: find_links(&text),
            chars,
            columns,
        }
    }

    fn len(&self) -> usize {
        self.chars.len()
    }

    fn end_column(&self) -> usize {
        self.columns[self.chars.len()]
    }

    /// Char whose cell covers display column `column`
    fn char_at_column(&self, column: f32) -> Option<usize> {
        if column < 0.0 {
            return None;
        }
        (0..self.len()).find(|&i| {
            (self.columns[i] as f32) <= column && column < self.columns[i + 1] as f32
        })
    }

    /// Char nearest to display column `column`, clamped to the line
    fn nearest_char(&self, column: f32) -> usize {
        if self.chars.is_empty() {
            return 0;
        }
        self.char_at_column(column).unwrap_or(if column < 0.0 {
            0
        } else {
            self.len() - 1
        })
    }

    /// Caret before the first char whose middle lies right of `column`
    fn caret_at_column(&self, column: f32) -> usize {
        (0..self.len())
            .find(|&i| {
                let width = (self.columns[i + 1] - self.columns[i]) as f32;
                column < self.columns[i] as f32 + width / 2.0
            })
            .unwrap_or(self.len())
    }

    fn word_start(&self, index: usize) -> usize {
        if self.chars.is_empty() || !is_word_char(self.chars[index]) {
            return index;
        }
        let mut start = index;
        while start > 0 && is_word_char(self.chars[start - 1]) {
            start -= 1;
        }
        start
    }

    fn word_end(&self, index: usize) -> usize {
        if self.chars.is_empty() {
            return 0;
        }
        if !is_word_char(self.chars[index]) {
            return index + 1;
        }
        let mut end = index + 1;
        while end < self.len() && is_word_char(self.chars[end]) {
            end += 1;
        }
        end
    }
}

/// One page of plain text with pixel geometry
#[derive(Clone, Debug)]
pub struct TextGrid {
    lines: Vec<GridLine>,
    glyph: GlyphMetrics,
    zoom: f32,
}

impl TextGrid {
    #[must_use]
    pub fn new(text: &str, glyph: GlyphMetrics, zoom: f32) -> Self {
        Self {
            lines: text.lines().map(GridLine::new).collect(),
            glyph,
            zoom,
        }
    }

    /// Split a document on form feeds, one grid per page
    #[must_use]
    pub fn pages_from_text(text: &str, glyph: GlyphMetrics, zoom: f32) -> Vec<Self> {
        text.split(PAGE_BREAK)
            .map(|page| Self::new(page.trim_start_matches(['\r', '\n']), glyph, zoom))
            .collect()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn line_chars(&self, line: usize) -> &[char] {
        self.lines
            .get(line)
            .map(|l| l.chars.as_slice())
            .unwrap_or_default()
    }

    /// Widest line in display columns
    pub fn max_columns(&self) -> usize {
        self.lines.iter().map(GridLine::end_column).max().unwrap_or(0)
    }

    /// Glyph cell width at the current zoom
    pub fn glyph_width(&self) -> f32 {
        self.glyph.width * self.zoom
    }

    /// Line height at the current zoom
    pub fn line_height(&self) -> f32 {
        self.glyph.height * self.zoom
    }

    /// Page size in pixels at the current zoom
    pub fn page_size(&self) -> (f32, f32) {
        (
            self.max_columns() as f32 * self.glyph_width(),
            self.line_count() as f32 * self.line_height(),
        )
    }

    /// Pixel point at the left edge, vertical middle of a display cell
    pub fn point_for_cell(&self, column: usize, row: usize) -> Point {
        Point::new(
            column as f32 * self.glyph_width(),
            (row as f32 + 0.5) * self.line_height(),
        )
    }

    /// Pixel rect of a display cell
    pub fn cell_rect(&self, column: usize, row: usize) -> Rect {
        Rect::new(
            column as f32 * self.glyph_width(),
            row as f32 * self.line_height(),
            self.glyph_width(),
            self.line_height(),
        )
    }

    /// Display column of a char within its line
    pub fn char_column(&self, line: usize, index: usize) -> Option<usize> {
        self.lines
            .get(line)
            .and_then(|l| (index < l.len()).then(|| l.columns[index]))
    }

    pub fn is_link_char(&self, line: usize, index: usize) -> bool {
        self.lines.get(line).is_some_and(|l| {
            l.links
                .iter()
                .any(|link| (link.start..link.end).contains(&index))
        })
    }

    fn line_at_y(&self, y: f32) -> Option<usize> {
        if y < 0.0 {
            return None;
        }
        let line = (y / self.line_height()).floor() as usize;
        (line < self.lines.len()).then_some(line)
    }

    /// Caret for a point, clamped onto the text
    fn caret(&self, point: Point) -> Option<Caret> {
        let last = self.lines.len().checked_sub(1)?;
        if point.y < 0.0 {
            return Some(Caret { line: 0, index: 0 });
        }
        let Some(line) = self.line_at_y(point.y) else {
            return Some(Caret {
                line: last,
                index: self.lines[last].len(),
            });
        };
        let index = self.lines[line].caret_at_column(point.x / self.glyph_width());
        Some(Caret { line, index })
    }

    /// Char under or nearest to a point, as (line, index)
    fn nearest_char(&self, point: Point) -> Option<Caret> {
        let caret = self.caret(point)?;
        let index = self.lines[caret.line].nearest_char(point.x / self.glyph_width());
        Some(Caret {
            line: caret.line,
            index,
        })
    }

    /// Char exactly under a point
    fn char_at(&self, point: Point) -> Option<(usize, usize)> {
        let line = self.line_at_y(point.y)?;
        let index = self.lines[line].char_at_column(point.x / self.glyph_width())?;
        Some((line, index))
    }

    fn x_of(&self, caret: Caret) -> f32 {
        self.lines[caret.line].columns[caret.index] as f32 * self.glyph_width()
    }

    fn point_at(&self, caret: Caret) -> Point {
        Point::new(
            self.x_of(caret),
            (caret.line as f32 + 0.5) * self.line_height(),
        )
    }

    fn ordered_carets(&self, from: Point, to: Point) -> Option<(Caret, Caret)> {
        let a = self.caret(from)?;
        let b = self.caret(to)?;
        if a == b {
            return None;
        }
        Some(if a < b { (a, b) } else { (b, a) })
    }

    /// Char range of each line between two carets
    fn spans(&self, start: Caret, end: Caret) -> impl Iterator<Item = (usize, usize, usize)> + '_ {
        (start.line..=end.line).map(move |line| {
            let from = if line == start.line { start.index } else { 0 };
            let to = if line == end.line {
                end.index
            } else {
                self.lines[line].len()
            };
            (line, from, to)
        })
    }
}

impl TextGeometryOracle for TextGrid {
    fn rects_between(&self, from: Point, to: Point) -> Vec<Rect> {
        let Some((start, end)) = self.ordered_carets(from, to) else {
            return vec![];
        };
        self.spans(start, end)
            .filter(|(_, from, to)| from < to)
            .map(|(line, from, to)| {
                let left = self.x_of(Caret { line, index: from });
                let right = self.x_of(Caret { line, index: to });
                Rect::new(
                    left,
                    line as f32 * self.line_height(),
                    right - left,
                    self.line_height(),
                )
            })
            .collect()
    }

    fn word_bounds_at(&self, from: Point, to: Point) -> Option<(Point, Point)> {
        if self.line_at_y(from.y).is_none() && self.line_at_y(to.y).is_none() {
            return None;
        }
        let a = self.nearest_char(from)?;
        let b = self.nearest_char(to)?;
        let (first, last) = if a <= b { (a, b) } else { (b, a) };

        let start = Caret {
            line: first.line,
            index: self.lines[first.line].word_start(first.index),
        };
        let end = Caret {
            line: last.line,
            index: self.lines[last.line].word_end(last.index),
        };
        (start != end).then(|| (self.point_at(start), self.point_at(end)))
    }

    fn line_bounds_at(&self, point: Point) -> Option<(Point, Point)> {
        let line = self.line_at_y(point.y)?;
        let len = self.lines[line].len();
        if len == 0 {
            return None;
        }
        Some((
            self.point_at(Caret { line, index: 0 }),
            self.point_at(Caret { line, index: len }),
        ))
    }

    fn text_between(&self, from: Point, to: Point) -> String {
        let Some((start, end)) = self.ordered_carets(from, to) else {
            return String::new();
        };
        self.spans(start, end)
            .map(|(line, from, to)| self.lines[line].chars[from..to].iter().collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn is_over_text(&self, point: Point) -> bool {
        self.char_at(point)
            .is_some_and(|(line, index)| !self.lines[line].chars[index].is_whitespace())
    }

    fn link_at(&self, point: Point) -> Option<LinkTarget> {
        let (line, index) = self.char_at(point)?;
        self.lines[line]
            .links
            .iter()
            .find(|link| (link.start..link.end).contains(&index))
            .map(|link| link.target.clone())
    }
}

impl Renderer for TextGrid {
    fn current_zoom(&self) -> f32 {
        self.zoom
    }

    fn set_zoom(&mut self, zoom: f32) {
        self.zoom = zoom;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "Hello brave world\n\nsecond line here\nsee page 2 or https://example.com/a.";

    fn grid() -> TextGrid {
        TextGrid::new(TEXT, GlyphMetrics::default(), 1.0)
    }

    /// Point at the left edge of a cell, vertically centered
    fn at(column: usize, line: usize) -> Point {
        grid().point_for_cell(column, line)
    }

    #[test]
    fn rects_between_single_line() {
        let rects = grid().rects_between(at(6, 0), at(11, 0));
        assert_eq!(rects, vec![Rect::new(48.0, 0.0, 40.0, 16.0)]);
    }

    #[test]
    fn rects_between_orders_endpoints_and_spans_lines() {
        let rects = grid().rects_between(at(7, 2), at(6, 0));
        assert_eq!(
            rects,
            vec![
                Rect::new(48.0, 0.0, 88.0, 16.0),
                Rect::new(0.0, 32.0, 56.0, 16.0),
            ]
        );
    }

    #[test]
    fn rects_between_same_point_is_empty() {
        assert!(grid().rects_between(at(3, 0), at(3, 0)).is_empty());
    }

    #[test]
    fn text_between_joins_lines() {
        let g = grid();
        assert_eq!(g.text_between(at(6, 0), at(6, 2)), "brave world\n\nsecond");
    }

    #[test]
    fn word_bounds_snap_to_word() {
        let g = grid();
        let (start, end) = g.word_bounds_at(at(8, 0), at(8, 0)).unwrap();
        assert_eq!(g.text_between(start, end), "brave");
    }

    #[test]
    fn word_bounds_cover_both_points() {
        let g = grid();
        let (start, end) = g.word_bounds_at(at(13, 0), at(1, 0)).unwrap();
        assert_eq!(g.text_between(start, end), "Hello brave world");
    }

    #[test]
    fn word_bounds_below_text_is_none() {
        let g = grid();
        assert_eq!(g.word_bounds_at(at(2, 10), at(2, 10)), None);
    }

    #[test]
    fn line_bounds() {
        let g = grid();
        let (start, end) = g.line_bounds_at(at(4, 2)).unwrap();
        assert_eq!(g.text_between(start, end), "second line here");
        assert_eq!(g.line_bounds_at(at(0, 1)), None);
    }

    #[test]
    fn links_are_detected() {
        let g = grid();
        assert_eq!(
            g.link_at(at(6, 3)),
            Some(LinkTarget::Internal {
                page: 1,
                y_offset: 0.0
            })
        );
        assert_eq!(
            g.link_at(at(20, 3)),
            Some(LinkTarget::External {
                uri: "https://example.com/a".to_string()
            })
        );
        assert!(!g.is_over_link(at(0, 3)));
        assert!(g.is_link_char(3, 4));
    }

    #[test]
    fn over_text_ignores_whitespace_and_blank_area() {
        let g = grid();
        assert!(g.is_over_text(at(0, 0)));
        assert!(!g.is_over_text(at(5, 0)));
        assert!(!g.is_over_text(at(40, 0)));
        assert!(!g.is_over_text(at(0, 1)));
    }

    #[test]
    fn zoom_scales_geometry() {
        let mut g = grid();
        g.set_zoom(2.0);
        let rects = g.rects_between(g.point_for_cell(6, 0), g.point_for_cell(11, 0));
        assert_eq!(rects, vec![Rect::new(96.0, 0.0, 80.0, 32.0)]);
    }

    #[test]
    fn wide_chars_take_two_columns() {
        let g = TextGrid::new("日本 go", GlyphMetrics::default(), 1.0);
        assert_eq!(g.char_column(0, 1), Some(2));
        assert_eq!(g.char_column(0, 3), Some(5));
        let (start, end) = g.word_bounds_at(g.point_for_cell(5, 0), g.point_for_cell(5, 0)).unwrap();
        assert_eq!(g.text_between(start, end), "go");
    }

    #[test]
    fn tabs_expand_to_spaces() {
        let g = TextGrid::new("a\tb", GlyphMetrics::default(), 1.0);
        assert_eq!(g.char_column(0, 5), None);
        assert_eq!(g.line_chars(0), &['a', ' ', ' ', ' ', 'b']);
    }

    #[test]
    fn pages_split_on_form_feed() {
        let pages = TextGrid::pages_from_text("one\n\x0c\ntwo\nthree", GlyphMetrics::default(), 1.0);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1].line_count(), 2);
        assert_eq!(pages[1].line_chars(0), &['t', 'w', 'o']);
    }
}
