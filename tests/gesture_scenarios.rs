use std::time::{Duration, Instant};

use pagemark::gesture::{Key, Modifiers, PointerButton, PointerShape};
use pagemark::highlight::ColorCycle;
use pagemark::oracle::{LinkTarget, Renderer};
use pagemark::paint::PaintLayer;
use pagemark::services::Navigation;
use pagemark::test_utils::test_helpers::{FakeOracle, RecordingServices};
use pagemark::text_grid::{GlyphMetrics, TextGrid};
use pagemark::{PageConfig, PageView, Point, Rect};

const TEXT: &str = "Hello brave world\nsee page 2 or https://example.com/a.";

fn page() -> PageView<TextGrid> {
    PageView::new(
        TextGrid::new(TEXT, GlyphMetrics::default(), 1.0),
        0,
        &PageConfig::default(),
    )
}

/// Middle of the left edge of a glyph cell at zoom 1.0
fn cell(column: usize, row: usize) -> Point {
    Point::new(column as f32 * 8.0, row as f32 * 16.0 + 8.0)
}

/// Same as [`cell`] at another zoom factor
fn zoomed_cell(column: usize, row: usize, zoom: f32) -> Point {
    let point = cell(column, row);
    Point::new(point.x * zoom, point.y * zoom)
}

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

struct Driver {
    page: PageView<TextGrid>,
    services: RecordingServices,
    start: Instant,
}

impl Driver {
    fn new() -> Self {
        Self {
            page: page(),
            services: RecordingServices::new(),
            start: Instant::now(),
        }
    }

    fn press(&mut self, point: Point, at: u64) {
        self.press_with(point, Modifiers::NONE, at);
    }

    fn press_with(&mut self, point: Point, modifiers: Modifiers, at: u64) {
        self.page.on_pointer_press(
            point,
            PointerButton::Primary,
            modifiers,
            self.start + ms(at),
            &mut self.services,
        );
    }

    fn release(&mut self, point: Point) {
        self.page
            .on_pointer_release(point, PointerButton::Primary, &mut self.services);
    }

    fn click(&mut self, point: Point, at: u64) {
        self.press(point, at);
        self.release(point);
    }

    fn drag(&mut self, from: Point, to: Point, at: u64) {
        self.press(from, at);
        self.page.on_pointer_move(to, &mut self.services);
        self.release(to);
    }

    fn right_click(&mut self, point: Point) {
        self.page.on_pointer_press(
            point,
            PointerButton::Secondary,
            Modifiers::NONE,
            self.start,
            &mut self.services,
        );
        self.page
            .on_pointer_release(point, PointerButton::Secondary, &mut self.services);
    }

    fn copy(&mut self) {
        self.page
            .on_key_press(Key::Char('c'), Modifiers::CTRL, &mut self.services);
    }
}

#[test]
fn shift_click_extends_selection() {
    let mut d = Driver::new();
    d.drag(cell(0, 0), cell(5, 0), 0);

    d.press_with(cell(11, 0), Modifiers::SHIFT, 1000);
    d.release(cell(11, 0));
    assert_eq!(
        d.page.current_selection_rects(),
        &[Rect::new(0.0, 0.0, 88.0, 16.0)]
    );

    d.copy();
    assert_eq!(d.services.clipboard, vec!["Hello brave".to_string()]);
}

#[test]
fn shift_click_without_selection_starts_one() {
    let mut d = Driver::new();
    d.press_with(cell(6, 0), Modifiers::SHIFT, 0);
    d.page.on_pointer_move(cell(11, 0), &mut d.services);
    d.release(cell(11, 0));

    d.copy();
    assert_eq!(d.services.clipboard, vec!["brave".to_string()]);
}

#[test]
fn drag_selects_and_copies_text() {
    let mut d = Driver::new();
    d.drag(cell(0, 0), cell(5, 0), 0);

    assert_eq!(
        d.page.current_selection_rects(),
        &[Rect::new(0.0, 0.0, 40.0, 16.0)]
    );

    d.copy();
    assert_eq!(d.services.clipboard, vec!["Hello".to_string()]);
}

#[test]
fn drag_across_lines_gives_one_rect_per_line() {
    let mut d = Driver::new();
    d.drag(cell(12, 0), cell(3, 1), 0);

    assert_eq!(
        d.page.current_selection_rects(),
        &[
            Rect::new(96.0, 0.0, 40.0, 16.0),
            Rect::new(0.0, 16.0, 24.0, 16.0),
        ]
    );
    d.copy();
    assert_eq!(d.services.clipboard, vec!["world\nsee".to_string()]);
}

#[test]
fn click_after_drag_clears_selection() {
    let mut d = Driver::new();
    d.drag(cell(0, 0), cell(5, 0), 0);
    d.click(cell(10, 0), 1000);

    assert!(d.page.current_selection_rects().is_empty());
}

#[test]
fn copy_without_selection_does_nothing() {
    let mut d = Driver::new();
    d.copy();
    assert!(d.services.clipboard.is_empty());
}

#[test]
fn double_click_selects_word_and_drag_extends_by_words() {
    let mut d = Driver::new();
    d.click(cell(7, 0), 0);
    d.press(cell(7, 0), 100);

    assert_eq!(
        d.page.current_selection_rects(),
        &[Rect::new(48.0, 0.0, 40.0, 16.0)]
    );

    // Into "world": the selection snaps to its end
    d.page.on_pointer_move(cell(13, 0), &mut d.services);
    d.release(cell(13, 0));
    assert_eq!(
        d.page.current_selection_rects(),
        &[Rect::new(48.0, 0.0, 88.0, 16.0)]
    );

    d.copy();
    assert_eq!(d.services.clipboard, vec!["brave world".to_string()]);
}

#[test]
fn slow_second_click_is_not_a_double_click() {
    let mut d = Driver::new();
    d.click(cell(7, 0), 0);
    d.press(cell(7, 0), 600);

    assert!(d.page.current_selection_rects().is_empty());
}

#[test]
fn triple_click_selects_line() {
    let mut d = Driver::new();
    d.click(cell(7, 0), 0);
    d.click(cell(7, 0), 100);
    d.press(cell(7, 0), 200);

    assert_eq!(
        d.page.current_selection_rects(),
        &[Rect::new(0.0, 0.0, 136.0, 16.0)]
    );
}

#[test]
fn triple_click_window_closes() {
    let mut d = Driver::new();
    d.click(cell(7, 0), 0);
    d.click(cell(7, 0), 100);

    let deadline = d.page.next_deadline().unwrap();
    assert_eq!(deadline, d.start + ms(550));

    d.page.on_timer(d.start + ms(600), &mut d.services);
    assert_eq!(d.page.next_deadline(), None);

    d.press(cell(7, 0), 650);
    assert!(d.page.current_selection_rects().is_empty());
}

#[test]
fn moving_during_word_drag_cancels_triple_click() {
    let mut d = Driver::new();
    d.click(cell(7, 0), 0);
    d.press(cell(7, 0), 100);
    d.page.on_pointer_move(cell(13, 0), &mut d.services);
    d.page.on_pointer_move(cell(7, 0), &mut d.services);
    d.release(cell(7, 0));

    d.press(cell(7, 0), 200);
    assert!(d.page.current_selection_rects().is_empty());
}

#[test]
fn right_click_on_selection_highlights_it() {
    let mut d = Driver::new();
    d.drag(cell(0, 0), cell(5, 0), 0);
    d.right_click(cell(2, 0));

    assert!(d.page.current_selection_rects().is_empty());
    let highlights = d.page.current_highlights();
    assert_eq!(highlights.len(), 1);
    assert_eq!(highlights[0].color, ColorCycle::DEFAULT_COLORS[0]);
    assert_eq!(highlights[0].rects, vec![Rect::new(0.0, 0.0, 40.0, 16.0)]);

    // Next highlight takes the other color
    d.click(cell(7, 0), 1000);
    d.click(cell(7, 0), 1100);
    d.right_click(cell(8, 0));

    let highlights = d.page.current_highlights();
    assert_eq!(highlights.len(), 2);
    assert_eq!(highlights[1].color, ColorCycle::DEFAULT_COLORS[1]);
}

#[test]
fn right_click_off_selection_keeps_it() {
    let mut d = Driver::new();
    d.drag(cell(0, 0), cell(5, 0), 0);
    d.right_click(cell(14, 0));

    assert!(d.page.current_highlights().is_empty());
    assert_eq!(d.page.current_selection_rects().len(), 1);
}

#[test]
fn highlighting_over_a_highlight_trims_it() {
    let mut d = Driver::new();
    d.drag(cell(0, 0), cell(11, 0), 0);
    d.right_click(cell(1, 0));
    d.drag(cell(6, 0), cell(17, 0), 1000);
    d.right_click(cell(15, 0));

    let highlights = d.page.current_highlights();
    assert_eq!(highlights.len(), 2);
    assert_eq!(highlights[0].rects, vec![Rect::new(0.0, 0.0, 48.0, 16.0)]);
    assert_eq!(highlights[1].rects, vec![Rect::new(48.0, 0.0, 88.0, 16.0)]);
}

#[test]
fn clicking_a_link_opens_it() {
    let mut d = Driver::new();
    d.click(cell(20, 1), 0);

    assert_eq!(d.services.opened_urls, vec!["https://example.com/a".to_string()]);
    assert!(d.page.current_selection_rects().is_empty());
}

#[test]
fn clicking_a_page_reference_navigates() {
    let mut d = Driver::new();
    d.click(cell(6, 1), 0);

    assert_eq!(
        d.services.navigations,
        vec![Navigation {
            page: 1,
            y_offset: 0.0
        }]
    );
}

#[test]
fn dragging_off_a_link_does_not_follow_it() {
    let mut d = Driver::new();
    d.drag(cell(20, 1), cell(2, 0), 0);

    assert!(d.services.opened_urls.is_empty());
}

#[test]
fn pointer_shape_follows_content() {
    let mut d = Driver::new();

    d.page.on_pointer_move(cell(1, 0), &mut d.services);
    assert_eq!(d.page.pointer_shape(), PointerShape::IBeam);

    d.page.on_pointer_move(cell(20, 1), &mut d.services);
    assert_eq!(d.page.pointer_shape(), PointerShape::PointingHand);

    d.page.on_pointer_move(cell(30, 0), &mut d.services);
    assert_eq!(d.page.pointer_shape(), PointerShape::Arrow);
}

#[test]
fn zoom_during_free_drag_keeps_the_anchor_on_its_character() {
    let mut d = Driver::new();
    d.press(cell(6, 0), 0);
    d.page.on_zoom_changed(2.0);

    let to = zoomed_cell(17, 0, 2.0);
    d.page.on_pointer_move(to, &mut d.services);
    d.release(to);

    assert_eq!(
        d.page.current_selection_rects(),
        &[Rect::new(96.0, 0.0, 176.0, 32.0)]
    );
    d.copy();
    assert_eq!(d.services.clipboard, vec!["brave world".to_string()]);
}

#[test]
fn zoom_during_word_drag_keeps_the_first_word() {
    let mut d = Driver::new();
    d.click(cell(7, 0), 0);
    d.press(cell(7, 0), 100);
    d.page.on_zoom_changed(2.0);
    assert_eq!(
        d.page.current_selection_rects(),
        &[Rect::new(96.0, 0.0, 80.0, 32.0)]
    );

    let to = zoomed_cell(13, 0, 2.0);
    d.page.on_pointer_move(to, &mut d.services);
    d.release(to);

    assert_eq!(
        d.page.current_selection_rects(),
        &[Rect::new(96.0, 0.0, 176.0, 32.0)]
    );
}

#[test]
fn double_click_survives_a_zoom_between_clicks() {
    let mut d = Driver::new();
    d.click(cell(7, 0), 0);
    d.page.on_zoom_changed(2.0);
    d.press(zoomed_cell(7, 0, 2.0), 100);

    assert_eq!(
        d.page.current_selection_rects(),
        &[Rect::new(96.0, 0.0, 80.0, 32.0)]
    );
}

#[test]
fn zoom_rescales_without_asking_the_oracle() {
    let oracle = FakeOracle::with_rects(vec![Rect::new(10.0, 0.0, 30.0, 16.0)]);
    let mut page = PageView::new(oracle, 0, &PageConfig::default());
    let mut services = RecordingServices::new();

    page.on_pointer_press(
        Point::new(10.0, 8.0),
        PointerButton::Primary,
        Modifiers::NONE,
        Instant::now(),
        &mut services,
    );
    page.on_pointer_move(Point::new(40.0, 8.0), &mut services);
    page.on_pointer_release(Point::new(40.0, 8.0), PointerButton::Primary, &mut services);
    assert!(page.commit_highlight());

    page.on_pointer_press(
        Point::new(10.0, 8.0),
        PointerButton::Primary,
        Modifiers::NONE,
        Instant::now(),
        &mut services,
    );
    page.on_pointer_move(Point::new(40.0, 8.0), &mut services);
    let queries = page.document().rect_queries();

    page.on_zoom_changed(2.0);

    assert_eq!(page.document().rect_queries(), queries);
    assert_eq!(page.document().current_zoom(), 2.0);
    assert_eq!(page.zoom(), 2.0);
    assert_eq!(
        page.current_selection_rects(),
        &[Rect::new(20.0, 0.0, 60.0, 32.0)]
    );
    assert_eq!(
        page.current_highlights()[0].rects,
        vec![Rect::new(20.0, 0.0, 60.0, 32.0)]
    );

    page.on_zoom_changed(1.0);
    assert_eq!(
        page.current_selection_rects(),
        &[Rect::new(10.0, 0.0, 30.0, 16.0)]
    );
}

#[test]
fn paint_commands_put_selection_first() {
    let mut d = Driver::new();
    d.drag(cell(0, 0), cell(5, 0), 0);
    d.right_click(cell(1, 0));
    d.drag(cell(6, 0), cell(11, 0), 1000);

    let commands = d.page.paint_commands();
    assert_eq!(commands.len(), 2);
    assert_eq!(commands[0].layer, PaintLayer::Selection);
    assert_eq!(commands[0].rect, Rect::new(48.0, 0.0, 40.0, 16.0));
    assert_eq!(commands[0].color, PageConfig::DEFAULT_SELECTION_COLOR);
    assert_eq!(commands[1].layer, PaintLayer::Highlight);
    assert_eq!(commands[1].rect, Rect::new(0.0, 0.0, 40.0, 16.0));
}

#[test]
fn select_region_maps_normalized_rect_to_current_zoom() {
    let mut d = Driver::new();
    d.page.on_zoom_changed(2.0);
    d.page.select_region(Rect::new(48.0, 0.0, 40.0, 16.0));

    assert_eq!(
        d.page.current_selection_rects(),
        &[Rect::new(96.0, 0.0, 80.0, 32.0)]
    );
}

#[test]
fn detach_forgets_selection_and_highlights() {
    let mut d = Driver::new();
    d.drag(cell(0, 0), cell(5, 0), 0);
    d.right_click(cell(1, 0));
    d.drag(cell(6, 0), cell(11, 0), 1000);

    d.page.detach();
    assert!(d.page.current_highlights().is_empty());
    assert!(d.page.current_selection_rects().is_empty());
}

#[test]
fn failing_clipboard_is_not_fatal() {
    let mut d = Driver::new();
    d.services.clipboard_broken = true;
    d.drag(cell(0, 0), cell(5, 0), 0);
    d.copy();

    assert!(d.services.clipboard.is_empty());
    assert_eq!(d.page.current_selection_rects().len(), 1);
}

#[test]
fn link_lookup_uses_fake_oracle_area() {
    let oracle = FakeOracle::new().with_link(
        Rect::new(0.0, 0.0, 50.0, 16.0),
        LinkTarget::External {
            uri: "https://example.org".to_string(),
        },
    );
    let mut page = PageView::new(oracle, 0, &PageConfig::default());
    let mut services = RecordingServices::new();

    let point = Point::new(10.0, 8.0);
    page.on_pointer_press(
        point,
        PointerButton::Primary,
        Modifiers::NONE,
        Instant::now(),
        &mut services,
    );
    page.on_pointer_release(point, PointerButton::Primary, &mut services);
    assert_eq!(services.opened_urls, vec!["https://example.org".to_string()]);
}
