pub mod test_helpers {
    use std::cell::Cell;

    use crate::error::{Error, Result};
    use crate::event_source::{Event, SimulatedEventSource};
    use crate::geometry::{Point, Rect};
    use crate::oracle::{LinkTarget, OsServices, Renderer, TextGeometryOracle};
    use crate::services::{Navigation, NavigationQueue};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    /// Oracle with canned answers, counting geometry queries
    #[derive(Debug)]
    pub struct FakeOracle {
        /// Returned by every `rects_between` call
        pub rects: Vec<Rect>,
        pub word_bounds: Option<(Point, Point)>,
        pub line_bounds: Option<(Point, Point)>,
        pub text: String,
        /// Points inside this rect are over text
        pub text_area: Option<Rect>,
        /// Points inside this rect are over `link`
        pub link_area: Option<Rect>,
        pub link: Option<LinkTarget>,
        pub zoom: f32,
        rect_queries: Cell<usize>,
    }

    impl Default for FakeOracle {
        fn default() -> Self {
            Self {
                rects: vec![],
                word_bounds: None,
                line_bounds: None,
                text: String::new(),
                text_area: None,
                link_area: None,
                link: None,
                zoom: 1.0,
                rect_queries: Cell::new(0),
            }
        }
    }

    impl FakeOracle {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_rects(rects: Vec<Rect>) -> Self {
            Self {
                rects,
                ..Self::new()
            }
        }

        pub fn with_link(mut self, area: Rect, target: LinkTarget) -> Self {
            self.link_area = Some(area);
            self.link = Some(target);
            self
        }

        /// Number of `rects_between` calls so far
        pub fn rect_queries(&self) -> usize {
            self.rect_queries.get()
        }
    }

    impl TextGeometryOracle for FakeOracle {
        fn rects_between(&self, _from: Point, _to: Point) -> Vec<Rect> {
            self.rect_queries.set(self.rect_queries.get() + 1);
            self.rects.clone()
        }

        fn word_bounds_at(&self, _from: Point, _to: Point) -> Option<(Point, Point)> {
            self.word_bounds
        }

        fn line_bounds_at(&self, _point: Point) -> Option<(Point, Point)> {
            self.line_bounds
        }

        fn text_between(&self, _from: Point, _to: Point) -> String {
            self.text.clone()
        }

        fn is_over_text(&self, point: Point) -> bool {
            self.text_area.is_some_and(|area| area.contains_point(point))
        }

        fn link_at(&self, point: Point) -> Option<LinkTarget> {
            self.link_area
                .filter(|area| area.contains_point(point))
                .and(self.link.clone())
        }
    }

    impl Renderer for FakeOracle {
        fn current_zoom(&self) -> f32 {
            self.zoom
        }

        fn set_zoom(&mut self, zoom: f32) {
            self.zoom = zoom;
        }
    }

    /// Services that remember every request instead of touching the system
    #[derive(Debug, Default)]
    pub struct RecordingServices {
        pub clipboard: Vec<String>,
        pub opened_urls: Vec<String>,
        pub navigations: Vec<Navigation>,
        /// Make clipboard writes fail
        pub clipboard_broken: bool,
        pending_navigation: Option<Navigation>,
    }

    impl RecordingServices {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl OsServices for RecordingServices {
        fn set_clipboard_text(&mut self, text: &str) -> Result<()> {
            if self.clipboard_broken {
                return Err(Error::Clipboard("clipboard unavailable".to_string()));
            }
            self.clipboard.push(text.to_string());
            Ok(())
        }

        fn open_external_url(&mut self, uri: &str) -> Result<()> {
            self.opened_urls.push(uri.to_string());
            Ok(())
        }

        fn navigate_to_page_location(&mut self, page: usize, y_offset: f32) {
            let navigation = Navigation { page, y_offset };
            self.navigations.push(navigation);
            self.pending_navigation = Some(navigation);
        }
    }

    impl NavigationQueue for RecordingServices {
        fn take_navigation(&mut self) -> Option<Navigation> {
            self.pending_navigation.take()
        }
    }

    /// Builder for creating test scenarios with simulated user input.
    ///
    /// Mouse positions are terminal cells.
    #[derive(Default)]
    pub struct TestScenarioBuilder {
        events: Vec<Event>,
    }

    impl TestScenarioBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn press_char(mut self, c: char) -> Self {
            self.events.push(SimulatedEventSource::char_key(c));
            self
        }

        pub fn press_ctrl_char(mut self, c: char) -> Self {
            self.events.push(SimulatedEventSource::ctrl_char_key(c));
            self
        }

        pub fn click(mut self, column: u16, row: u16) -> Self {
            self.events.extend(SimulatedEventSource::click(column, row));
            self
        }

        pub fn shift_click(mut self, column: u16, row: u16) -> Self {
            self.events
                .extend(SimulatedEventSource::shift_click(column, row));
            self
        }

        pub fn double_click(self, column: u16, row: u16) -> Self {
            self.click(column, row).click(column, row)
        }

        pub fn triple_click(self, column: u16, row: u16) -> Self {
            self.double_click(column, row).click(column, row)
        }

        pub fn right_click(mut self, column: u16, row: u16) -> Self {
            self.events
                .extend(SimulatedEventSource::right_click(column, row));
            self
        }

        /// Press at one cell, drag to another and release there
        pub fn drag(mut self, from: (u16, u16), to: (u16, u16)) -> Self {
            self.events.push(SimulatedEventSource::mouse_down(from.0, from.1));
            self.events.push(SimulatedEventSource::mouse_drag(to.0, to.1));
            self.events.push(SimulatedEventSource::mouse_up(to.0, to.1));
            self
        }

        pub fn hover(mut self, column: u16, row: u16) -> Self {
            self.events
                .push(SimulatedEventSource::mouse_moved(column, row));
            self
        }

        pub fn quit(mut self) -> Self {
            self.events.push(SimulatedEventSource::char_key('q'));
            self
        }

        pub fn build(self) -> SimulatedEventSource {
            SimulatedEventSource::new(self.events)
        }
    }

    /// Create a test terminal for snapshot testing
    pub fn create_test_terminal(width: u16, height: u16) -> Terminal<TestBackend> {
        let backend = TestBackend::new(width, height);
        Terminal::new(backend).unwrap()
    }

    /// Capture the current terminal buffer as a string
    pub fn capture_terminal_state(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let mut lines = Vec::new();

        for y in 0..buffer.area.height {
            let mut line = String::new();
            for x in 0..buffer.area.width {
                line.push_str(buffer[(x, y)].symbol());
            }
            lines.push(line.trim_end().to_string());
        }

        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::test_helpers::*;

    #[test]
    fn test_scenario_builder() {
        let scenario = TestScenarioBuilder::new()
            .triple_click(2, 1)
            .drag((1, 1), (5, 1))
            .right_click(3, 1)
            .press_ctrl_char('c')
            .quit()
            .build();

        assert_eq!(scenario.events.len(), 6 + 3 + 2 + 1 + 1);
    }
}
