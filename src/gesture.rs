//! Pointer gesture state machine
//!
//! [`GestureController::handle`] consumes one [`GestureEvent`] and returns the
//! [`Effect`]s the page should carry out. The controller never touches the
//! selection, the highlights or the document itself: everything it needs to
//! know about the page (is the pointer over a link, over the selection) is
//! carried on the event. That keeps every transition testable with plain
//! values and timestamps.

use std::time::{Duration, Instant};

use log::debug;

use crate::geometry::Point;
use crate::zoom::ZoomTransform;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        ctrl: false,
        shift: false,
        alt: false,
    };
    pub const CTRL: Self = Self {
        ctrl: true,
        shift: false,
        alt: false,
    };
    pub const SHIFT: Self = Self {
        ctrl: false,
        shift: true,
        alt: false,
    };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Escape,
    Other,
}

/// Pointer shape hint for the host surface
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PointerShape {
    #[default]
    Arrow,
    /// Over selectable text
    IBeam,
    /// Over a link
    PointingHand,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragMode {
    /// Plain drag, selection follows the pointer exactly
    FreeSelection,
    /// Drag after a double click, both ends snap to word boundaries
    WordExpand,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GestureState {
    #[default]
    Idle,
    Dragging(DragMode),
}

/// Input delivered to the state machine
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GestureEvent {
    Press {
        point: Point,
        button: PointerButton,
        /// The page reports a link under `point`
        on_link: bool,
        /// Extend the current selection instead of starting a new one
        extend: bool,
        now: Instant,
    },
    Move {
        point: Point,
        hover: PointerShape,
    },
    Release {
        point: Point,
        button: PointerButton,
        on_link: bool,
        /// `point` lies on the current selection
        on_selection: bool,
    },
    Key {
        key: Key,
        modifiers: Modifiers,
    },
    TimerFired {
        now: Instant,
    },
}

/// Work the page has to do in response to an event
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Effect {
    ClearSelection,
    /// Set anchor and cursor to a point, nothing selected yet
    BeginSelection(Point),
    /// Move the cursor and regenerate the selection
    ExtendSelection(Point),
    /// Select the words between two points
    SelectWords { anchor: Point, cursor: Point },
    /// Select the line under a point
    SelectLine(Point),
    /// Turn the current selection into a highlight
    CommitHighlight,
    /// Copy the selected text to the clipboard
    CopySelection,
    /// Follow the link under a point
    FollowLink(Point),
    SetPointerShape(PointerShape),
}

/// Timing and distance thresholds for click detection
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GestureConfig {
    /// Max gap between two presses of a double click
    pub double_click_interval: Duration,
    /// How long after a double click a third press counts as a triple click
    pub triple_click_interval: Duration,
    /// Max distance in pixels between presses of the same multi-click
    pub click_slop: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            double_click_interval: Duration::from_millis(450),
            triple_click_interval: Duration::from_millis(450),
            click_slop: 1.0,
        }
    }
}

/// One-shot timer opened by a double click.
///
/// Arming again replaces the previous deadline, so an expiry notification
/// for a superseded timer has no effect.
#[derive(Clone, Debug)]
pub struct TripleClickTimer {
    interval: Duration,
    deadline: Option<Instant>,
}

impl TripleClickTimer {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            deadline: None,
        }
    }

    pub fn arm(&mut self, now: Instant) {
        self.deadline = Some(now + self.interval);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_running(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now <= deadline)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Drop the deadline if it has passed. Returns true when it did.
    pub fn expire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now > deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickType {
    Single,
    Double,
}

/// Detects double clicks from press/release pairs
#[derive(Clone, Debug)]
pub struct ClickTracker {
    interval: Duration,
    slop: f32,
    /// Press waiting for its release
    pending: Option<(Point, Instant)>,
    /// Last press released in place
    last_click: Option<(Point, Instant)>,
}

impl ClickTracker {
    #[must_use]
    pub fn new(interval: Duration, slop: f32) -> Self {
        Self {
            interval,
            slop,
            pending: None,
            last_click: None,
        }
    }

    pub fn press(&mut self, point: Point, now: Instant) -> ClickType {
        let is_double = self.last_click.take().is_some_and(|(last, at)| {
            now.saturating_duration_since(at) <= self.interval
                && last.distance_to(point) <= self.slop
        });

        if is_double {
            self.pending = None;
            ClickType::Double
        } else {
            self.pending = Some((point, now));
            ClickType::Single
        }
    }

    /// A press released where it started counts as a click
    pub fn release(&mut self, point: Point) {
        if let Some((pressed, at)) = self.pending.take() {
            if pressed.distance_to(point) <= self.slop {
                self.last_click = Some((pressed, at));
            }
        }
    }

    pub fn reset(&mut self) {
        self.pending = None;
        self.last_click = None;
    }

    pub fn rescale(&mut self, transform: ZoomTransform) {
        for (point, _) in self.pending.iter_mut().chain(self.last_click.iter_mut()) {
            *point = transform.point(*point);
        }
    }
}

/// Selection gesture state machine of one page
#[derive(Clone, Debug)]
pub struct GestureController {
    state: GestureState,
    /// Press point of the current drag
    anchor: Point,
    press_on_link: bool,
    /// The current drag continues an existing selection
    extending: bool,
    clicks: ClickTracker,
    triple_click: TripleClickTimer,
}

impl Default for GestureController {
    fn default() -> Self {
        Self::new(GestureConfig::default())
    }
}

impl GestureController {
    #[must_use]
    pub fn new(config: GestureConfig) -> Self {
        Self {
            state: GestureState::Idle,
            anchor: Point::default(),
            press_on_link: false,
            extending: false,
            clicks: ClickTracker::new(config.double_click_interval, config.click_slop),
            triple_click: TripleClickTimer::new(config.triple_click_interval),
        }
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    /// When the host should deliver [`GestureEvent::TimerFired`]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.triple_click.deadline()
    }

    /// Move cached press points to a new zoom
    pub fn rescale(&mut self, transform: ZoomTransform) {
        self.anchor = transform.point(self.anchor);
        self.clicks.rescale(transform);
    }

    /// Apply an event and return resulting effects
    #[must_use]
    pub fn handle(&mut self, event: GestureEvent) -> Vec<Effect> {
        match event {
            GestureEvent::Press {
                point,
                button: PointerButton::Primary,
                on_link,
                extend,
                now,
            } => self.primary_press(point, on_link, extend, now),

            // Secondary button is reserved for highlighting, which happens on release
            GestureEvent::Press { .. } => vec![],

            GestureEvent::Move { point, hover } => self.pointer_move(point, hover),

            GestureEvent::Release {
                point,
                button: PointerButton::Primary,
                on_link,
                ..
            } => self.primary_release(point, on_link),

            GestureEvent::Release {
                button: PointerButton::Secondary,
                on_selection,
                ..
            } => {
                if on_selection {
                    vec![Effect::CommitHighlight]
                } else {
                    vec![]
                }
            }

            GestureEvent::Release { .. } => vec![],

            GestureEvent::Key { key, modifiers } => match key {
                Key::Char(c) if modifiers.ctrl && c.eq_ignore_ascii_case(&'c') => {
                    vec![Effect::CopySelection]
                }
                _ => vec![],
            },

            GestureEvent::TimerFired { now } => {
                if self.triple_click.expire(now) {
                    debug!("Triple click window closed");
                }
                vec![]
            }
        }
    }

    fn primary_press(
        &mut self,
        point: Point,
        on_link: bool,
        extend: bool,
        now: Instant,
    ) -> Vec<Effect> {
        self.press_on_link = false;

        if extend {
            self.clicks.reset();
            self.triple_click.cancel();
            self.extending = true;
            self.anchor = point;
            self.state = GestureState::Dragging(DragMode::FreeSelection);
            return vec![Effect::ExtendSelection(point)];
        }

        let mut effects = vec![Effect::ClearSelection];

        if self.triple_click.is_running(now) {
            debug!("Triple click at {point:?}");
            self.triple_click.cancel();
            self.clicks.reset();
            self.state = GestureState::Idle;
            effects.push(Effect::SelectLine(point));
            return effects;
        }

        match self.clicks.press(point, now) {
            ClickType::Double => {
                debug!("Double click at {point:?}");
                self.anchor = point;
                self.triple_click.arm(now);
                self.state = GestureState::Dragging(DragMode::WordExpand);
                effects.push(Effect::SelectWords {
                    anchor: point,
                    cursor: point,
                });
            }
            ClickType::Single if on_link => {
                self.press_on_link = true;
                self.state = GestureState::Idle;
            }
            ClickType::Single => {
                self.anchor = point;
                self.state = GestureState::Dragging(DragMode::FreeSelection);
                effects.push(Effect::BeginSelection(point));
            }
        }
        effects
    }

    fn pointer_move(&mut self, point: Point, hover: PointerShape) -> Vec<Effect> {
        let mut effects = vec![Effect::SetPointerShape(hover)];
        match self.state {
            GestureState::Idle => {}
            GestureState::Dragging(DragMode::FreeSelection) => {
                effects.push(Effect::ExtendSelection(point));
            }
            GestureState::Dragging(DragMode::WordExpand) => {
                // A third click only counts if the pointer stayed put
                if point != self.anchor {
                    self.triple_click.cancel();
                }
                effects.push(Effect::SelectWords {
                    anchor: self.anchor,
                    cursor: point,
                });
            }
        }
        effects
    }

    fn primary_release(&mut self, point: Point, on_link: bool) -> Vec<Effect> {
        let mut effects = vec![];

        // Plain click without dragging deselects
        if self.state == GestureState::Dragging(DragMode::FreeSelection)
            && point == self.anchor
            && !self.extending
        {
            effects.push(Effect::ClearSelection);
        }

        if self.press_on_link && on_link {
            effects.push(Effect::FollowLink(point));
        }

        self.press_on_link = false;
        self.extending = false;
        self.clicks.release(point);
        self.state = GestureState::Idle;
        effects
    }
}
