//! Text selection and highlighting for paged document viewers
//!
//! The engine sits between a document backend, which knows where text is on
//! a rendered page, and a viewer, which delivers pointer and key events.
//! [`PageView`] ties the pieces together for one page.

pub mod error;
pub mod event_source;
pub mod geometry;
pub mod gesture;
pub mod highlight;
pub mod hud_message;
pub mod oracle;
pub mod page;
pub mod paint;
pub mod panic_handler;
pub mod selection;
pub mod services;
pub mod settings;
pub mod text_grid;
pub mod viewer;
pub mod viewport;
pub mod zoom;

#[cfg(feature = "test-utils")]
pub mod test_utils;

pub use error::{Error, Result};
pub use geometry::{Point, Rect};
pub use highlight::{Highlight, HighlightSet, Rgba};
pub use page::{PageConfig, PageView};
pub use viewer::{App, AppAction, run_app_with_event_source};
pub use zoom::ZoomTransform;
