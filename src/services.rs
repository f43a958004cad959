//! Operating system services backing [`OsServices`]

use arboard::Clipboard;
use log::{debug, warn};

use crate::error::{Error, Result};
use crate::oracle::OsServices;

/// Requested jump to a location in the document
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Navigation {
    pub page: usize,
    pub y_offset: f32,
}

/// Host side of in-document navigation
pub trait NavigationQueue {
    /// Take the most recent unhandled navigation request
    fn take_navigation(&mut self) -> Option<Navigation>;
}

/// System clipboard and URL opener.
///
/// Document navigation is recorded for the host to pick up with
/// [`NavigationQueue::take_navigation`], since only the host knows how to
/// bring another page on screen.
#[derive(Default)]
pub struct SystemServices {
    // Kept alive: on X11/Wayland clipboard contents vanish with their owner
    clipboard: Option<Clipboard>,
    last_copied_text: Option<String>,
    pending_navigation: Option<Navigation>,
}

impl SystemServices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_copied_text(&self) -> Option<&str> {
        self.last_copied_text.as_deref()
    }

    fn clipboard(&mut self) -> Result<&mut Clipboard> {
        if self.clipboard.is_none() {
            let clipboard = Clipboard::new()
                .map_err(|e| Error::Clipboard(format!("Failed to access clipboard: {e}")))?;
            self.clipboard = Some(clipboard);
        }
        self.clipboard
            .as_mut()
            .ok_or_else(|| Error::Clipboard("clipboard unavailable".to_string()))
    }
}

impl NavigationQueue for SystemServices {
    fn take_navigation(&mut self) -> Option<Navigation> {
        self.pending_navigation.take()
    }
}

impl OsServices for SystemServices {
    fn set_clipboard_text(&mut self, text: &str) -> Result<()> {
        self.last_copied_text = Some(text.to_string());
        self.clipboard()?
            .set_text(text)
            .map_err(|e| Error::Clipboard(format!("Failed to copy to clipboard: {e}")))
    }

    fn open_external_url(&mut self, uri: &str) -> Result<()> {
        debug!("Opening {uri} with system handler");
        open::that(uri).map_err(|source| Error::OpenUrl {
            uri: uri.to_string(),
            source,
        })
    }

    fn navigate_to_page_location(&mut self, page: usize, y_offset: f32) {
        if let Some(previous) = self.pending_navigation {
            warn!("Dropping unhandled navigation to page {}", previous.page);
        }
        self.pending_navigation = Some(Navigation { page, y_offset });
    }
}
