use std::path::PathBuf;

/// Errors from the collaborators around the highlight engine.
///
/// The engine itself never fails; these come from the operating system
/// services and from configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("clipboard: {0}")]
    Clipboard(String),

    #[error("failed to open {uri}: {source}")]
    OpenUrl {
        uri: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read settings {path:?}: {source}")]
    SettingsRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings {path:?}: {source}")]
    SettingsParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid color {0:?}, expected #RRGGBB or #RRGGBBAA")]
    InvalidColor(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
