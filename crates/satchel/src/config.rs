//! Controller configuration.

use serde::{Deserialize, Serialize};
use std::{fmt, path::PathBuf, str::FromStr};

/// Width of the notification window
pub const NOTIFICATION_WINDOW_WIDTH: u32 = 376;
/// Height of the notification window
pub const NOTIFICATION_WINDOW_HEIGHT: u32 = 640;

/// How pending requests are surfaced to the user.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationMode {
    /// A dedicated popup-type window.
    #[default]
    PopUp,
    /// A regular browser window.
    Window,
    /// No separate window; the toolbar badge alone signals pending work.
    Extension,
}

impl fmt::Display for NotificationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match self {
            Self::PopUp => "popup",
            Self::Window => "window",
            Self::Extension => "extension",
        };
        mode.fmt(f)
    }
}

impl FromStr for NotificationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "popup" => Ok(Self::PopUp),
            "window" => Ok(Self::Window),
            "extension" => Ok(Self::Extension),
            other => Err(format!("unknown notification mode: `{other}`")),
        }
    }
}

/// Configures a [`State`](crate::State) controller.
#[derive(Clone, Debug)]
pub struct Config {
    /// How pending requests are surfaced.
    pub notification: NotificationMode,
    /// Url of the notification surface; open windows whose tabs point here
    /// are treated as the already-visible consent UI.
    pub notification_url: String,
    /// Where the durable collections live when using the file backend.
    pub storage_dir: PathBuf,
    /// Notification window geometry.
    pub window_width: u32,
    /// Notification window geometry.
    pub window_height: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            notification: NotificationMode::default(),
            notification_url: "extension://satchel/notification.html".to_string(),
            storage_dir: std::env::temp_dir().join("satchel"),
            window_width: NOTIFICATION_WINDOW_WIDTH,
            window_height: NOTIFICATION_WINDOW_HEIGHT,
        }
    }
}

impl Config {
    /// Sets the notification mode
    pub fn with_notification_mode(mut self, notification: NotificationMode) -> Self {
        self.notification = notification;
        self
    }

    /// Sets the url of the notification surface
    pub fn with_notification_url(mut self, url: impl Into<String>) -> Self {
        self.notification_url = url.into();
        self
    }

    /// Sets the storage directory for the file backend
    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = dir.into();
        self
    }

    /// Returns a config suited for tests
    pub fn test() -> Self {
        Self::default().with_notification_url("extension://satchel-test/notification.html")
    }
}
