//! Popup-surface arbitration and the browser-shell collaborators.
//!
//! The shell traits wrap what the extension host actually provides (window
//! enumeration/creation and the toolbar badge), so the controller can be
//! driven against fakes in tests. All popup and badge work is best-effort:
//! failures are logged and never fail the operation that triggered them.

use crate::config::{Config, NotificationMode};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tracing::{debug, warn};

/// Identifier of an OS-level browser window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WindowId(pub u64);

/// Kind of window, matching the host's window types.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowType {
    Normal,
    Popup,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowState {
    Normal,
    Minimized,
    Maximized,
    Fullscreen,
}

#[derive(Clone, Debug)]
pub struct TabInfo {
    pub url: String,
}

#[derive(Clone, Debug)]
pub struct WindowInfo {
    pub id: WindowId,
    pub tabs: Vec<TabInfo>,
}

/// Window-creation parameters.
#[derive(Clone, Debug)]
pub struct CreateWindowOptions {
    pub url: String,
    pub kind: WindowType,
    pub focused: bool,
    pub state: WindowState,
    pub width: u32,
    pub height: u32,
}

/// The host's window surface as the controller sees it.
#[async_trait]
pub trait WindowManager: Send + Sync {
    /// All open windows of the given type, with their tabs.
    async fn windows(&self, kind: WindowType) -> eyre::Result<Vec<WindowInfo>>;

    /// Opens a window; `None` when the host declined to create one.
    async fn create(&self, opts: CreateWindowOptions) -> eyre::Result<Option<WindowId>>;

    /// Re-asserts a window's state.
    async fn set_window_state(&self, id: WindowId, state: WindowState) -> eyre::Result<()>;
}

/// The extension's toolbar icon badge.
#[async_trait]
pub trait Badge: Send + Sync {
    async fn set_badge_text(&self, text: &str) -> eyre::Result<()>;
}

/// Computes the badge overlay from the pending-queue lengths.
/// Authorization requests outrank metadata requests, which outrank the
/// sign-request count.
pub fn badge_text(auth: usize, meta: usize, sign: usize) -> String {
    if auth > 0 {
        "Auth".to_string()
    } else if meta > 0 {
        "Meta".to_string()
    } else if sign > 0 {
        sign.to_string()
    } else {
        String::new()
    }
}

/// Arbitrates the single notification window across all requesting tabs.
pub struct PopupController {
    windows: Arc<dyn WindowManager>,
    notification: RwLock<NotificationMode>,
    url: String,
    width: u32,
    height: u32,
    opened: Mutex<Vec<WindowId>>,
}

impl PopupController {
    pub fn new(config: &Config, windows: Arc<dyn WindowManager>) -> Self {
        Self {
            windows,
            notification: RwLock::new(config.notification),
            url: config.notification_url.clone(),
            width: config.window_width,
            height: config.window_height,
            opened: Mutex::new(Vec::new()),
        }
    }

    pub fn notification(&self) -> NotificationMode {
        *self.notification.read()
    }

    pub fn set_notification(&self, mode: NotificationMode) {
        *self.notification.write() = mode;
    }

    /// Ids of the windows this controller created.
    pub fn opened_windows(&self) -> Vec<WindowId> {
        self.opened.lock().clone()
    }

    /// Opens the notification surface, unless one is already on screen. In
    /// badge-only mode this is a no-op; the queue counts are the whole
    /// signal.
    pub async fn open(&self) {
        let mode = self.notification();
        if mode == NotificationMode::Extension {
            return;
        }
        let kind = match mode {
            NotificationMode::Window => WindowType::Normal,
            _ => WindowType::Popup,
        };

        let open_windows = match self.windows.windows(kind).await {
            Ok(windows) => windows,
            Err(err) => {
                warn!(target: "satchel::popup", %err, "window enumeration failed");
                return;
            }
        };
        let already_open = open_windows
            .iter()
            .flat_map(|window| window.tabs.iter())
            .any(|tab| tab.url.starts_with(&self.url));
        if already_open {
            debug!(target: "satchel::popup", "notification surface already open");
            return;
        }

        let opts = CreateWindowOptions {
            url: self.url.clone(),
            kind,
            focused: true,
            state: WindowState::Normal,
            width: self.width,
            height: self.height,
        };
        match self.windows.create(opts).await {
            Ok(Some(id)) => {
                self.opened.lock().push(id);
                // a freshly created window can inherit fullscreen from a
                // fullscreened browser window on some hosts
                if let Err(err) = self.windows.set_window_state(id, WindowState::Normal).await {
                    warn!(target: "satchel::popup", %err, "failed to re-assert window state");
                }
            }
            Ok(None) => {}
            Err(err) => {
                warn!(target: "satchel::popup", %err, "failed to open notification window");
            }
        }
    }
}
