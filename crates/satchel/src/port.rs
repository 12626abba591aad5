//! Browser connection handles.

use std::{fmt, sync::Arc};
use tokio::sync::watch;

/// Identifier of a browser connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortId(u64);

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Handle to an open bidirectional connection between a tab context and the
/// background controller. Cheap to clone; every clone observes the same
/// disconnect signal.
#[derive(Clone, Debug)]
pub struct Port {
    inner: Arc<PortInner>,
}

#[derive(Debug)]
struct PortInner {
    id: PortId,
    name: String,
    disconnect: watch::Sender<bool>,
}

impl Port {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        let (disconnect, _) = watch::channel(false);
        Self { inner: Arc::new(PortInner { id: PortId(id), name: name.into(), disconnect }) }
    }

    pub fn id(&self) -> PortId {
        self.inner.id
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Signals that the tab side closed the connection. Idempotent.
    pub fn disconnect(&self) {
        self.inner.disconnect.send_replace(true);
    }

    pub fn is_disconnected(&self) -> bool {
        *self.inner.disconnect.borrow()
    }

    /// Resolves once the connection closes; immediately if it already has.
    pub async fn disconnected(&self) {
        let mut rx = self.inner.disconnect.subscribe();
        while !*rx.borrow_and_update() {
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}
