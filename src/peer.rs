// Companion-device connectivity flag.
//
// The connectivity listener (outside this crate) is the only writer. The face
// reads it each frame to decide whether to show the disconnected badge. It
// starts out disconnected until the listener reports otherwise.

use core::sync::atomic::{AtomicBool, Ordering};

use log::info;

#[derive(Debug, Default)]
pub struct PeerLink {
    connected: AtomicBool,
}

impl PeerLink {
    pub const fn new() -> Self {
        Self {
            connected: AtomicBool::new(false),
        }
    }

    /// Record a connectivity transition. Returns true if the value changed.
    pub fn set_connected(&self, connected: bool) -> bool {
        let was = self.connected.swap(connected, Ordering::AcqRel);
        if was != connected {
            info!("peer {}", if connected { "connected" } else { "disconnected" });
        }
        was != connected
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_disconnected_and_reports_transitions() {
        let link = PeerLink::new();
        assert!(!link.is_connected());
        assert!(link.set_connected(true));
        assert!(!link.set_connected(true));
        assert!(link.is_connected());
        assert!(link.set_connected(false));
        assert!(!link.is_connected());
    }
}
