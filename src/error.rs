//! Error types.
//!
//! `FaceError` covers configuration problems and is fatal to building a
//! [`WatchFace`](crate::engine::WatchFace). `DispatchError` is what a host
//! reports when an action target has gone away; it is logged and dropped.

use thiserror::Error;

use crate::complication::{PayloadKind, Slot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FaceError {
    #[error("unknown complication slot id {0}")]
    UnknownSlot(u32),

    #[error("slot {slot:?} has an empty or malformed rectangle")]
    MalformedRect { slot: Slot },

    #[error("slot {slot:?} does not support {kind:?} payloads")]
    UnsupportedKind { slot: Slot, kind: PayloadKind },

    #[error("text of {len} bytes exceeds capacity {max}")]
    TextTooLong { len: usize, max: usize },

    #[error("time zone offset {0} minutes is out of range")]
    InvalidTimeZone(i32),

    #[error("tick interval {0} ms is out of range")]
    InvalidInterval(u32),

    #[error("bitmap expects {expected} pixels, got {actual}")]
    BitmapSize { expected: usize, actual: usize },
}

/// Failure reported by the host when running a complication action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("action target was canceled")]
    Canceled,

    #[error("action target is unavailable")]
    Unavailable,
}
