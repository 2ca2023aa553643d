//! Tap routing for the complication slots.
//!
//! This module provides:
//! - `hit_test`, first-match rectangle containment over the tappable slots
//! - `handle_tap`, which dispatches the slot's action, asks the host for a
//!   permission grant, or toggles the dimmed hands on a miss
//!
//! Dispatch failures are logged and swallowed. A tap never fails.

use embedded_graphics::{prelude::Point, primitives::ContainsPoint};
use log::{debug, error, info};

use crate::complication::{ComplicationStore, PayloadKind, Slot};
use crate::engine::Host;
use crate::mode::ModeController;

/// Phase of a touch gesture as the host reports it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TapKind {
    Touch,
    Cancel,
    Tap,
}

/// Host-side screen that a permission request navigates to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ComponentRef(pub &'static str);

/// The face's own permission-grant screen.
pub const FACE_COMPONENT: ComponentRef = ComponentRef("analog_face.permission");

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TapOutcome {
    /// The slot's action ran.
    Dispatched(Slot),
    /// The slot's action was gone or refused. Still counts as handled.
    DispatchFailed(Slot),
    PermissionRequested(Slot),
    /// Hit a slot that has nothing to run.
    Handled(Slot),
    /// Inside a slot's rectangle while it has nothing active to tap.
    Inert(Slot),
    /// Outside every slot rectangle. `dimmed` is the toggle state afterwards.
    Missed { dimmed: bool },
}

impl TapOutcome {
    pub fn slot(&self) -> Option<Slot> {
        match *self {
            TapOutcome::Dispatched(s)
            | TapOutcome::DispatchFailed(s)
            | TapOutcome::PermissionRequested(s)
            | TapOutcome::Handled(s)
            | TapOutcome::Inert(s) => Some(s),
            TapOutcome::Missed { .. } => None,
        }
    }
}

/// First tappable slot, in `Slot::ALL` order, whose rectangle holds `(x, y)`.
pub fn hit_test(store: &ComplicationStore, x: i32, y: i32, now_ms: i64) -> Option<Slot> {
    let p = Point::new(x, y);
    Slot::ALL
        .into_iter()
        .filter(|&slot| store.is_tappable(slot, now_ms))
        .find(|&slot| store.slot(slot).bounds().contains(p))
}

/// Route a completed tap.
pub fn handle_tap<H>(
    store: &ComplicationStore,
    mode: &mut ModeController,
    host: &mut H,
    x: i32,
    y: i32,
    now_ms: i64,
) -> TapOutcome
where
    H: Host + ?Sized,
{
    let Some(slot) = hit_test(store, x, y, now_ms) else {
        let p = Point::new(x, y);
        if let Some(slot) = Slot::ALL
            .into_iter()
            .find(|&s| store.slot(s).bounds().contains(p))
        {
            debug!("tap on idle slot {:?}", slot);
            return TapOutcome::Inert(slot);
        }
        let _ = mode.toggle_dimmed();
        let dimmed = mode.mode().dimmed;
        debug!("tap at ({}, {}) missed; dimmed={}", x, y, dimmed);
        return TapOutcome::Missed { dimmed };
    };

    // hit_test only returns slots with a payload
    let Some(payload) = store.get(slot) else {
        return TapOutcome::Handled(slot);
    };

    match (payload.action(), payload.kind()) {
        (Some(action), _) => match host.run_action(action) {
            Ok(()) => {
                debug!("slot {:?} ran {:?}", slot, action);
                TapOutcome::Dispatched(slot)
            }
            Err(e) => {
                error!("slot {:?} action {:?} failed: {}", slot, action, e);
                TapOutcome::DispatchFailed(slot)
            }
        },
        (None, PayloadKind::NoPermission) => {
            info!("slot {:?} needs permission", slot);
            host.request_permission(slot, FACE_COMPONENT);
            TapOutcome::PermissionRequested(slot)
        }
        (None, _) => TapOutcome::Handled(slot),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::complication::{default_slot_style, ActionRef, Payload};
    use crate::config::PalettePreset;
    use crate::error::DispatchError;
    use embedded_graphics::{prelude::Size, primitives::Rectangle};
    use std::vec::Vec;

    #[derive(Default)]
    struct Recorder {
        actions: Vec<ActionRef>,
        permissions: Vec<(Slot, ComponentRef)>,
        fail: bool,
    }

    impl Host for Recorder {
        fn run_action(&mut self, action: ActionRef) -> Result<(), DispatchError> {
            self.actions.push(action);
            if self.fail {
                Err(DispatchError::Unavailable)
            } else {
                Ok(())
            }
        }

        fn request_permission(&mut self, slot: Slot, component: ComponentRef) {
            self.permissions.push((slot, component));
        }

        fn battery_level(&mut self) -> Option<u8> {
            None
        }
    }

    fn overlapping_store() -> ComplicationStore {
        // all three share the square 40..60
        let bounds = [
            Rectangle::new(Point::new(0, 0), Size::new(60, 60)),
            Rectangle::new(Point::new(40, 40), Size::new(60, 60)),
            Rectangle::new(Point::new(20, 20), Size::new(40, 40)),
        ];
        let mut store = ComplicationStore::new(bounds, Slot::ALL.map(default_slot_style)).unwrap();
        for slot in Slot::ALL {
            store.update(slot, Payload::short_text("1").unwrap());
        }
        store
    }

    #[test]
    fn overlap_resolves_in_fixed_order() {
        let mut store = overlapping_store();
        assert_eq!(hit_test(&store, 50, 50, 0), Some(Slot::Left));
        assert_eq!(hit_test(&store, 90, 90, 0), Some(Slot::Center));

        // Left no longer tappable: overlap falls through to the next slot
        store.update(Slot::Left, Payload::new(PayloadKind::Empty));
        assert_eq!(hit_test(&store, 50, 50, 0), Some(Slot::Center));
        assert_eq!(hit_test(&store, 25, 25, 0), Some(Slot::Right));
        assert_eq!(hit_test(&store, 5, 5, 0), None);
    }

    #[test]
    fn expired_payload_is_not_hit() {
        let mut store = ComplicationStore::default();
        store.update(
            Slot::Center,
            Payload::short_text("5").unwrap().with_validity(0, 100),
        );
        let c = store.slot(Slot::Center).bounds().center();
        assert_eq!(hit_test(&store, c.x, c.y, 100), Some(Slot::Center));
        assert_eq!(hit_test(&store, c.x, c.y, 101), None);
    }

    #[test]
    fn action_is_dispatched_and_failures_swallowed() {
        let mut store = ComplicationStore::default();
        store.update(
            Slot::Left,
            Payload::short_text("3").unwrap().with_action(ActionRef(9)),
        );
        let c = store.slot(Slot::Left).bounds().center();
        let mut mode = ModeController::new(PalettePreset::Classic);

        let mut host = Recorder::default();
        assert_eq!(
            handle_tap(&store, &mut mode, &mut host, c.x, c.y, 0),
            TapOutcome::Dispatched(Slot::Left)
        );
        assert_eq!(host.actions, [ActionRef(9)]);

        host.fail = true;
        assert_eq!(
            handle_tap(&store, &mut mode, &mut host, c.x, c.y, 0),
            TapOutcome::DispatchFailed(Slot::Left)
        );
        assert!(!mode.mode().dimmed);
    }

    #[test]
    fn missing_permission_navigates() {
        let mut store = ComplicationStore::default();
        store.update(Slot::Right, Payload::new(PayloadKind::NoPermission));
        let c = store.slot(Slot::Right).bounds().center();
        let mut mode = ModeController::new(PalettePreset::Classic);
        let mut host = Recorder::default();

        assert_eq!(
            handle_tap(&store, &mut mode, &mut host, c.x, c.y, 0),
            TapOutcome::PermissionRequested(Slot::Right)
        );
        assert_eq!(host.permissions, [(Slot::Right, FACE_COMPONENT)]);
        assert!(host.actions.is_empty());
    }

    #[test]
    fn idle_slot_rectangle_does_not_dim() {
        let mut store = ComplicationStore::default();
        let mut mode = ModeController::new(PalettePreset::Classic);
        let mut host = Recorder::default();
        let c = store.slot(Slot::Center).bounds().center();

        // no payload yet
        assert_eq!(
            handle_tap(&store, &mut mode, &mut host, c.x, c.y, 0),
            TapOutcome::Inert(Slot::Center)
        );
        store.update(Slot::Center, Payload::new(PayloadKind::NotConfigured));
        assert_eq!(
            handle_tap(&store, &mut mode, &mut host, c.x, c.y, 0),
            TapOutcome::Inert(Slot::Center)
        );
        store.update(
            Slot::Center,
            Payload::short_text("9").unwrap().with_validity(0, 10),
        );
        assert_eq!(
            handle_tap(&store, &mut mode, &mut host, c.x, c.y, 11),
            TapOutcome::Inert(Slot::Center)
        );
        assert!(!mode.mode().dimmed);
        assert!(host.actions.is_empty());
    }

    #[test]
    fn miss_toggles_dimmed() {
        let store = ComplicationStore::default();
        let mut mode = ModeController::new(PalettePreset::Classic);
        let mut host = Recorder::default();

        assert_eq!(
            handle_tap(&store, &mut mode, &mut host, 2, 2, 0),
            TapOutcome::Missed { dimmed: true }
        );
        assert_eq!(
            handle_tap(&store, &mut mode, &mut host, 2, 2, 0),
            TapOutcome::Missed { dimmed: false }
        );
    }
}
