//! Interrupt-context callback contract.
//!
//! Overflow and capture callbacks run from the driver's interrupt handler.
//! A callback must be short, must not block and must not call back into the
//! HAL API of the instance that invoked it: the API takes the instance's
//! serialisation lock, which the interrupted task may be holding. Anything
//! longer is deferred to task context.
//!
//! The value a callback returns tells the driver whether to keep going.

use core::any::Any;

/// What a callback wants the driver to do next.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    /// Keep the timer running / keep sampling.
    Continue,
    /// Stop the timer (periodic mode) or disable capture.
    Stop,
}

impl From<bool> for CallbackAction {
    fn from(keep_running: bool) -> Self {
        if keep_running {
            CallbackAction::Continue
        } else {
            CallbackAction::Stop
        }
    }
}

impl From<CallbackAction> for bool {
    fn from(action: CallbackAction) -> bool {
        matches!(action, CallbackAction::Continue)
    }
}

/// Opaque caller context handed back to the callback.
///
/// The HAL only stores the reference; the referent is owned by the caller
/// and lives for the whole program.
pub type UserData = Option<&'static (dyn Any + Send + Sync)>;

/// One registered callback and its user data.
///
/// Drivers keep this inside the state they share with their interrupt
/// handler and copy it out before invoking the callback.
#[derive(Debug, Copy, Clone)]
pub struct CallbackSlot<F: Copy> {
    callback: Option<F>,
    data: UserData,
}

impl<F: Copy> CallbackSlot<F> {
    pub const fn empty() -> Self {
        Self {
            callback: None,
            data: None,
        }
    }

    /// Replace the registered callback. `None` unregisters.
    pub fn set(&mut self, callback: Option<F>, data: UserData) {
        self.callback = callback;
        self.data = data;
    }

    pub fn clear(&mut self) {
        *self = Self::empty();
    }

    /// The callback and its data, if one is registered.
    pub fn get(&self) -> Option<(F, UserData)> {
        self.callback.map(|cb| (cb, self.data))
    }

    pub fn is_set(&self) -> bool {
        self.callback.is_some()
    }
}

impl<F: Copy> Default for CallbackSlot<F> {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Probe = fn(u32) -> CallbackAction;

    fn keep(_: u32) -> CallbackAction {
        CallbackAction::Continue
    }

    fn halt(_: u32) -> CallbackAction {
        CallbackAction::Stop
    }

    static TAG: u32 = 9;

    #[test]
    fn set_replaces_previous_registration() {
        let mut slot: CallbackSlot<Probe> = CallbackSlot::empty();
        assert!(slot.get().is_none());

        slot.set(Some(keep), None);
        slot.set(Some(halt), Some(&TAG));

        let (cb, data) = slot.get().unwrap();
        assert_eq!(cb(0), CallbackAction::Stop);
        assert_eq!(data.and_then(|d| d.downcast_ref::<u32>()), Some(&9));
    }

    #[test]
    fn clear_unregisters() {
        let mut slot: CallbackSlot<Probe> = CallbackSlot::empty();
        slot.set(Some(keep), Some(&TAG));
        slot.clear();
        assert!(!slot.is_set());
    }

    #[test]
    fn bool_conversion_matches_continue_stop() {
        assert_eq!(CallbackAction::from(true), CallbackAction::Continue);
        assert_eq!(CallbackAction::from(false), CallbackAction::Stop);
        assert!(bool::from(CallbackAction::Continue));
    }
}
