//! Device registry.
//!
//! One registry per peripheral class, built as a `static` from the instances
//! a platform declares:
//!
//! ```ignore
//! pub static TIMERS: DeviceRegistry<Timer> = DeviceRegistry::new(&[&TIMER0, &TIMER1]);
//! ```
//!
//! The index of an instance is its public identity for the life of the
//! program. Lookups are direct slice indexing and never allocate.

use core::fmt;

use crate::hal::error::{HalError, HalResult};

pub struct DeviceRegistry<T: ?Sized + 'static> {
    devices: &'static [&'static T],
}

impl<T: ?Sized + 'static> DeviceRegistry<T> {
    pub const fn new(devices: &'static [&'static T]) -> Self {
        Self { devices }
    }

    /// Resolve an index to its instance.
    pub fn get(&self, index: u32) -> HalResult<&'static T> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.devices.get(i))
            .copied()
            .ok_or(HalError::NotFound)
    }

    pub const fn len(&self) -> usize {
        self.devices.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Instances with their indices, in index order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &'static T)> + '_ {
        self.devices
            .iter()
            .enumerate()
            .map(|(i, dev)| (i as u32, *dev))
    }
}

impl<T: ?Sized + 'static> fmt::Debug for DeviceRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceRegistry")
            .field("len", &self.devices.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Named: Sync {
        fn name(&self) -> &'static str;
    }

    struct Dev(&'static str);

    impl Named for Dev {
        fn name(&self) -> &'static str {
            self.0
        }
    }

    static A: Dev = Dev("a");
    static B: Dev = Dev("b");
    static REGISTRY: DeviceRegistry<dyn Named> = DeviceRegistry::new(&[&A, &B]);
    static EMPTY: DeviceRegistry<Dev> = DeviceRegistry::new(&[]);

    #[test]
    fn lookup_by_index() {
        assert_eq!(REGISTRY.len(), 2);
        assert_eq!(REGISTRY.get(0).map(|d| d.name()), Ok("a"));
        assert_eq!(REGISTRY.get(1).map(|d| d.name()), Ok("b"));
    }

    #[test]
    fn out_of_range_is_not_found() {
        assert!(matches!(REGISTRY.get(2), Err(HalError::NotFound)));
        assert!(matches!(REGISTRY.get(u32::MAX), Err(HalError::NotFound)));
        assert!(matches!(EMPTY.get(0), Err(HalError::NotFound)));
        assert!(EMPTY.is_empty());
    }

    #[test]
    fn iteration_preserves_index_order() {
        let names: Vec<_> = REGISTRY.iter().map(|(i, d)| (i, d.name())).collect();
        assert_eq!(names, vec![(0, "a"), (1, "b")]);
    }
}
