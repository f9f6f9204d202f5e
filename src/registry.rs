//! Tracks which bus/chip-select pairs are bound to a live device handle.
//!
//! A registry is an ordinary value owned by the caller. Handles on unrelated
//! registries never see each other.
use core::sync::atomic::{AtomicU32, Ordering};

use crate::transport::BusId;

/// Maximum number of simultaneously bound chips per registry
pub const MAX_BINDINGS: usize = 16;

const FREE: u32 = 0;

fn tag(bus: BusId) -> u32 {
    // Offset by one so slot value zero always means free
    ((bus.device as u32) << 8 | bus.chip_select as u32) + 1
}

pub struct BusRegistry {
    slots: [AtomicU32; MAX_BINDINGS],
}

impl BusRegistry {
    pub const fn new() -> Self {
        #[allow(clippy::declare_interior_mutable_const)]
        const EMPTY: AtomicU32 = AtomicU32::new(FREE);
        BusRegistry {
            slots: [EMPTY; MAX_BINDINGS],
        }
    }

    pub fn is_bound(&self, bus: BusId) -> bool {
        let tag = tag(bus);
        self.slots.iter().any(|s| s.load(Ordering::SeqCst) == tag)
    }

    /// Binds `bus`, failing with the bus identity if it is already bound or
    /// the registry is full.
    pub fn claim(&self, bus: BusId) -> Result<BusClaim<'_>, BusId> {
        if self.is_bound(bus) {
            return Err(bus);
        }
        let tag = tag(bus);
        let slot = self
            .slots
            .iter()
            .position(|s| {
                s.compare_exchange(FREE, tag, Ordering::SeqCst, Ordering::SeqCst)
                    .is_ok()
            })
            .ok_or(bus)?;
        // A concurrent claim of the same bus may have landed in another slot
        // between the check and the insert. At most one of the two survives this scan.
        let duplicate = self
            .slots
            .iter()
            .enumerate()
            .any(|(i, s)| i != slot && s.load(Ordering::SeqCst) == tag);
        if duplicate {
            self.slots[slot].store(FREE, Ordering::SeqCst);
            return Err(bus);
        }
        Ok(BusClaim {
            registry: self,
            slot,
            bus,
        })
    }
}

impl Default for BusRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Proof of exclusive ownership of a bus/chip-select pair. Dropping it unbinds the pair.
#[derive(Debug)]
pub struct BusClaim<'r> {
    registry: &'r BusRegistry,
    slot: usize,
    bus: BusId,
}

impl BusClaim<'_> {
    pub fn bus(&self) -> BusId {
        self.bus
    }
}

impl Drop for BusClaim<'_> {
    fn drop(&mut self) {
        self.registry.slots[self.slot].store(FREE, Ordering::SeqCst);
    }
}

impl core::fmt::Debug for BusRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let bound = self
            .slots
            .iter()
            .filter(|s| s.load(Ordering::SeqCst) != FREE)
            .count();
        f.debug_struct("BusRegistry").field("bound", &bound).finish()
    }
}
