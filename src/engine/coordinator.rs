//! Coordinator/worker feedback loop, the third synchronization
//! substrate.
//!
//! The coordinator thread owns the generation loop: it hands each task
//! of the partition to the first idle worker, spins until every worker
//! has drained its slot, runs the serial phase itself, and repeats.
//! Workers spin on their own `busy` flag, compute the slot's range, and
//! clear the flag. The only shared state between the two sides is the
//! per-worker slot and a global `terminate` flag; there is no channel
//! and no lock.
//!
//! Ordering: the coordinator stores a slot's range `Relaxed` and then
//! sets `busy` with `Release`; the worker's `Acquire` load of `busy`
//! makes the range (and the previous serial phase's grid writes)
//! visible. The worker's `Release` store of `busy = false` publishes
//! its kernel writes back to the coordinator's `Acquire` join scan.

use std::ops::Range;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crate::domain::kernel;
use crate::domain::Grid;

/// One worker's mailbox.
struct Slot {
    busy: AtomicBool,
    start: AtomicUsize,
    end: AtomicUsize,
}

impl Slot {
    fn new() -> Self {
        Self {
            busy: AtomicBool::new(false),
            start: AtomicUsize::new(0),
            end: AtomicUsize::new(0),
        }
    }
}

pub struct Coordinator {
    slots: Vec<Slot>,
    terminate: AtomicBool,
}

impl Coordinator {
    pub fn new(workers: usize) -> Self {
        debug_assert!(workers > 0);
        Self {
            slots: (0..workers).map(|_| Slot::new()).collect(),
            terminate: AtomicBool::new(false),
        }
    }

    pub fn workers(&self) -> usize {
        self.slots.len()
    }

    /// Worker body: spin for work, compute it, report idle. Returns
    /// when [`Self::shutdown`] is observed.
    pub fn run_worker(&self, id: usize, grid: &Grid, blocked: bool) {
        let slot = &self.slots[id];
        let mut scratch = [0u8; kernel::BLOCK];

        while !self.terminate.load(Ordering::Acquire) {
            while !slot.busy.load(Ordering::Acquire) && !self.terminate.load(Ordering::Acquire) {
                std::hint::spin_loop();
            }
            if self.terminate.load(Ordering::Acquire) {
                break;
            }

            let range = slot.start.load(Ordering::Relaxed)..slot.end.load(Ordering::Relaxed);
            if blocked {
                kernel::compute_blocked(grid, &mut scratch, range);
            } else {
                kernel::compute(grid, range);
            }
            slot.busy.store(false, Ordering::Release);
        }
    }

    /// Hand `range` to the first idle worker, scanning the slots
    /// linearly and busy-waiting while all workers are occupied.
    pub fn dispatch(&self, range: Range<usize>) {
        let id = self.first_idle();
        let slot = &self.slots[id];
        slot.start.store(range.start, Ordering::Relaxed);
        slot.end.store(range.end, Ordering::Relaxed);
        slot.busy.store(true, Ordering::Release);
    }

    fn first_idle(&self) -> usize {
        loop {
            for (id, slot) in self.slots.iter().enumerate() {
                if !slot.busy.load(Ordering::Acquire) {
                    return id;
                }
            }
            std::hint::spin_loop();
        }
    }

    /// Spin until every worker has drained its slot. Returns the time
    /// spent waiting; all kernel writes of the generation are visible
    /// once this returns.
    pub fn join_all(&self) -> Duration {
        let started = Instant::now();
        for slot in &self.slots {
            while slot.busy.load(Ordering::Acquire) {
                std::hint::spin_loop();
            }
        }
        started.elapsed()
    }

    /// Tell every worker to exit after its current task.
    pub fn shutdown(&self) {
        self.terminate.store(true, Ordering::Release);
    }
}
