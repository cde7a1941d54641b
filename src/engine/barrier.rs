//! Generation barriers.
//!
//! Both variants share one contract: when `arrive_and_wait` returns to
//! a worker for generation `g`, every worker has finished writing the
//! write buffer for `g`, and the serial phase for `g` (buffer swap plus
//! halo refresh) has run exactly once, executed by the last worker to
//! arrive. The serial phase's effects happen-before every worker's
//! first read of generation `g + 1`.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// Barrier built on a mutex and a condition variable. Waiting workers
/// block in the kernel; the last arriver runs the serial phase while
/// holding the lock, then wakes everyone.
pub struct CondvarBarrier {
    state: Mutex<State>,
    cv: Condvar,
    capacity: usize,
}

struct State {
    arrived: usize,
    generation: u64,
    /// Arrival time of the first worker of the current generation.
    started: Option<Instant>,
    /// Accumulated first-to-last arrival time across generations.
    elapsed: Duration,
}

impl CondvarBarrier {
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0);
        Self {
            state: Mutex::new(State {
                arrived: 0,
                generation: 0,
                started: None,
                elapsed: Duration::ZERO,
            }),
            cv: Condvar::new(),
            capacity,
        }
    }

    pub fn arrive_and_wait(&self, serial: impl FnOnce()) {
        let mut state = self.state.lock().expect("barrier mutex poisoned");
        if state.arrived == 0 {
            state.started = Some(Instant::now());
        }
        state.arrived += 1;

        if state.arrived == self.capacity {
            if let Some(started) = state.started.take() {
                state.elapsed += started.elapsed();
            }
            serial();
            state.arrived = 0;
            state.generation += 1;
            self.cv.notify_all();
        } else {
            // Wait on the generation count, not on `arrived`: a worker
            // racing ahead into the next generation must not release
            // waiters of the previous one early.
            let generation = state.generation;
            while state.generation == generation {
                state = self.cv.wait(state).expect("barrier mutex poisoned");
            }
        }
    }

    /// Total first-to-last arrival time accumulated so far.
    pub fn phase_time(&self) -> Duration {
        self.state.lock().expect("barrier mutex poisoned").elapsed
    }
}

/// Barrier built on two atomics; waiting workers busy-spin. The last
/// arriver runs the serial phase, resets the waiter count, and then
/// publishes the new generation with a `Release` bump that the spinners
/// `Acquire`.
pub struct SpinBarrier {
    num_waiting: AtomicUsize,
    generation: AtomicU64,
    capacity: usize,
    /// Arrival time of the first worker; only the first and last
    /// arrivers of a generation touch this.
    started: Mutex<Option<Instant>>,
    elapsed_nanos: AtomicU64,
}

impl SpinBarrier {
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0);
        Self {
            num_waiting: AtomicUsize::new(0),
            generation: AtomicU64::new(0),
            capacity,
            started: Mutex::new(None),
            elapsed_nanos: AtomicU64::new(0),
        }
    }

    pub fn arrive_and_wait(&self, serial: impl FnOnce()) {
        let generation = self.generation.load(Ordering::Acquire);
        let arrived = self.num_waiting.fetch_add(1, Ordering::AcqRel);

        if arrived == 0 {
            *self.started.lock().expect("barrier timer poisoned") = Some(Instant::now());
        }

        if arrived == self.capacity - 1 {
            if let Some(started) = self.started.lock().expect("barrier timer poisoned").take() {
                self.elapsed_nanos
                    .fetch_add(started.elapsed().as_nanos() as u64, Ordering::Relaxed);
            }
            serial();
            // The waiter count must be reset before the generation bump
            // is published; late spinners of this generation only watch
            // `generation`.
            self.num_waiting.store(0, Ordering::Relaxed);
            self.generation.fetch_add(1, Ordering::Release);
        } else {
            while self.generation.load(Ordering::Acquire) == generation {
                std::hint::spin_loop();
            }
        }
    }

    /// Total first-to-last arrival time accumulated so far.
    pub fn phase_time(&self) -> Duration {
        Duration::from_nanos(self.elapsed_nanos.load(Ordering::Relaxed))
    }
}

/// The barrier strategy picked at engine construction.
pub enum Barrier {
    Condvar(CondvarBarrier),
    Spinning(SpinBarrier),
}

impl Barrier {
    pub fn condvar(capacity: usize) -> Self {
        Self::Condvar(CondvarBarrier::new(capacity))
    }

    pub fn spinning(capacity: usize) -> Self {
        Self::Spinning(SpinBarrier::new(capacity))
    }

    /// Arrive at the barrier; the elected worker runs `serial` exactly
    /// once per generation before anyone is released.
    pub fn arrive_and_wait(&self, serial: impl FnOnce()) {
        match self {
            Self::Condvar(b) => b.arrive_and_wait(serial),
            Self::Spinning(b) => b.arrive_and_wait(serial),
        }
    }

    pub fn phase_time(&self) -> Duration {
        match self {
            Self::Condvar(b) => b.phase_time(),
            Self::Spinning(b) => b.phase_time(),
        }
    }
}
