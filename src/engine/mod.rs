//! The generation engine: owns the worker pool and the synchronization
//! strategy, and drives a grid through a fixed number of generations.
//!
//! Per generation, every worker applies the stencil kernel to its slice
//! of the grid, all workers synchronize, one elected thread runs the
//! serial phase (buffer swap, halo refresh, observer notification), and
//! the next generation starts. With zero or one worker the engine runs
//! the same kernel inline and calls the serial phase directly, skipping
//! synchronization entirely; results are identical for any worker count
//! and any strategy.

pub mod barrier;
pub mod coordinator;
mod observer;

pub use observer::GridObserver;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crate::domain::{Grid, kernel, partition};
use barrier::Barrier;
use coordinator::Coordinator;

/// How workers agree that a generation is finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SyncStrategy {
    /// Mutex + condition variable barrier; waiting workers block.
    Condvar,
    /// Atomic barrier; waiting workers busy-spin.
    #[default]
    Spinning,
    /// Coordinator thread feeding tasks to spinning workers.
    Coordinator,
}

impl SyncStrategy {
    pub fn all() -> Vec<SyncStrategy> {
        vec![
            SyncStrategy::Condvar,
            SyncStrategy::Spinning,
            SyncStrategy::Coordinator,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            SyncStrategy::Condvar => "condvar",
            SyncStrategy::Spinning => "spinning",
            SyncStrategy::Coordinator => "coordinator",
        }
    }
}

impl fmt::Display for SyncStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SyncStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "condvar" => Ok(SyncStrategy::Condvar),
            "spinning" => Ok(SyncStrategy::Spinning),
            "coordinator" => Ok(SyncStrategy::Coordinator),
            _ => Err(format!(
                "unknown synchronization strategy {s:?} (expected condvar, spinning or coordinator)"
            )),
        }
    }
}

/// Timing collected by a run, one field per measured phase.
#[derive(Clone, Debug)]
pub struct RunReport {
    pub generations: u32,
    /// Workers actually used, after clamping against the partition.
    pub workers: usize,
    /// Time to spawn the worker threads.
    pub spawn: Duration,
    /// Accumulated serial-phase time (swap + halo refresh + observer).
    pub serial_phase: Duration,
    /// Accumulated synchronization time: first-to-last barrier arrival,
    /// or the coordinator's join spinning.
    pub sync_phase: Duration,
    /// Wall time of the whole run.
    pub total: Duration,
}

pub struct Engine {
    generations: u32,
    workers: usize,
    sync: SyncStrategy,
    grain: usize,
    num_tasks: usize,
    blocked: bool,
    observer: Option<Arc<dyn GridObserver>>,
}

impl Engine {
    pub fn new(generations: u32, workers: usize, sync: SyncStrategy) -> Self {
        Self {
            generations,
            workers,
            sync,
            grain: 0,
            num_tasks: workers.max(1),
            blocked: false,
            observer: None,
        }
    }

    /// Minimum chunk size for the static partition; 0 means `L / W`.
    pub fn with_grain(mut self, grain: usize) -> Self {
        self.grain = grain;
        self
    }

    /// Task count for the coordinator strategy.
    pub fn with_tasks(mut self, num_tasks: usize) -> Self {
        self.num_tasks = num_tasks.max(1);
        self
    }

    /// Use the blocked kernel instead of the scalar one.
    pub fn with_blocked_kernel(mut self, blocked: bool) -> Self {
        self.blocked = blocked;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn GridObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Run `generations` steps on `grid` and report timing.
    ///
    /// The halo is refreshed up front so generation 0 is well-formed
    /// regardless of how the grid was filled.
    pub fn run(&self, grid: &Grid) -> RunReport {
        grid.copy_border();
        if self.workers <= 1 {
            return self.run_sequential(grid);
        }
        match self.sync {
            SyncStrategy::Coordinator => self.run_coordinator(grid),
            SyncStrategy::Condvar | SyncStrategy::Spinning => self.run_barrier(grid),
        }
    }

    /// Swap + halo refresh + observer, executed exactly once between
    /// generations by one thread. Debug builds echo small grids.
    fn end_generation(&self, grid: &Grid, generation: u32) -> Duration {
        let started = Instant::now();
        grid.swap();
        grid.copy_border();
        if let Some(observer) = &self.observer {
            observer.frame_ready(generation, grid);
        }
        #[cfg(debug_assertions)]
        if grid.height() <= crate::domain::MAX_PRINTABLE_GRID
            && grid.width() <= crate::domain::MAX_PRINTABLE_GRID
        {
            println!("ITERATION {generation} completed !!!");
            grid.dump();
        }
        started.elapsed()
    }

    fn run_sequential(&self, grid: &Grid) -> RunReport {
        let started = Instant::now();
        let span = grid.interior_span();
        let mut serial_phase = Duration::ZERO;
        let mut scratch = [0u8; kernel::BLOCK];

        for k in 1..=self.generations {
            if self.blocked {
                kernel::compute_blocked(grid, &mut scratch, span.clone());
            } else {
                kernel::compute(grid, span.clone());
            }
            serial_phase += self.end_generation(grid, k);
        }

        RunReport {
            generations: self.generations,
            workers: 1,
            spawn: Duration::ZERO,
            serial_phase,
            sync_phase: Duration::ZERO,
            total: started.elapsed(),
        }
    }

    fn run_barrier(&self, grid: &Grid) -> RunReport {
        let block = if self.blocked { kernel::BLOCK } else { 0 };
        let ranges = partition::ranges(grid.interior_span(), self.workers, self.grain, block);
        if ranges.len() <= 1 {
            return self.run_sequential(grid);
        }

        let barrier = match self.sync {
            SyncStrategy::Condvar => Barrier::condvar(ranges.len()),
            _ => Barrier::spinning(ranges.len()),
        };
        let serial_nanos = AtomicU64::new(0);
        let started = Instant::now();
        let mut spawn = Duration::ZERO;

        thread::scope(|scope| {
            for (id, range) in ranges.iter().cloned().enumerate() {
                let barrier = &barrier;
                let serial_nanos = &serial_nanos;
                scope.spawn(move || {
                    tracing::debug!(worker = id, start = range.start, end = range.end, "worker range");
                    let mut scratch = [0u8; kernel::BLOCK];
                    for k in 1..=self.generations {
                        if self.blocked {
                            kernel::compute_blocked(grid, &mut scratch, range.clone());
                        } else {
                            kernel::compute(grid, range.clone());
                        }
                        barrier.arrive_and_wait(|| {
                            let elapsed = self.end_generation(grid, k);
                            serial_nanos.fetch_add(elapsed.as_nanos() as u64, Ordering::Relaxed);
                        });
                    }
                });
            }
            spawn = started.elapsed();
        });

        RunReport {
            generations: self.generations,
            workers: ranges.len(),
            spawn,
            serial_phase: Duration::from_nanos(serial_nanos.load(Ordering::Relaxed)),
            sync_phase: barrier.phase_time(),
            total: started.elapsed(),
        }
    }

    fn run_coordinator(&self, grid: &Grid) -> RunReport {
        let task_list = partition::tasks(
            grid.interior_span(),
            self.workers,
            self.num_tasks,
            partition::MIN_BLOCK_SIZE,
        );
        let workers = self.workers.min(task_list.len());
        if workers <= 1 {
            return self.run_sequential(grid);
        }

        let coordinator = Coordinator::new(workers);
        let started = Instant::now();
        let mut spawn = Duration::ZERO;
        let mut serial_phase = Duration::ZERO;
        let mut sync_phase = Duration::ZERO;

        thread::scope(|scope| {
            for id in 0..workers {
                let coordinator = &coordinator;
                scope.spawn(move || coordinator.run_worker(id, grid, self.blocked));
            }
            spawn = started.elapsed();

            for k in 1..=self.generations {
                for task in &task_list {
                    coordinator.dispatch(task.clone());
                }
                sync_phase += coordinator.join_all();
                serial_phase += self.end_generation(grid, k);
            }
            coordinator.shutdown();
        });

        RunReport {
            generations: self.generations,
            workers,
            spawn,
            serial_phase,
            sync_phase,
            total: started.elapsed(),
        }
    }
}
