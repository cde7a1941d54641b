//! Performance benchmark comparing the synchronization strategies

use std::time::Instant;

use parlife::{Engine, Grid, SyncStrategy};

fn benchmark_sequential(size: usize, generations: u32) -> f64 {
    let grid = Grid::new(size, size).expect("benchmark grid");
    grid.random_fill(1);
    let start = Instant::now();
    Engine::new(generations, 1, SyncStrategy::Spinning).run(&grid);
    start.elapsed().as_secs_f64() * 1000.0 / generations as f64
}

fn benchmark_strategy(sync: SyncStrategy, size: usize, generations: u32, workers: usize) -> f64 {
    let grid = Grid::new(size, size).expect("benchmark grid");
    grid.random_fill(1);
    let start = Instant::now();
    Engine::new(generations, workers, sync).run(&grid);
    start.elapsed().as_secs_f64() * 1000.0 / generations as f64
}

fn benchmark_blocked(size: usize, generations: u32, workers: usize) -> f64 {
    let grid = Grid::new(size, size).expect("benchmark grid");
    grid.random_fill(1);
    let start = Instant::now();
    Engine::new(generations, workers, SyncStrategy::Spinning)
        .with_blocked_kernel(true)
        .run(&grid);
    start.elapsed().as_secs_f64() * 1000.0 / generations as f64
}

fn main() {
    println!("=== Game of Life Synchronization Benchmark ===\n");

    let workers = num_cpus::get();
    let sizes = [100, 500, 1000, 2000, 4000];
    let generations = 20;

    println!("Workers: {workers}, generations per measurement: {generations}\n");
    println!(
        "{:>10} {:>12} {:>12} {:>12} {:>12} {:>12} {:>10}",
        "Size", "Sequential", "Condvar", "Spinning", "Coordinator", "Spin+Block", "Speedup"
    );
    println!("{:-<86}", "");

    for size in sizes {
        let sequential_ms = benchmark_sequential(size, generations);
        let condvar_ms = benchmark_strategy(SyncStrategy::Condvar, size, generations, workers);
        let spinning_ms = benchmark_strategy(SyncStrategy::Spinning, size, generations, workers);
        let coordinator_ms =
            benchmark_strategy(SyncStrategy::Coordinator, size, generations, workers);
        let blocked_ms = benchmark_blocked(size, generations, workers);

        let fastest = condvar_ms
            .min(spinning_ms)
            .min(coordinator_ms)
            .min(blocked_ms);

        println!(
            "{:>10} {:>12.2} {:>12.2} {:>12.2} {:>12.2} {:>12.2} {:>9.1}x",
            format!("{size}x{size}"),
            sequential_ms,
            condvar_ms,
            spinning_ms,
            coordinator_ms,
            blocked_ms,
            sequential_ms / fastest
        );
    }

    println!("\n=== Throughput at 4000x4000 ===\n");

    let cells = 4000 * 4000;
    let spinning_ms = benchmark_strategy(SyncStrategy::Spinning, 4000, generations, workers);
    println!(
        "Spinning barrier: {:.2} ms/gen, {:.1}M cells/sec",
        spinning_ms,
        (cells as f64) / (spinning_ms / 1000.0) / 1_000_000.0
    );
}
