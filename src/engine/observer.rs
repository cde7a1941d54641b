use crate::domain::Grid;

/// Hook for external consumers of finished generations, e.g. a
/// graphical renderer or a video encoder. The engine never depends on a
/// concrete implementation.
///
/// `frame_ready` is invoked during the serial phase, after the buffer
/// swap and halo refresh: every worker is quiescent, so the observer
/// may read any cell of `grid` freely. It must return before the next
/// generation can start, so heavy consumers should copy what they need
/// and get out.
pub trait GridObserver: Send + Sync {
    fn frame_ready(&self, generation: u32, grid: &Grid);
}
