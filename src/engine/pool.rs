// src/engine/pool.rs
//
// Global thread pool for the parallel batch mode.
//
// A single lazily-built pool is shared by every parallel run instead of
// building one per batch. Changes to the environment after the first use
// have no effect.

use rayon::ThreadPool;
use std::sync::OnceLock;

/// Minimum number of rayon threads to ensure at least some parallelism
const MIN_RAYON_THREADS: usize = 1;

/// Upper bound on worker threads; decoded rasters are large.
pub const MAX_CONCURRENCY: usize = 16;

static GLOBAL_THREAD_POOL: OnceLock<Option<ThreadPool>> = OnceLock::new();

/// Number of workers the global pool is built with.
pub fn optimal_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(MIN_RAYON_THREADS)
        .clamp(MIN_RAYON_THREADS, MAX_CONCURRENCY)
}

/// The shared pool, or None when no pool could be built (callers then use rayon's global pool).
pub fn get_pool() -> Option<&'static ThreadPool> {
    GLOBAL_THREAD_POOL
        .get_or_init(|| {
            let num_threads = optimal_concurrency();
            match rayon::ThreadPoolBuilder::new()
                .num_threads(num_threads)
                .thread_name(|i| format!("image-batch-{i}"))
                .build()
            {
                Ok(pool) => Some(pool),
                Err(e) => {
                    tracing::warn!("failed to build batch thread pool with {num_threads} threads: {e}");
                    None
                }
            }
        })
        .as_ref()
}

/// Run `f` inside the shared pool.
pub fn install<R: Send>(f: impl FnOnce() -> R + Send) -> R {
    match get_pool() {
        Some(pool) => pool.install(f),
        None => f(),
    }
}
