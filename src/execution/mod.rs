//! Worker pool used to load source entries in parallel.
//!
//! Loading is the only part of a read that runs concurrently. [`ExecutionEngine::map_ordered`]
//! runs one independent job per item on a rayon pool and returns the results in input order, so
//! the order-dependent grouping stage sees exactly the enumeration order.

use rayon::prelude::*;
use rayon::ThreadPool;
use rayon::ThreadPoolBuilder;

use crate::error::IngestionResult;

/// Configuration for the [`ExecutionEngine`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExecutionOptions {
    /// Number of worker threads used to load entries.
    ///
    /// If `None`, uses the platform's available parallelism. `Some(1)` loads sequentially.
    pub num_threads: Option<usize>,
}

/// A dedicated rayon pool, created per read.
pub struct ExecutionEngine {
    pool: ThreadPool,
}

impl ExecutionEngine {
    /// Create a new engine with the given options.
    ///
    /// `num_threads == Some(0)` is treated like `None`.
    pub fn new(opts: &ExecutionOptions) -> IngestionResult<Self> {
        let n_threads = opts
            .num_threads
            .filter(|&n| n > 0)
            .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1));

        let pool = ThreadPoolBuilder::new()
            .num_threads(n_threads)
            .thread_name(|i| format!("harvest-load-{i}"))
            .build()?;
        Ok(Self { pool })
    }

    /// Number of worker threads in the pool.
    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Apply `f` to every item in parallel, returning results in the order of `items`.
    ///
    /// Jobs share nothing but `f`; each job's result (including an error value) belongs to its
    /// own slot and never affects its siblings.
    pub fn map_ordered<T, U, F>(&self, items: Vec<T>, f: F) -> Vec<U>
    where
        T: Send,
        U: Send,
        F: Fn(T) -> U + Send + Sync,
    {
        self.pool.install(|| items.into_par_iter().map(f).collect())
    }
}
