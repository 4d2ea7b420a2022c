use crate::error::InputError;

use enum_dispatch::enum_dispatch;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::{Arc, OnceLock};

/// Executor of independent single-period searches
#[enum_dispatch]
pub trait SearchBackendTrait: Clone + Debug + Send + Sync {
    /// Evaluate `f` for every index in `0..n`, results are in index order
    fn map_indices<R, F>(&self, n: usize, f: F) -> Result<Vec<R>, InputError>
    where
        R: Send,
        F: Fn(usize) -> R + Send + Sync;
}

/// Search execution backend
///
/// Periods are independent, so both backends give the same result.
#[enum_dispatch(SearchBackendTrait)]
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[non_exhaustive]
pub enum SearchBackend {
    Sequential(SequentialBackend),
    Parallel(ParallelBackend),
}

impl SearchBackend {
    pub fn sequential() -> Self {
        SequentialBackend.into()
    }

    /// Parallel backend, `None` uses the global rayon pool
    pub fn parallel(n_workers: Option<usize>) -> Self {
        ParallelBackend::new(n_workers).into()
    }
}

impl Default for SearchBackend {
    fn default() -> Self {
        Self::sequential()
    }
}

/// Single-thread loop over periods
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename = "Sequential")]
pub struct SequentialBackend;

impl SearchBackendTrait for SequentialBackend {
    fn map_indices<R, F>(&self, n: usize, f: F) -> Result<Vec<R>, InputError>
    where
        R: Send,
        F: Fn(usize) -> R + Send + Sync,
    {
        Ok((0..n).map(f).collect())
    }
}

/// Scatter/gather of periods over a rayon thread pool
///
/// A dedicated pool is built on first use and shared by all clones of the backend.
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename = "Parallel")]
pub struct ParallelBackend {
    /// Size of a dedicated pool, the global pool is used if `None`
    n_workers: Option<usize>,
    #[serde(skip)]
    #[schemars(skip)]
    pool: Arc<OnceLock<Result<ThreadPool, ThreadPoolBuildError>>>,
}

impl ParallelBackend {
    pub fn new(n_workers: Option<usize>) -> Self {
        Self {
            n_workers,
            pool: Arc::default(),
        }
    }

    pub fn n_workers(&self) -> Option<usize> {
        self.n_workers
    }

    /// Dedicated pool, `None` for the global one
    fn dedicated_pool(&self) -> Result<Option<&ThreadPool>, InputError> {
        let Some(n_workers) = self.n_workers else {
            return Ok(None);
        };
        self.pool
            .get_or_init(|| ThreadPoolBuilder::new().num_threads(n_workers).build())
            .as_ref()
            .map(Some)
            .map_err(|err| InputError::WorkerPool(err.to_string()))
    }
}

impl PartialEq for ParallelBackend {
    fn eq(&self, other: &Self) -> bool {
        self.n_workers == other.n_workers
    }
}

impl Eq for ParallelBackend {}

impl SearchBackendTrait for ParallelBackend {
    fn map_indices<R, F>(&self, n: usize, f: F) -> Result<Vec<R>, InputError>
    where
        R: Send,
        F: Fn(usize) -> R + Send + Sync,
    {
        let map = || -> Vec<R> { (0..n).into_par_iter().map(&f).collect() };
        Ok(match self.dedicated_pool()? {
            Some(pool) => pool.install(map),
            None => map(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_is_preserved() {
        let square = |i: usize| i * i;
        let expected: Vec<_> = (0..1000).map(square).collect();
        for backend in [
            SearchBackend::sequential(),
            SearchBackend::parallel(None),
            SearchBackend::parallel(Some(3)),
        ] {
            assert_eq!(backend.map_indices(1000, square).unwrap(), expected);
        }
    }

    #[test]
    fn empty() {
        let v: Vec<usize> = SearchBackend::parallel(Some(2))
            .map_indices(0, |i| i)
            .unwrap();
        assert!(v.is_empty());
    }

    #[test]
    fn dedicated_pool_is_built_once() {
        let backend = ParallelBackend::new(Some(2));
        assert_eq!(backend.map_indices(10, |i| i).unwrap().len(), 10);
        let pool = backend.dedicated_pool().unwrap().unwrap();
        assert_eq!(pool.current_num_threads(), 2);
        assert!(std::ptr::eq(pool, backend.dedicated_pool().unwrap().unwrap()));
        let clone = backend.clone();
        assert!(std::ptr::eq(pool, clone.dedicated_pool().unwrap().unwrap()));
        // Pools are not part of the configuration
        assert_eq!(ParallelBackend::new(Some(2)), backend);

        assert!(ParallelBackend::new(None).dedicated_pool().unwrap().is_none());
    }

    #[test]
    fn serde() {
        let backend = SearchBackend::parallel(Some(4));
        let json = serde_json::to_string(&backend).unwrap();
        assert_eq!(
            serde_json::from_str::<SearchBackend>(&json).unwrap(),
            backend
        );
    }
}
