//! Polynomial-detrended box least squares search

mod backend;
pub use backend::{ParallelBackend, SearchBackend, SearchBackendTrait, SequentialBackend};

mod config;
pub use config::SearchConfig;

mod engine;
pub use engine::{PeriodSearch, Pbls, TrialOutcome};

mod iterative;
pub use iterative::IterativeSearch;

mod result;
pub use result::{BestFit, BestModel, BestParams, Periodogram, SearchResult};
