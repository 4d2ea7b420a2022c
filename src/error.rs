/// Hard failure of a search call, the whole call is aborted
#[derive(Debug, thiserror::Error, PartialEq, Clone)]
pub enum InputError {
    #[error("time-series is empty")]
    EmptyTimeSeries,

    #[error("time and flux arrays have different lengths: {t} and {flux}")]
    LengthMismatch { t: usize, flux: usize },

    #[error("time-series' length {actual} is smaller than the minimum required length {minimum}")]
    ShortTimeSeries { actual: usize, minimum: usize },

    #[error("{array} array has non-finite value at index {index}")]
    NonFinite { array: &'static str, index: usize },

    #[error("time must increase strictly, violated at index {index}")]
    NonMonotonicTime { index: usize },

    #[error("trial period must be positive and finite, got {period} at index {index}")]
    InvalidPeriod { index: usize, period: f64 },

    #[error("trial duration must be positive and finite, got {duration_hr} hours")]
    InvalidDuration { duration_hr: f64 },

    #[error("trial duration {duration_hr} hours is not shorter than period {period} days")]
    DurationExceedsPeriod { duration_hr: f64, period: f64 },

    #[error("at least one trial duration is required")]
    NoDurations,

    #[error("number of epoch steps must be at least one")]
    ZeroEpochSteps,

    #[error("ridge term must be non-negative and finite, got {0}")]
    InvalidRidge(f64),

    #[error("invalid period grid: {0}")]
    PeriodGrid(String),

    #[error("chunk index {index} is out of range for {total} chunks")]
    ChunkOutOfRange { index: usize, total: usize },

    #[error("number of chunks must be positive")]
    ZeroChunks,

    #[error("transit depth must be non-negative and finite, got {0}")]
    InvalidDepth(f64),

    #[error("worker pool cannot be built: {0}")]
    WorkerPool(String),
}

/// Per-window polynomial fit failure, excludes the window from its trial
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone, Copy)]
pub enum FitError {
    #[error("normal equations are not positive definite")]
    NotPositiveDefinite,

    #[error("polynomial fit produced non-finite coefficients")]
    NonFiniteSolution,

    #[error("{actual} points are too few to fit polynomial of order {order}")]
    TooFewPoints { actual: usize, order: usize },
}

#[derive(Debug, thiserror::Error, PartialEq, Clone)]
pub enum MergeError {
    #[error("no chunk outputs to merge")]
    NothingToMerge,

    #[error("chunk {index} is given more than once")]
    DuplicateChunk { index: usize },

    #[error("chunk {index} of {total} does not belong to a grid split into {expected} chunks")]
    ForeignChunk {
        index: usize,
        total: usize,
        expected: usize,
    },

    #[error("no chunk has a defined periodogram value, best model is undefined")]
    NoFinitePower,
}
