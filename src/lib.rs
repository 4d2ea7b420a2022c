#![doc = include_str!("../README.md")]

pub mod chunk;
pub use chunk::Chunk;

mod data;
pub use data::{DataSample, TimeSeries};

pub mod detrend;
pub use detrend::{DetrendedWindow, PolynomialModel};

mod error;
pub use error::{FitError, InputError, MergeError};

mod float_trait;
pub use float_trait::Float;

pub mod merge;
pub use merge::{ChunkOutput, MergedResult, merge_chunks};

pub mod period_grid;
pub use period_grid::{
    Jenkins2010PeriodGrid, LinearPeriodGrid, Ofir2014PeriodGrid, PeriodGrid, PeriodGridTrait,
    UniformFreqPeriodGrid,
};

pub mod search;
pub use search::{
    BestFit, BestModel, BestParams, IterativeSearch, Pbls, Periodogram, SearchBackend,
    SearchConfig, SearchResult,
};

pub mod snr;
pub use snr::TransitScore;

pub mod transit;
pub use transit::{TransitEphemeris, TrialParameters, inject_box_transit};

mod types;

pub mod window;
pub use window::TransitWindow;

pub use ndarray;
