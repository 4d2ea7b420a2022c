use crate::float_trait::Float;
use crate::snr::snr_serde;
use crate::transit::{TransitEphemeris, TrialParameters};

use ndarray::Array1;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Maximum SNR over all durations and epochs of every trial period
///
/// `power[i]` corresponds to `periods[i]`, periods are in the order they were given to the
/// search. Periods without any defined trial have power of $-\infty$, power is $+\infty$ if a box
/// fits noiseless data exactly.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "T: Float")]
pub struct Periodogram<T> {
    pub periods: Array1<T>,
    #[serde(with = "snr_serde::array")]
    pub power: Array1<T>,
}

impl<T> Periodogram<T>
where
    T: Float,
{
    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// Index and value of the first greatest defined power, $+\infty$ included
    pub fn argmax(&self) -> Option<(usize, T)> {
        self.power
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.is_nan() && **p > T::neg_infinity())
            .fold(None, |acc, (i, &p)| match acc {
                Some((_, max)) if !(p > max) => acc,
                _ => Some((i, p)),
            })
    }
}

/// Parameters of the best trial
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(bound = "T: Float")]
pub struct BestParams<T> {
    pub period: T,
    pub duration_hr: T,
    /// Phase of the reference transit start
    pub epoch: T,
    pub depth: T,
    #[serde(with = "snr_serde::value")]
    #[schemars(with = "Option<T>")]
    pub snr: T,
}

impl<T> BestParams<T>
where
    T: Float,
{
    pub fn trial(&self) -> TrialParameters<T> {
        TrialParameters::new(self.period, self.duration_hr, self.epoch)
    }

    /// Ephemeris of the detected box, `t_min` is the first observation of the searched series
    pub fn ephemeris(&self, t_min: T) -> TransitEphemeris<T> {
        self.trial().ephemeris(t_min)
    }
}

/// Snapshot of the best trial: good transit windows concatenated in time order
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "T: Float")]
pub struct BestModel<T> {
    pub time: Array1<T>,
    pub flux: Array1<T>,
    /// Local polynomial trends
    pub model_flux: Array1<T>,
    pub flux_resid: Array1<T>,
    /// Detrended in-transit flux of all windows
    pub all_in_transit_flux: Array1<T>,
    /// Detrended out-of-transit flux of all windows
    pub all_out_transit_flux: Array1<T>,
}

/// Best trial of a search call
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "T: Float")]
pub struct BestFit<T> {
    pub params: BestParams<T>,
    /// Box of the best trial in absolute time of the searched series
    pub ephemeris: TransitEphemeris<T>,
    pub model: BestModel<T>,
}

/// Output of a single search call
///
/// `best` is `None` if no trial of any period had good transits.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "T: Float")]
pub struct SearchResult<T> {
    pub periodogram: Periodogram<T>,
    pub best: Option<BestFit<T>>,
}

impl<T> SearchResult<T>
where
    T: Float,
{
    pub fn best_params(&self) -> Option<&BestParams<T>> {
        self.best.as_ref().map(|best| &best.params)
    }
}
