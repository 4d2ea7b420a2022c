use crate::error::InputError;
use crate::float_trait::Float;
use crate::search::backend::SearchBackend;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_DURATIONS_HR: [f64; 5] = [1.0, 2.0, 3.0, 4.0, 6.0];

/// Parameters of the search grid and of the local detrending
///
/// Durations are absolute, in hours, and are the same for every trial period. Epochs are
/// `epoch_steps` phases of the transit start evenly spaced in $[0, 1 - q]$, where $q$ is the
/// duration as a fraction of the period.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(bound = "T: Float")]
pub struct SearchConfig<T> {
    pub durations_hr: Vec<T>,
    pub epoch_steps: usize,
    pub poly_order: usize,
    /// Diagonal loading of the polynomial normal equations
    pub ridge: T,
    pub backend: SearchBackend,
    /// Trials running longer are treated as having no good transits
    pub trial_timeout: Option<Duration>,
}

impl<T> Default for SearchConfig<T>
where
    T: Float,
{
    fn default() -> Self {
        Self {
            durations_hr: DEFAULT_DURATIONS_HR.iter().map(|&d| T::from_f64(d)).collect(),
            epoch_steps: 50,
            poly_order: 2,
            ridge: T::ridge(),
            backend: SearchBackend::default(),
            trial_timeout: None,
        }
    }
}

impl<T> SearchConfig<T>
where
    T: Float,
{
    pub fn with_durations_hr(mut self, durations_hr: impl Into<Vec<T>>) -> Self {
        self.durations_hr = durations_hr.into();
        self
    }

    pub fn with_epoch_steps(mut self, epoch_steps: usize) -> Self {
        self.epoch_steps = epoch_steps;
        self
    }

    pub fn with_poly_order(mut self, poly_order: usize) -> Self {
        self.poly_order = poly_order;
        self
    }

    pub fn with_ridge(mut self, ridge: T) -> Self {
        self.ridge = ridge;
        self
    }

    pub fn with_backend(mut self, backend: SearchBackend) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_trial_timeout(mut self, trial_timeout: Duration) -> Self {
        self.trial_timeout = Some(trial_timeout);
        self
    }

    pub fn validate(&self) -> Result<(), InputError> {
        if self.durations_hr.is_empty() {
            return Err(InputError::NoDurations);
        }
        if let Some(&duration_hr) = self
            .durations_hr
            .iter()
            .find(|d| !(d.is_finite() && **d > T::zero()))
        {
            return Err(InputError::InvalidDuration {
                duration_hr: duration_hr.to_f64().unwrap_or(f64::NAN),
            });
        }
        if self.epoch_steps == 0 {
            return Err(InputError::ZeroEpochSteps);
        }
        if !(self.ridge.is_finite() && self.ridge >= T::zero()) {
            return Err(InputError::InvalidRidge(
                self.ridge.to_f64().unwrap_or(f64::NAN),
            ));
        }
        Ok(())
    }

    /// Epoch phases of the given duration fraction
    pub(crate) fn epochs(&self, duration_fraction: T) -> impl Iterator<Item = T> + use<T> {
        let max_epoch = T::one() - duration_fraction;
        let steps = self.epoch_steps;
        (0..steps).map(move |i| {
            if steps == 1 {
                T::zero()
            } else {
                max_epoch * T::from_usize(i) / T::from_usize(steps - 1)
            }
        })
    }
}
