use crate::data::TimeSeries;
use crate::detrend::DetrendedWindow;
use crate::error::InputError;
use crate::float_trait::Float;
use crate::search::backend::SearchBackendTrait;
use crate::search::config::SearchConfig;
use crate::search::result::{BestFit, BestModel, BestParams, Periodogram, SearchResult};
use crate::snr::{TransitScore, score};
use crate::transit::TrialParameters;
use crate::window::locate_windows;

use log::{debug, info, trace};
use macro_const::macro_const;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::time::Instant;

macro_const! {
    const PBLS_DOC: &str = r#"
Polynomial-detrended box least squares transit search

For every trial period, duration and epoch the light curve is cut into windows of $\pm 3$
durations around the expected transits. A polynomial of order `poly_order` is fitted to the
out-of-transit part of every window and subtracted, and detrended fluxes of all windows are
pooled into the in-transit and the out-of-transit sets. The trial is scored by the Welch-like
signal-to-noise ratio of the depth:
$$
\mathrm{SNR} = \frac{\langle R_\mathrm{out} \rangle - \langle R_\mathrm{in} \rangle}{\sqrt{\sigma^2_\mathrm{in}/N_\mathrm{in} + \sigma^2_\mathrm{out}/N_\mathrm{out}}}.
$$
Power of a period is the maximum SNR over its durations and epochs, the best model is a
snapshot of the trial with the greatest SNR over the whole grid. Ties keep the trial found
first, in the period, duration, epoch loop order.

Local detrending makes the search robust to stellar rotation and other variability on time
scales longer than a few transit durations.
"#;
}

#[doc = PBLS_DOC!()]
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(
    bound = "T: Float",
    try_from = "SearchConfig<T>",
    into = "SearchConfig<T>"
)]
pub struct Pbls<T>
where
    T: Float,
{
    config: SearchConfig<T>,
}

impl<T> Pbls<T>
where
    T: Float,
{
    pub fn new(config: SearchConfig<T>) -> Result<Self, InputError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn doc() -> &'static str {
        PBLS_DOC
    }

    pub fn config(&self) -> &SearchConfig<T> {
        &self.config
    }

    /// Search the series over the given trial periods
    ///
    /// Fails if the series is too short for the polynomial order, if a period is not positive
    /// or if a duration is not shorter than some period. Periods are searched independently, so
    /// they don't have to be sorted.
    pub fn search(
        &self,
        ts: &TimeSeries<T>,
        periods: &[T],
    ) -> Result<SearchResult<T>, InputError> {
        ts.check_min_length(self.config.poly_order)?;
        self.check_periods(periods)?;

        let started = Instant::now();
        let per_period = self
            .config
            .backend
            .map_indices(periods.len(), |i| self.search_period(ts, periods[i]))?;

        let mut power = Vec::with_capacity(periods.len());
        let best = per_period
            .into_iter()
            .fold(None, |best: Option<TrialOutcome<T>>, period_search| {
                power.push(period_search.power);
                match (best, period_search.best) {
                    (Some(best), Some(candidate)) if candidate.snr() > best.snr() => {
                        Some(candidate)
                    }
                    (None, candidate) => candidate,
                    (best, _) => best,
                }
            })
            .map(|outcome| outcome.best_fit(ts));

        match &best {
            Some(best) => info!(
                "Pbls::search {} periods in {:.3?}: best period {}, duration {} hr, SNR {}",
                periods.len(),
                started.elapsed(),
                best.params.period,
                best.params.duration_hr,
                best.params.snr,
            ),
            None => info!(
                "Pbls::search {} periods in {:.3?}: no trial has good transits",
                periods.len(),
                started.elapsed(),
            ),
        }

        Ok(SearchResult {
            periodogram: Periodogram {
                periods: Array1::from(periods.to_vec()),
                power: Array1::from(power),
            },
            best,
        })
    }

    fn check_periods(&self, periods: &[T]) -> Result<(), InputError> {
        let max_duration_hr = self
            .config
            .durations_hr
            .iter()
            .copied()
            .fold(T::zero(), T::max);
        for (index, &period) in periods.iter().enumerate() {
            if !(period.is_finite() && period > T::zero()) {
                return Err(InputError::InvalidPeriod {
                    index,
                    period: period.to_f64().unwrap_or(f64::NAN),
                });
            }
            if max_duration_hr / T::hours_per_day() >= period {
                return Err(InputError::DurationExceedsPeriod {
                    duration_hr: max_duration_hr.to_f64().unwrap_or(f64::NAN),
                    period: period.to_f64().unwrap_or(f64::NAN),
                });
            }
        }
        Ok(())
    }

    /// All durations and epochs of a single period
    pub fn search_period(&self, ts: &TimeSeries<T>, period: T) -> PeriodSearch<T> {
        self.config
            .durations_hr
            .iter()
            .flat_map(|&duration_hr| {
                let fraction = TrialParameters::new(period, duration_hr, T::zero())
                    .duration_fraction();
                self.config
                    .epochs(fraction)
                    .map(move |epoch| TrialParameters::new(period, duration_hr, epoch))
            })
            .filter_map(|trial| self.evaluate_trial(ts, trial))
            .fold(PeriodSearch::undefined(), PeriodSearch::update)
    }

    /// Detrend and score a single trial
    ///
    /// `None` means the trial is undefined: there are no good transit windows, every window
    /// failed to fit, both depth and noise are zero or the trial timed out.
    pub fn evaluate_trial(
        &self,
        ts: &TimeSeries<T>,
        trial: TrialParameters<T>,
    ) -> Option<TrialOutcome<T>> {
        let (t, flux) = (ts.t(), ts.flux());
        let deadline = self
            .config
            .trial_timeout
            .map(|timeout| Instant::now() + timeout);

        let mut windows = vec![];
        for window in locate_windows(t, trial, self.config.poly_order) {
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                debug!(
                    "Pbls::evaluate_trial timed out: period {}, duration {} hr, epoch {}",
                    trial.period, trial.duration_hr, trial.epoch
                );
                return None;
            }
            match DetrendedWindow::new(
                t,
                flux,
                window,
                self.config.poly_order,
                self.config.ridge,
            ) {
                Ok(detrended) => windows.push(detrended),
                Err(err) => trace!("Pbls::evaluate_trial window excluded: {err}"),
            }
        }
        if windows.is_empty() {
            return None;
        }

        let in_transit: Vec<_> = windows
            .iter()
            .flat_map(|w| w.in_transit_residuals(flux))
            .collect();
        let out_of_transit: Vec<_> = windows
            .iter()
            .flat_map(|w| w.out_of_transit_residuals(flux))
            .collect();
        let score = score(&in_transit, &out_of_transit)?;
        Some(TrialOutcome {
            trial,
            score,
            windows,
            in_transit,
            out_of_transit,
        })
    }
}

impl<T> Default for Pbls<T>
where
    T: Float,
{
    fn default() -> Self {
        Self {
            config: SearchConfig::default(),
        }
    }
}

impl<T> TryFrom<SearchConfig<T>> for Pbls<T>
where
    T: Float,
{
    type Error = InputError;

    fn try_from(config: SearchConfig<T>) -> Result<Self, Self::Error> {
        Self::new(config)
    }
}

impl<T> From<Pbls<T>> for SearchConfig<T>
where
    T: Float,
{
    fn from(pbls: Pbls<T>) -> Self {
        pbls.config
    }
}

/// Scored trial with its detrended windows and residual pools
#[derive(Clone, Debug)]
pub struct TrialOutcome<T> {
    pub trial: TrialParameters<T>,
    pub score: TransitScore<T>,
    pub windows: Vec<DetrendedWindow<T>>,
    pub in_transit: Vec<T>,
    pub out_of_transit: Vec<T>,
}

impl<T> TrialOutcome<T>
where
    T: Float,
{
    pub fn snr(&self) -> T {
        self.score.snr
    }

    pub fn params(&self) -> BestParams<T> {
        BestParams {
            period: self.trial.period,
            duration_hr: self.trial.duration_hr,
            epoch: self.trial.epoch,
            depth: self.score.depth,
            snr: self.score.snr,
        }
    }

    /// Snapshot of the windows, `ts` must be the series the trial was evaluated on
    pub fn best_fit(&self, ts: &TimeSeries<T>) -> BestFit<T> {
        let (t, flux) = (ts.t(), ts.flux());
        let size = self.windows.iter().map(|w| w.window.local_len()).sum();
        let mut time = Vec::with_capacity(size);
        let mut local_flux = Vec::with_capacity(size);
        let mut model_flux = Vec::with_capacity(size);
        for w in &self.windows {
            time.extend_from_slice(&t[w.window.local.clone()]);
            local_flux.extend_from_slice(&flux[w.window.local.clone()]);
            model_flux.extend_from_slice(&w.model);
        }
        let time = Array1::from(time);
        let flux = Array1::from(local_flux);
        let model_flux = Array1::from(model_flux);
        let flux_resid = &flux - &model_flux;
        BestFit {
            params: self.params(),
            ephemeris: self.trial.ephemeris(ts.t_min()),
            model: BestModel {
                time,
                flux,
                model_flux,
                flux_resid,
                all_in_transit_flux: Array1::from(self.in_transit.clone()),
                all_out_transit_flux: Array1::from(self.out_of_transit.clone()),
            },
        }
    }
}

/// Fold state of a single period: maximum SNR and the trial reaching it
#[derive(Clone, Debug)]
pub struct PeriodSearch<T> {
    pub power: T,
    pub best: Option<TrialOutcome<T>>,
}

impl<T> PeriodSearch<T>
where
    T: Float,
{
    pub fn undefined() -> Self {
        Self {
            power: T::neg_infinity(),
            best: None,
        }
    }

    pub fn update(self, outcome: TrialOutcome<T>) -> Self {
        if outcome.snr() > self.power {
            Self {
                power: outcome.snr(),
                best: Some(outcome),
            }
        } else {
            self
        }
    }
}
