//! Trial period grids
//!
//! All grids are ascending and lie within $[P_\mathrm{min}, P_\mathrm{max}]$, where
//! $P_\mathrm{max}$ is clamped to a half of the observation span for the data-driven grids.

use crate::data::TimeSeries;
use crate::error::InputError;
use crate::float_trait::Float;

use conv::{ConvAsUtil, RoundToZero};
use enum_dispatch::enum_dispatch;
use ndarray::Array1;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

const DEFAULT_PERIOD_MIN: f64 = 2.0;
const DEFAULT_CLAMP_PERIOD_MAX: f64 = 50.0;

/// Solar radius, m
const R_SUN: f64 = 6.957e8;
/// Solar mass, kg
const M_SUN: f64 = 1.98847e30;
/// Gravitational constant, m^3 kg^-1 s^-2
const G: f64 = 6.67430e-11;

#[enum_dispatch]
pub trait PeriodGridTrait<T>: Send + Sync + Clone + Debug {
    /// Ascending array of trial periods, in days
    fn periods(&self) -> Result<Array1<T>, InputError>;
}

/// Period grid selection
#[enum_dispatch(PeriodGridTrait<T>)]
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(bound = "T: Float")]
#[non_exhaustive]
pub enum PeriodGrid<T: Float> {
    UniformFreq(UniformFreqPeriodGrid<T>),
    Ofir2014(Ofir2014PeriodGrid<T>),
    Jenkins2010(Jenkins2010PeriodGrid<T>),
    Linear(LinearPeriodGrid<T>),
}

fn grid_error(message: impl Into<String>) -> InputError {
    InputError::PeriodGrid(message.into())
}

fn check_positive<T: Float>(name: &str, value: T) -> Result<(), InputError> {
    if value.is_finite() && value > T::zero() {
        Ok(())
    } else {
        Err(grid_error(format!("{name} must be positive and finite, got {value}")))
    }
}

/// Clamped maximum period, must exceed the minimum one
fn period_max<T: Float>(total_time: T, period_min: T, clamp_period_max: T) -> Result<T, InputError> {
    let period_max = T::min(T::half() * total_time, clamp_period_max);
    if period_max <= period_min {
        return Err(grid_error(format!(
            "maximum period {period_max} must be larger than minimum period {period_min}"
        )));
    }
    Ok(period_max)
}

/// Keep only the finite periods within the bounds, the grid must not become empty
fn within<T: Float>(
    periods: Vec<T>,
    in_range: impl Fn(T) -> bool,
) -> Result<Array1<T>, InputError> {
    let periods: Array1<_> = periods
        .into_iter()
        .filter(|&p| p.is_finite() && in_range(p))
        .collect();
    if periods.is_empty() {
        Err(grid_error("grid has no periods"))
    } else {
        Ok(periods)
    }
}

/// Uniform grid in frequency, inverted to periods
///
/// $P_\mathrm{max} = \min(\mathrm{span} / 2, P_\mathrm{clamp})$, and
/// $N = \lfloor \mathrm{oversample} \times \mathrm{span} / \mathrm{cadence} \rfloor$ frequencies
/// are placed uniformly in $[1/P_\mathrm{max}, 1/P_\mathrm{min}]$. The grid is denser at short
/// periods.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(bound = "T: Float")]
pub struct UniformFreqPeriodGrid<T> {
    pub total_time: T,
    pub cadence: T,
    pub oversample: T,
    pub period_min: T,
    pub clamp_period_max: T,
}

impl<T: Float> UniformFreqPeriodGrid<T> {
    pub fn new(total_time: T, cadence: T) -> Self {
        Self {
            total_time,
            cadence,
            oversample: T::one(),
            period_min: T::from_f64(DEFAULT_PERIOD_MIN),
            clamp_period_max: T::from_f64(DEFAULT_CLAMP_PERIOD_MAX),
        }
    }

    /// Span and median cadence are taken from the time series
    pub fn from_t(ts: &TimeSeries<T>) -> Result<Self, InputError> {
        let cadence = ts
            .median_cadence()
            .ok_or_else(|| grid_error("cadence is undefined for a single observation"))?;
        Ok(Self::new(ts.span(), cadence))
    }

    pub fn with_oversample(mut self, oversample: T) -> Self {
        self.oversample = oversample;
        self
    }

    pub fn with_period_range(mut self, period_min: T, clamp_period_max: T) -> Self {
        self.period_min = period_min;
        self.clamp_period_max = clamp_period_max;
        self
    }
}

impl<T: Float> PeriodGridTrait<T> for UniformFreqPeriodGrid<T> {
    fn periods(&self) -> Result<Array1<T>, InputError> {
        check_positive("total time", self.total_time)?;
        check_positive("cadence", self.cadence)?;
        check_positive("oversample", self.oversample)?;
        check_positive("minimum period", self.period_min)?;
        let period_max = period_max(self.total_time, self.period_min, self.clamp_period_max)?;

        let size: usize = (self.oversample * self.total_time / self.cadence)
            .approx_by::<RoundToZero>()
            .map_err(|_| grid_error("number of frequencies is not representable"))?;
        if size < 1 {
            return Err(grid_error("number of frequencies must be at least one"));
        }

        let freq_min = self.period_min.recip();
        let freq_max = period_max.recip();
        let periods = if size == 1 {
            vec![period_max]
        } else {
            let step = (freq_min - freq_max) / T::from_usize(size - 1);
            (0..size)
                .map(|i| {
                    (freq_min - step * T::from_usize(i))
                        .recip()
                        .max(self.period_min)
                        .min(period_max)
                })
                .collect()
        };
        Ok(Array1::from_vec(periods))
    }
}

/// Cubic-in-frequency grid of Ofir (2014)
///
/// Fractional transit duration scales as $f^{2/3}$ for a star of the given radius and mass, so
/// frequencies $f_x = (A x / 3 + C)^3$ keep the duty-cycle-limited resolution constant:
/// $$
/// A = \frac{(2\pi)^{2/3}}{\pi} \frac{R_\star}{(G M_\star)^{1/3}} \frac{1}{\mathrm{span} \times \mathrm{oversampling}}.
/// $$
///
/// Periods are kept in $(P_\mathrm{min}, P_\mathrm{max}]$.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(bound = "T: Float")]
pub struct Ofir2014PeriodGrid<T> {
    pub time_span: T,
    /// Stellar radius, solar radii
    pub r_star: T,
    /// Stellar mass, solar masses
    pub m_star: T,
    pub period_min: T,
    pub clamp_period_max: T,
    pub oversampling_factor: T,
}

impl<T: Float> Ofir2014PeriodGrid<T> {
    pub fn new(time_span: T) -> Self {
        Self {
            time_span,
            r_star: T::one(),
            m_star: T::one(),
            period_min: T::from_f64(DEFAULT_PERIOD_MIN),
            clamp_period_max: T::from_f64(DEFAULT_CLAMP_PERIOD_MAX),
            oversampling_factor: T::one(),
        }
    }

    pub fn with_star(mut self, r_star: T, m_star: T) -> Self {
        self.r_star = r_star;
        self.m_star = m_star;
        self
    }

    pub fn with_period_range(mut self, period_min: T, clamp_period_max: T) -> Self {
        self.period_min = period_min;
        self.clamp_period_max = clamp_period_max;
        self
    }

    pub fn with_oversampling_factor(mut self, oversampling_factor: T) -> Self {
        self.oversampling_factor = oversampling_factor;
        self
    }
}

impl<T: Float> PeriodGridTrait<T> for Ofir2014PeriodGrid<T> {
    fn periods(&self) -> Result<Array1<T>, InputError> {
        check_positive("time span", self.time_span)?;
        check_positive("stellar radius", self.r_star)?;
        check_positive("stellar mass", self.m_star)?;
        check_positive("minimum period", self.period_min)?;
        check_positive("oversampling factor", self.oversampling_factor)?;
        let period_max = period_max(self.time_span, self.period_min, self.clamp_period_max)?;

        // Computations are in SI to keep the constants meaningful
        let day = T::seconds_per_day();
        let third = T::three().recip();
        let radius = self.r_star * T::from_f64(R_SUN);
        let gm = T::from_f64(G) * self.m_star * T::from_f64(M_SUN);
        let span = self.time_span * day;
        let freq_min = (period_max * day).recip();
        let freq_max = (self.period_min * day).recip();

        let a = T::TAU().powf(T::two() * third) / T::PI() * radius
            / gm.powf(third)
            / (span * self.oversampling_factor);
        let c = freq_min.powf(third) - a * third;
        let size: usize = ((freq_max.powf(third) - freq_min.powf(third) + a * third) * T::three()
            / a)
            .approx_by::<RoundToZero>()
            .map_err(|_| grid_error("number of frequencies is not representable"))?;

        let periods = (1..=size)
            .rev()
            .map(|x| (a * third * T::from_usize(x) + c).powi(3).recip() / day)
            .collect();
        within(periods, |p| p > self.period_min && p <= period_max)
    }
}

/// Grid of Jenkins et al. (2010) keeping the correlation of neighbouring box templates of the
/// given duration above `min_corr`: $\Delta P = 4 (1 - \rho_\mathrm{min}) D P / \mathrm{span}$
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(bound = "T: Float")]
pub struct Jenkins2010PeriodGrid<T> {
    pub duration_hr: T,
    pub total_time: T,
    pub period_min: T,
    pub period_max: T,
    pub min_corr: T,
}

impl<T: Float> Jenkins2010PeriodGrid<T> {
    pub fn new(duration_hr: T, total_time: T, period_min: T, period_max: T) -> Self {
        Self {
            duration_hr,
            total_time,
            period_min,
            period_max,
            min_corr: T::from_f64(0.9),
        }
    }

    pub fn with_min_corr(mut self, min_corr: T) -> Self {
        self.min_corr = min_corr;
        self
    }
}

impl<T: Float> PeriodGridTrait<T> for Jenkins2010PeriodGrid<T> {
    fn periods(&self) -> Result<Array1<T>, InputError> {
        check_positive("duration", self.duration_hr)?;
        check_positive("total time", self.total_time)?;
        check_positive("minimum period", self.period_min)?;
        if !(self.period_max.is_finite() && self.period_max > self.period_min) {
            return Err(grid_error(format!(
                "maximum period {} must be larger than minimum period {}",
                self.period_max, self.period_min
            )));
        }
        if !(self.min_corr > T::zero() && self.min_corr < T::one()) {
            return Err(grid_error(format!(
                "minimum correlation must be in (0, 1), got {}",
                self.min_corr
            )));
        }

        let factor = T::four() * (T::one() - self.min_corr) * self.duration_hr
            / T::hours_per_day()
            / self.total_time;
        let mut periods = vec![self.period_min];
        let mut period = self.period_min;
        loop {
            period += factor * period;
            if period > self.period_max {
                break;
            }
            periods.push(period);
        }
        within(periods, |p| p >= self.period_min && p <= self.period_max)
    }
}

/// Linear grid of `size` periods starting at `start` with `step`
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(bound = "T: Float")]
pub struct LinearPeriodGrid<T> {
    pub start: T,
    pub step: T,
    pub size: usize,
}

impl<T: Float> LinearPeriodGrid<T> {
    pub fn new(start: T, step: T, size: usize) -> Self {
        Self { start, step, size }
    }
}

impl<T: Float> PeriodGridTrait<T> for LinearPeriodGrid<T> {
    fn periods(&self) -> Result<Array1<T>, InputError> {
        check_positive("start period", self.start)?;
        check_positive("period step", self.step)?;
        if self.size == 0 {
            return Err(grid_error("grid has no periods"));
        }
        Ok((0..self.size)
            .map(|i| self.start + self.step * T::from_usize(i))
            .collect())
    }
}
