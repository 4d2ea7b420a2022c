//! Transit geometry: trial parameters, ephemerides and box-transit injection

use crate::error::InputError;
use crate::float_trait::Float;

use ndarray::Array1;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One point of the search grid
///
/// Duration is absolute, in hours, the same for all periods. Epoch is a phase of the transit
/// start relative to the first observation, in $[0, 1 - q]$ where $q$ is the duration as a
/// fraction of the period.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(bound = "T: Float")]
pub struct TrialParameters<T> {
    pub period: T,
    pub duration_hr: T,
    pub epoch: T,
}

impl<T> TrialParameters<T>
where
    T: Float,
{
    pub fn new(period: T, duration_hr: T, epoch: T) -> Self {
        Self {
            period,
            duration_hr,
            epoch,
        }
    }

    /// Transit duration in days
    #[inline]
    pub fn duration_days(&self) -> T {
        self.duration_hr / T::hours_per_day()
    }

    /// Transit duration as a fraction of the period
    #[inline]
    pub fn duration_fraction(&self) -> T {
        self.duration_days() / self.period
    }

    /// Start of the reference transit, $T_0 = t_\mathrm{min} + \mathrm{epoch} \times P$
    #[inline]
    pub fn reference_start(&self, t_min: T) -> T {
        t_min + self.epoch * self.period
    }

    /// Ephemeris of the box this trial describes for a series starting at `t_min`
    pub fn ephemeris(&self, t_min: T) -> TransitEphemeris<T> {
        let duration = self.duration_days();
        TransitEphemeris {
            period: self.period,
            duration,
            epoch: self.reference_start(t_min) + T::half() * duration,
        }
    }
}

/// Periodic box transit: period and duration in days, epoch is a mid-transit time
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(bound = "T: Float")]
pub struct TransitEphemeris<T> {
    pub period: T,
    pub duration: T,
    pub epoch: T,
}

impl<T> TransitEphemeris<T>
where
    T: Float,
{
    pub fn new(period: T, duration: T, epoch: T) -> Result<Self, InputError> {
        if !(period.is_finite() && period > T::zero()) {
            return Err(InputError::InvalidPeriod {
                index: 0,
                period: period.to_f64().unwrap_or(f64::NAN),
            });
        }
        if !(duration.is_finite() && duration > T::zero()) {
            return Err(InputError::InvalidDuration {
                duration_hr: (duration * T::hours_per_day())
                    .to_f64()
                    .unwrap_or(f64::NAN),
            });
        }
        Ok(Self {
            period,
            duration,
            epoch,
        })
    }

    pub fn from_hours(period: T, duration_hr: T, epoch: T) -> Result<Self, InputError> {
        Self::new(period, duration_hr / T::hours_per_day(), epoch)
    }

    /// Phase distance to the closest mid-transit time is less than a half of the duration
    pub fn is_in_transit(&self, t: T) -> bool {
        let half_period = T::half() * self.period;
        let mut phase = (t - self.epoch + half_period) % self.period;
        if phase < T::zero() {
            phase += self.period;
        }
        (phase - half_period).abs() < T::half() * self.duration
    }

    pub fn transit_mask(&self, t: &[T]) -> Vec<bool> {
        t.iter().map(|&t| self.is_in_transit(t)).collect()
    }
}

/// Subtract `depth` from every in-transit flux value, returning a new flux array
pub fn inject_box_transit<T>(
    t: &[T],
    flux: &[T],
    ephemeris: &TransitEphemeris<T>,
    depth: T,
) -> Result<Array1<T>, InputError>
where
    T: Float,
{
    if t.len() != flux.len() {
        return Err(InputError::LengthMismatch {
            t: t.len(),
            flux: flux.len(),
        });
    }
    if !(depth.is_finite() && depth >= T::zero()) {
        return Err(InputError::InvalidDepth(depth.to_f64().unwrap_or(f64::NAN)));
    }
    Ok(t.iter()
        .zip(flux)
        .map(|(&t, &f)| {
            if ephemeris.is_in_transit(t) {
                f - depth
            } else {
                f
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn duration_conversions() {
        let trial = TrialParameters::new(2.0_f64, 3.0, 0.25);
        assert_relative_eq!(trial.duration_days(), 0.125);
        assert_relative_eq!(trial.duration_fraction(), 0.0625);
        assert_relative_eq!(trial.reference_start(10.0), 10.5);
        let ephemeris = trial.ephemeris(10.0);
        assert_relative_eq!(ephemeris.epoch, 10.5625);
        assert_relative_eq!(ephemeris.duration, 0.125);
    }

    #[test]
    fn in_transit_is_periodic() {
        let ephemeris = TransitEphemeris::new(2.0_f64, 0.2, 0.4).unwrap();
        for k in -3..10 {
            let center = 0.4 + 2.0 * f64::from(k);
            assert!(ephemeris.is_in_transit(center));
            assert!(ephemeris.is_in_transit(center + 0.09));
            assert!(ephemeris.is_in_transit(center - 0.09));
            assert!(!ephemeris.is_in_transit(center + 0.11));
            assert!(!ephemeris.is_in_transit(center + 1.0));
        }
    }

    #[test]
    fn inject() {
        let t: Vec<_> = (0..1000).map(|i| 0.01 * i as f64).collect();
        let flux = vec![1.0; t.len()];
        let ephemeris = TransitEphemeris::from_hours(2.0, 2.16, 0.4).unwrap();
        let injected = inject_box_transit(&t, &flux, &ephemeris, 0.02).unwrap();
        let mask = ephemeris.transit_mask(&t);
        for ((&f, &m), &t) in injected.iter().zip(&mask).zip(&t) {
            if m {
                assert_relative_eq!(f, 0.98);
                assert!((t - 0.4).rem_euclid(2.0) < 0.046 || (t - 0.4).rem_euclid(2.0) > 1.954);
            } else {
                assert_relative_eq!(f, 1.0);
            }
        }
        // Each of five transits covers nine 0.01-day samples
        assert_eq!(mask.iter().filter(|&&m| m).count(), 45);
    }

    #[test]
    fn invalid_inputs() {
        assert!(TransitEphemeris::new(0.0_f64, 0.1, 0.0).is_err());
        assert!(TransitEphemeris::new(1.0_f64, -0.1, 0.0).is_err());
        let ephemeris = TransitEphemeris::new(1.0_f64, 0.1, 0.0).unwrap();
        assert_eq!(
            inject_box_transit(&[0.0], &[1.0], &ephemeris, -1.0).unwrap_err(),
            InputError::InvalidDepth(-1.0)
        );
    }
}
