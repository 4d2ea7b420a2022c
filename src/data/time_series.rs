use crate::data::data_sample::DataSample;
use crate::error::InputError;
use crate::float_trait::Float;
use crate::transit::TransitEphemeris;

use itertools::Itertools;

/// Light curve to be searched for transits
///
/// Construction validates the series once: arrays have the same non-zero length, all values are
/// finite and time increases strictly. The series is read-only afterwards, so it can be shared
/// between worker threads.
#[derive(Clone, Debug)]
pub struct TimeSeries<'a, T>
where
    T: Float,
{
    t: DataSample<'a, T>,
    flux: DataSample<'a, T>,
}

impl<'a, T> TimeSeries<'a, T>
where
    T: Float,
{
    /// Construct `TimeSeries` from array-like objects
    ///
    /// `t` is time in days, `flux` is normalised flux. Input arrays could be
    /// [`ndarray::Array1`], [`ndarray::ArrayView1`], 1-D [`ndarray::CowArray`], `Vec<T>` or `&[T]`.
    pub fn try_new(
        t: impl Into<DataSample<'a, T>>,
        flux: impl Into<DataSample<'a, T>>,
    ) -> Result<Self, InputError> {
        let t = t.into();
        let flux = flux.into();

        if t.len() != flux.len() {
            return Err(InputError::LengthMismatch {
                t: t.len(),
                flux: flux.len(),
            });
        }
        if t.is_empty() {
            return Err(InputError::EmptyTimeSeries);
        }
        t.check_finite("time")?;
        flux.check_finite("flux")?;
        if let Some(index) = t.first_non_increasing() {
            return Err(InputError::NonMonotonicTime { index });
        }

        Ok(Self { t, flux })
    }

    /// Time series length
    #[inline]
    pub fn lenu(&self) -> usize {
        self.t.len()
    }

    #[inline]
    pub fn t(&self) -> &[T] {
        self.t.as_slice()
    }

    #[inline]
    pub fn flux(&self) -> &[T] {
        self.flux.as_slice()
    }

    pub fn t_min(&self) -> T {
        self.t()[0]
    }

    pub fn t_max(&self) -> T {
        self.t()[self.lenu() - 1]
    }

    /// Observation time span, $t_\mathrm{max} - t_\mathrm{min}$
    pub fn span(&self) -> T {
        self.t_max() - self.t_min()
    }

    /// Typical cadence: median interval between consequent observations
    pub fn median_cadence(&self) -> Option<T> {
        self.t.median_diff()
    }

    /// Fail if the series is too short to detrend windows with polynomial of the given order
    pub fn check_min_length(&self, poly_order: usize) -> Result<(), InputError> {
        let minimum = poly_order.saturating_add(1).saturating_mul(2);
        if self.lenu() < minimum {
            Err(InputError::ShortTimeSeries {
                actual: self.lenu(),
                minimum,
            })
        } else {
            Ok(())
        }
    }

    /// Copy of the series with in-transit observations removed
    ///
    /// Used to mask an already detected signal before searching for the next one. Returns
    /// [`InputError::EmptyTimeSeries`] if every observation is in transit.
    pub fn without_transits(
        &self,
        ephemeris: &TransitEphemeris<T>,
    ) -> Result<TimeSeries<'static, T>, InputError> {
        let (t, flux): (Vec<_>, Vec<_>) = self
            .t()
            .iter()
            .zip_eq(self.flux())
            .filter(|&(&t, _)| !ephemeris.is_in_transit(t))
            .map(|(&t, &flux)| (t, flux))
            .unzip();
        TimeSeries::try_new(t, flux)
    }

    pub fn into_owned(self) -> TimeSeries<'static, T> {
        TimeSeries {
            t: self.t.into_owned(),
            flux: self.flux.into_owned(),
        }
    }
}
