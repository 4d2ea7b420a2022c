use crate::data::TimeSeries;
use crate::error::InputError;
use crate::float_trait::Float;
use crate::search::engine::Pbls;
use crate::search::result::SearchResult;

use log::{debug, info};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Repeated search masking the best transit signal after every iteration
///
/// Iterations stop after `max_iterations` searches, once the best SNR is not above
/// `snr_threshold`, or when masking leaves too few observations for another search. The masked
/// interval is `mask_duration_factor` times longer than the best trial duration, so the edges of
/// a transit missed by the epoch grid are masked too.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(bound = "T: Float")]
pub struct IterativeSearch<T> {
    pub max_iterations: usize,
    pub snr_threshold: T,
    pub mask_duration_factor: T,
}

impl<T> IterativeSearch<T>
where
    T: Float,
{
    pub fn new(max_iterations: usize, snr_threshold: T) -> Self {
        Self {
            max_iterations,
            snr_threshold,
            mask_duration_factor: T::two(),
        }
    }

    pub fn with_mask_duration_factor(mut self, mask_duration_factor: T) -> Self {
        self.mask_duration_factor = mask_duration_factor;
        self
    }

    /// Results of every iteration, the first one is the search of the unmasked series
    pub fn run(
        &self,
        pbls: &Pbls<T>,
        ts: &TimeSeries<T>,
        periods: &[T],
    ) -> Result<Vec<SearchResult<T>>, InputError> {
        let mut results = Vec::with_capacity(self.max_iterations);
        let mut current = ts.clone().into_owned();
        for iteration in 0..self.max_iterations {
            let result = pbls.search(&current, periods)?;
            let Some(best) = &result.best else {
                info!("IterativeSearch iteration {iteration}: no signal found, stopping");
                results.push(result);
                break;
            };
            let stop = !(best.params.snr > self.snr_threshold);
            let mut mask = best.ephemeris;
            mask.duration *= self.mask_duration_factor;
            info!(
                "IterativeSearch iteration {iteration}: period {}, SNR {}",
                best.params.period, best.params.snr
            );
            results.push(result);
            if stop {
                break;
            }

            match current.without_transits(&mask) {
                Ok(masked) if masked.check_min_length(pbls.config().poly_order).is_ok() => {
                    debug!(
                        "IterativeSearch masked {} of {} observations",
                        current.lenu() - masked.lenu(),
                        current.lenu()
                    );
                    current = masked;
                }
                _ => {
                    info!("IterativeSearch: too few observations left after masking, stopping");
                    break;
                }
            }
        }
        Ok(results)
    }
}

impl<T> Default for IterativeSearch<T>
where
    T: Float,
{
    fn default() -> Self {
        Self::new(3, T::from_f64(7.0))
    }
}
