//! Deterministic reduction of per-chunk search results

use crate::chunk::Chunk;
use crate::error::MergeError;
use crate::float_trait::Float;
use crate::search::{BestFit, Periodogram, SearchResult};

use itertools::Itertools;
use log::{info, warn};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Search result of a single chunk, the unit of handoff between chunk runs and the merge
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "T: Float")]
pub struct ChunkOutput<T> {
    pub chunk: Chunk,
    pub result: SearchResult<T>,
}

/// Merged periodogram of all available chunks and the best model over them
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "T: Float")]
pub struct MergedResult<T> {
    /// Periodograms of all chunks sorted by period
    pub periodogram: Periodogram<T>,
    pub best: BestFit<T>,
    pub best_chunk: Chunk,
    /// Chunk indices without output
    pub missing_chunks: Vec<usize>,
    /// Chunk indices without any defined power, they are not best model candidates
    pub excluded_chunks: Vec<usize>,
}

impl<T> MergedResult<T> {
    pub fn is_complete(&self) -> bool {
        self.missing_chunks.is_empty()
    }
}

/// Merge outputs of a grid split into `total_chunks` chunks
///
/// The result doesn't depend on the order of `outputs`: chunks are ordered by index before their
/// periodograms are concatenated and stably sorted by period. The best model comes from the chunk
/// with the greatest defined power, the lowest chunk index wins ties. Missing chunks are allowed
/// and reported, but at least one chunk must have defined power.
pub fn merge_chunks<T>(
    outputs: impl IntoIterator<Item = ChunkOutput<T>>,
    total_chunks: usize,
) -> Result<MergedResult<T>, MergeError>
where
    T: Float,
{
    let mut outputs: Vec<_> = outputs.into_iter().collect();
    if outputs.is_empty() {
        return Err(MergeError::NothingToMerge);
    }
    if let Some(foreign) = outputs.iter().find(|o| o.chunk.total() != total_chunks) {
        return Err(MergeError::ForeignChunk {
            index: foreign.chunk.index(),
            total: foreign.chunk.total(),
            expected: total_chunks,
        });
    }
    outputs.sort_by_key(|o| o.chunk.index());
    if let Some((a, _)) = outputs
        .iter()
        .tuple_windows()
        .find(|(a, b)| a.chunk.index() == b.chunk.index())
    {
        return Err(MergeError::DuplicateChunk {
            index: a.chunk.index(),
        });
    }

    let missing_chunks: Vec<_> = {
        let mut present = outputs.iter().map(|o| o.chunk.index()).peekable();
        (0..total_chunks)
            .filter(|&index| present.next_if_eq(&index).is_none())
            .collect()
    };
    if !missing_chunks.is_empty() {
        warn!(
            "merge_chunks: {} of {total_chunks} chunks are missing: {missing_chunks:?}",
            missing_chunks.len()
        );
    }

    let mut excluded_chunks = vec![];
    let mut best: Option<(T, usize)> = None;
    for (position, output) in outputs.iter().enumerate() {
        let index = output.chunk.index();
        match (output.result.periodogram.argmax(), &output.result.best) {
            (Some((_, max)), Some(_)) => {
                if best.is_none_or(|(best_max, _)| max > best_max) {
                    best = Some((max, position));
                }
            }
            (Some(_), None) => {
                warn!("merge_chunks: chunk {index} has defined power but no best model, excluded");
                excluded_chunks.push(index);
            }
            (None, _) => {
                if output.result.periodogram.is_empty() {
                    warn!("merge_chunks: chunk {index} has no periods");
                } else {
                    warn!("merge_chunks: chunk {index} has no defined power, excluded");
                }
                excluded_chunks.push(index);
            }
        }
    }
    let (best_max, best_position) = best.ok_or(MergeError::NoFinitePower)?;

    let periodogram = concatenate_sorted(outputs.iter().map(|o| &o.result.periodogram));
    info!(
        "merge_chunks: {} periods from {} of {total_chunks} chunks, best power {best_max} in chunk {}",
        periodogram.len(),
        outputs.len(),
        outputs[best_position].chunk.index(),
    );

    let best_output = outputs.swap_remove(best_position);
    Ok(MergedResult {
        periodogram,
        best: best_output
            .result
            .best
            .ok_or(MergeError::NoFinitePower)?,
        best_chunk: best_output.chunk,
        missing_chunks,
        excluded_chunks,
    })
}

/// Concatenate periodograms and stably sort them by period
fn concatenate_sorted<'a, T>(periodograms: impl Iterator<Item = &'a Periodogram<T>>) -> Periodogram<T>
where
    T: Float,
{
    let (periods, power): (Vec<_>, Vec<_>) = periodograms
        .flat_map(|p| p.periods.iter().copied().zip(p.power.iter().copied()))
        .sorted_by(|(a, _), (b, _)| a.total_cmp(b))
        .unzip();
    Periodogram {
        periods: Array1::from(periods),
        power: Array1::from(power),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::TimeSeries;
    use crate::search::{BestModel, BestParams, Pbls, SearchConfig};
    use crate::transit::TrialParameters;

    use light_curve_pbls_test_util::{BoxTransit, SyntheticLightCurve};
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;

    fn output(chunk: Chunk, periods: &[f64], power: &[f64]) -> ChunkOutput<f64> {
        let periodogram = Periodogram {
            periods: Array1::from(periods.to_vec()),
            power: Array1::from(power.to_vec()),
        };
        let best = periodogram.argmax().map(|(i, snr)| {
            let params = BestParams {
                period: periods[i],
                duration_hr: 2.0,
                epoch: 0.5,
                depth: 1e-3,
                snr,
            };
            BestFit {
                params,
                ephemeris: TrialParameters::new(periods[i], 2.0, 0.5).ephemeris(0.0),
                model: BestModel {
                    time: Array1::zeros(0),
                    flux: Array1::zeros(0),
                    model_flux: Array1::zeros(0),
                    flux_resid: Array1::zeros(0),
                    all_in_transit_flux: Array1::zeros(0),
                    all_out_transit_flux: Array1::zeros(0),
                },
            }
        });
        ChunkOutput {
            chunk,
            result: SearchResult { periodogram, best },
        }
    }

    fn split(periods: &[f64], power: &[f64], total: usize) -> Vec<ChunkOutput<f64>> {
        Chunk::all(total)
            .unwrap()
            .map(|chunk| output(chunk, chunk.slice(periods), chunk.slice(power)))
            .collect()
    }

    #[test]
    fn full_grid_is_restored() {
        let periods: Vec<_> = (0..10).map(|i| 1.0 + 0.1 * i as f64).collect();
        let power = [1.0, 2.0, 9.0, 3.0, 1.0, 9.0, 0.0, 1.0, 2.0, 3.0];
        let merged = merge_chunks(split(&periods, &power, 3), 3).unwrap();
        assert_eq!(merged.periodogram.periods.to_vec(), periods);
        assert_eq!(merged.periodogram.power.to_vec(), power);
        // Tie between chunks 0 and 1
        assert_eq!(merged.best_chunk.index(), 0);
        assert_eq!(merged.best.params.period, periods[2]);
        assert!(merged.is_complete());
        assert!(merged.excluded_chunks.is_empty());
    }

    #[test]
    fn missing_and_excluded() {
        let periods: Vec<_> = (0..9).map(|i| 1.0 + 0.1 * i as f64).collect();
        let inf = f64::NEG_INFINITY;
        let power = [inf, inf, inf, 1.0, 5.0, 2.0, 7.0, 8.0, 9.0];
        let mut outputs = split(&periods, &power, 3);
        outputs.pop();
        let merged = merge_chunks(outputs, 3).unwrap();
        assert_eq!(merged.missing_chunks, vec![2]);
        assert_eq!(merged.excluded_chunks, vec![0]);
        assert_eq!(merged.best_chunk.index(), 1);
        assert_eq!(merged.best.params.snr, 5.0);
        assert_eq!(merged.periodogram.len(), 6);
        assert!(!merged.is_complete());
    }

    #[test]
    fn failures() {
        let periods = [1.0, 2.0];
        let inf = f64::NEG_INFINITY;
        assert_eq!(
            merge_chunks(Vec::<ChunkOutput<f64>>::new(), 2),
            Err(MergeError::NothingToMerge)
        );
        assert_eq!(
            merge_chunks(split(&periods, &[inf, inf], 2), 2),
            Err(MergeError::NoFinitePower)
        );
        assert_eq!(
            merge_chunks(split(&periods, &[1.0, 2.0], 2), 3),
            Err(MergeError::ForeignChunk {
                index: 0,
                total: 2,
                expected: 3
            })
        );
        let mut outputs = split(&periods, &[1.0, 2.0], 2);
        outputs.push(outputs[1].clone());
        assert_eq!(
            merge_chunks(outputs, 2),
            Err(MergeError::DuplicateChunk { index: 1 })
        );
    }

    #[test]
    fn json_handoff() {
        let periods = [1.0, 2.0, 3.0];
        let outputs = split(&periods, &[f64::NEG_INFINITY, 2.0, 1.0], 2);
        let restored: Vec<ChunkOutput<f64>> = outputs
            .iter()
            .map(|o| serde_json::from_str(&serde_json::to_string(o).unwrap()).unwrap())
            .collect();
        assert_eq!(restored, outputs);
        assert_eq!(merge_chunks(restored, 2), merge_chunks(outputs, 2));
    }

    #[test]
    fn infinite_power_wins() {
        let periods = [1.0, 2.0, 3.0, 4.0];
        let merged =
            merge_chunks(split(&periods, &[5.0, 7.0, f64::INFINITY, 1.0], 2), 2).unwrap();
        assert_eq!(merged.best_chunk.index(), 1);
        assert_eq!(merged.best.params.snr, f64::INFINITY);
        assert_eq!(merged.periodogram.power[2], f64::INFINITY);
    }

    #[test]
    fn nan_periods_sort_deterministically() {
        let periods = [2.0, f64::NAN, 1.0, 3.0];
        let power = [1.0, 2.0, 3.0, 4.0];
        let outputs = split(&periods, &power, 2);
        let mut reversed = outputs.clone();
        reversed.reverse();
        let merged = merge_chunks(outputs, 2).unwrap();
        let reversed = merge_chunks(reversed, 2).unwrap();

        let bits = |merged: &MergedResult<f64>| -> Vec<_> {
            merged.periodogram.periods.iter().map(|p| p.to_bits()).collect()
        };
        assert_eq!(bits(&merged), bits(&reversed));
        assert_eq!(merged.periodogram.power, reversed.periodogram.power);
        let finite: Vec<_> = merged
            .periodogram
            .periods
            .iter()
            .copied()
            .filter(|p| !p.is_nan())
            .collect();
        assert_eq!(finite, vec![1.0, 2.0, 3.0]);
        assert_eq!(merged.best.params.snr, 4.0);
    }

    #[test]
    fn chunked_search_matches_full_search() {
        let lc = SyntheticLightCurve::uniform(2000, 0.01)
            .with_transit(BoxTransit {
                period: 2.0,
                duration_hr: 2.16,
                epoch: 0.4,
                depth: 0.02,
            })
            .with_noise(1e-4, 42);
        let (t, flux) = lc.arrays();
        let ts = TimeSeries::try_new(&t, &flux).unwrap();
        let periods: Vec<_> = (0..23).map(|i| 1.5 + 0.05 * i as f64).collect();
        let pbls = Pbls::new(
            SearchConfig::default()
                .with_durations_hr(vec![1.0, 2.0, 3.0])
                .with_epoch_steps(20),
        )
        .unwrap();

        let full = pbls.search(&ts, &periods).unwrap();
        let mut outputs: Vec<_> = Chunk::all(5)
            .unwrap()
            .map(|chunk| chunk.run(&pbls, &ts, &periods).unwrap())
            .collect();
        outputs.reverse();
        let merged = merge_chunks(outputs, 5).unwrap();
        assert_eq!(merged.periodogram, full.periodogram);
        assert_eq!(Some(merged.best), full.best);
    }

    proptest! {
        #[test]
        fn submission_order_independent(
            power in prop::collection::vec(-10.0..10.0_f64, 0..100),
            total in 1usize..20,
            seed in any::<u64>(),
        ) {
            let periods: Vec<_> = (0..power.len()).map(|i| 2.0 + 0.25 * i as f64).collect();
            let ordered = split(&periods, &power, total);
            let mut shuffled = ordered.clone();
            shuffled.shuffle(&mut StdRng::seed_from_u64(seed));

            let expected = merge_chunks(ordered, total);
            let actual = merge_chunks(shuffled, total);
            prop_assert_eq!(&actual, &expected);
            if let Ok(merged) = actual {
                prop_assert_eq!(merged.periodogram.periods.to_vec(), periods);
                prop_assert_eq!(merged.periodogram.power.to_vec(), power);
            } else {
                prop_assert!(power.is_empty());
            }
        }
    }
}
