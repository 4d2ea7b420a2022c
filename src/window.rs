//! Candidate transit windows of a single search trial

use crate::float_trait::Float;
use crate::transit::TrialParameters;

use std::ops::Range;

/// Half-width of the detrending window in units of transit duration
const WINDOW_HALF_WIDTH: f64 = 3.0;

/// Observations around one transit event
///
/// Time is sorted, so both the local window $|t - T_c| \le 3 T_\mathrm{dur}$ and the in-transit
/// part $|t - T_c| \le T_\mathrm{dur} / 2$ are contiguous index ranges of the whole series. The
/// out-of-transit part is the rest of the local window: one range before and one after the
/// transit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransitWindow {
    pub local: Range<usize>,
    pub in_transit: Range<usize>,
}

impl TransitWindow {
    pub fn local_len(&self) -> usize {
        self.local.len()
    }

    pub fn in_transit_len(&self) -> usize {
        self.in_transit.len()
    }

    pub fn out_of_transit_len(&self) -> usize {
        self.local_len() - self.in_transit_len()
    }

    /// Out-of-transit ranges, before and after the transit
    pub fn out_of_transit(&self) -> [Range<usize>; 2] {
        [
            self.local.start..self.in_transit.start,
            self.in_transit.end..self.local.end,
        ]
    }

    pub fn out_of_transit_indices(&self) -> impl Iterator<Item = usize> {
        let [before, after] = self.out_of_transit();
        before.chain(after)
    }

    /// "Good transit" rule: enough points to fit polynomial of the given order
    pub fn is_good(&self, poly_order: usize) -> bool {
        let min_points = poly_order.saturating_add(1);
        self.local_len() >= min_points && self.out_of_transit_len() >= min_points
    }
}

/// Iterator over all candidate transit windows of a trial, including ones which aren't good
///
/// Transit index $n$ runs from $\lceil (t_\mathrm{min} - T_0) / P \rceil$ to
/// $\lfloor (t_\mathrm{max} - T_0) / P \rfloor$ where $T_0$ is the reference transit start, and
/// the $n$-th transit is centered at $T_0 + n P + T_\mathrm{dur} / 2$.
pub struct CandidateWindows<'a, T> {
    t: &'a [T],
    period: T,
    duration: T,
    half_width: T,
    first_center: T,
    n: T,
    n_max: T,
}

impl<'a, T> CandidateWindows<'a, T>
where
    T: Float,
{
    pub fn new(t: &'a [T], trial: &TrialParameters<T>) -> Self {
        let duration = trial.duration_days();
        let (n, n_max, first_center) = match (t.first(), t.last()) {
            (Some(&t_min), Some(&t_max)) => {
                let t0 = trial.reference_start(t_min);
                (
                    ((t_min - t0) / trial.period).ceil(),
                    ((t_max - t0) / trial.period).floor(),
                    t0 + T::half() * duration,
                )
            }
            _ => (T::one(), T::zero(), T::zero()),
        };
        Self {
            t,
            period: trial.period,
            duration,
            half_width: T::from_f64(WINDOW_HALF_WIDTH) * duration,
            first_center,
            n,
            n_max,
        }
    }

    fn index_range(&self, lower: T, upper: T) -> Range<usize> {
        let start = self.t.partition_point(|&x| x < lower);
        let end = self.t.partition_point(|&x| x <= upper);
        start..end.max(start)
    }
}

impl<T> Iterator for CandidateWindows<'_, T>
where
    T: Float,
{
    type Item = TransitWindow;

    fn next(&mut self) -> Option<Self::Item> {
        // Also stops on NaN bounds
        if !(self.n <= self.n_max) {
            return None;
        }
        let center = self.first_center + self.n * self.period;
        self.n += T::one();

        let half_duration = T::half() * self.duration;
        Some(TransitWindow {
            local: self.index_range(center - self.half_width, center + self.half_width),
            in_transit: self.index_range(center - half_duration, center + half_duration),
        })
    }
}

/// Good transit windows of the trial
pub fn locate_windows<'a, T>(
    t: &'a [T],
    trial: TrialParameters<T>,
    poly_order: usize,
) -> impl Iterator<Item = TransitWindow> + 'a
where
    T: Float,
{
    CandidateWindows::new(t, &trial).filter(move |window| window.is_good(poly_order))
}
