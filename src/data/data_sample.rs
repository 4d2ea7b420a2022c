use crate::data::SortedArray;
use crate::error::InputError;
use crate::float_trait::Float;
use crate::types::CowArray1;

use itertools::Itertools;
use ndarray::{Array1, ArrayView1};

/// A [`TimeSeries`](crate::TimeSeries) component, contiguous in memory
#[derive(Clone, Debug)]
pub struct DataSample<'a, T>
where
    T: Float,
{
    sample: CowArray1<'a, T>,
}

impl<'a, T> DataSample<'a, T>
where
    T: Float,
{
    pub fn new(sample: CowArray1<'a, T>) -> Self {
        let sample = if sample.is_standard_layout() {
            sample
        } else {
            sample.iter().copied().collect::<Array1<_>>().into()
        };
        Self { sample }
    }

    pub fn len(&self) -> usize {
        self.sample.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sample.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        // Layout is normalised by the constructor
        self.sample.as_slice().unwrap()
    }

    pub fn into_owned(self) -> DataSample<'static, T> {
        DataSample {
            sample: self.sample.into_owned().into(),
        }
    }

    /// Index of the first NaN or infinite value
    pub fn first_non_finite(&self) -> Option<usize> {
        self.as_slice().iter().position(|x| !x.is_finite())
    }

    /// Index of the first value which is not larger than its predecessor
    pub fn first_non_increasing(&self) -> Option<usize> {
        self.as_slice()
            .iter()
            .tuple_windows()
            .position(|(a, b)| b <= a)
            .map(|i| i + 1)
    }

    pub fn check_finite(&self, array: &'static str) -> Result<(), InputError> {
        match self.first_non_finite() {
            Some(index) => Err(InputError::NonFinite { array, index }),
            None => Ok(()),
        }
    }

    /// Median of the differences between consequent values, `None` for less than two values
    pub fn median_diff(&self) -> Option<T> {
        if self.len() < 2 {
            return None;
        }
        let diff: SortedArray<_> = self
            .as_slice()
            .iter()
            .tuple_windows()
            .map(|(&a, &b)| b - a)
            .collect::<Vec<_>>()
            .into();
        Some(diff.median())
    }
}

impl<'a, T, Slice: ?Sized> From<&'a Slice> for DataSample<'a, T>
where
    T: Float,
    Slice: AsRef<[T]>,
{
    fn from(s: &'a Slice) -> Self {
        ArrayView1::from(s).into()
    }
}

impl<T> From<Vec<T>> for DataSample<'_, T>
where
    T: Float,
{
    fn from(v: Vec<T>) -> Self {
        Array1::from(v).into()
    }
}

impl<'a, T> From<ArrayView1<'a, T>> for DataSample<'a, T>
where
    T: Float,
{
    fn from(a: ArrayView1<'a, T>) -> Self {
        Self::new(a.into())
    }
}

impl<T> From<Array1<T>> for DataSample<'_, T>
where
    T: Float,
{
    fn from(a: Array1<T>) -> Self {
        Self::new(a.into())
    }
}

impl<'a, T> From<CowArray1<'a, T>> for DataSample<'a, T>
where
    T: Float,
{
    fn from(a: CowArray1<'a, T>) -> Self {
        Self::new(a)
    }
}
