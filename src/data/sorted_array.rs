use crate::float_trait::Float;

use ndarray::Array1;
use std::ops::Deref;

// Underlying array is guaranteed to be sorted and contiguous
#[derive(Clone, Debug, PartialEq)]
pub struct SortedArray<T>(Array1<T>);

impl<T> SortedArray<T>
where
    T: Float,
{
    pub fn median(&self) -> T {
        median_of_sorted(self)
    }
}

/// Median of an already sorted non-empty slice
pub(crate) fn median_of_sorted<T: Float>(a: &[T]) -> T {
    assert_ne!(a.len(), 0);
    let i = (a.len() - 1) / 2;
    if a.len() % 2 == 0 {
        T::half() * (a[i] + a[i + 1])
    } else {
        a[i]
    }
}

impl<T> From<Vec<T>> for SortedArray<T>
where
    T: Float,
{
    fn from(mut v: Vec<T>) -> Self {
        v[..].sort_unstable_by(|a, b| a.total_cmp(b));
        Self(Array1::from_vec(v))
    }
}

impl<T> Deref for SortedArray<T> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        self.0.as_slice().unwrap()
    }
}
