use conv::{ApproxInto, RoundToZero};
use ndarray::NdFloat;
use num_traits::FloatConst;
use num_traits::float::TotalOrder;
use schemars::JsonSchema;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::iter::Sum;

/// Floating-point type the search runs on, implemented for `f32` and `f64`
pub trait Float:
    NdFloat
    + FloatConst
    + TotalOrder
    + ApproxInto<usize, RoundToZero>
    + Sum<Self>
    + PartialOrd
    + Serialize
    + DeserializeOwned
    + JsonSchema
{
    fn half() -> Self;
    fn two() -> Self;
    fn three() -> Self;
    fn four() -> Self;
    fn hours_per_day() -> Self;
    fn seconds_per_day() -> Self;
    /// Default diagonal loading of the polynomial normal equations
    fn ridge() -> Self;
    fn from_usize(n: usize) -> Self;
    fn from_f64(x: f64) -> Self;
}

macro_rules! float_impl {
    ($t: ty) => {
        impl Float for $t {
            #[inline]
            fn half() -> Self {
                0.5
            }

            #[inline]
            fn two() -> Self {
                2.0
            }

            #[inline]
            fn three() -> Self {
                3.0
            }

            #[inline]
            fn four() -> Self {
                4.0
            }

            #[inline]
            fn hours_per_day() -> Self {
                24.0
            }

            #[inline]
            fn seconds_per_day() -> Self {
                86400.0
            }

            #[inline]
            fn ridge() -> Self {
                1e-8
            }

            #[inline]
            fn from_usize(n: usize) -> Self {
                n as $t
            }

            #[inline]
            fn from_f64(x: f64) -> Self {
                x as $t
            }
        }
    };
}

float_impl!(f32);
float_impl!(f64);
