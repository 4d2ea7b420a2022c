//! Depth and signal-to-noise ratio of pooled detrended flux

use crate::float_trait::Float;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Transit depth and its Welch-like signal-to-noise ratio
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(bound = "T: Float")]
pub struct TransitScore<T> {
    pub depth: T,
    /// $+\infty$ for a non-zero depth over noiseless residuals
    #[serde(with = "snr_serde::value")]
    #[schemars(with = "Option<T>")]
    pub snr: T,
}

/// Mean and population variance
fn mean_var<T: Float>(x: &[T]) -> (T, T) {
    let n = T::from_usize(x.len());
    let mean = x.iter().copied().sum::<T>() / n;
    let var = x.iter().map(|&x| (x - mean).powi(2)).sum::<T>() / n;
    (mean, var)
}

/// Score in-transit and out-of-transit residual pools
///
/// $$
/// \mathrm{depth} = \langle R_\mathrm{out} \rangle - \langle R_\mathrm{in} \rangle,\quad
/// \mathrm{SNR} = \frac{\mathrm{depth}}{\sqrt{\sigma^2_\mathrm{in}/N_\mathrm{in} + \sigma^2_\mathrm{out}/N_\mathrm{out}}}
/// $$
///
/// Returns `None` if either pool is empty or the ratio is undefined, i.e. zero depth over zero
/// noise. Non-zero depth over zero noise gives infinite SNR.
pub fn score<T: Float>(r_in: &[T], r_out: &[T]) -> Option<TransitScore<T>> {
    if r_in.is_empty() || r_out.is_empty() {
        return None;
    }
    let (mean_in, var_in) = mean_var(r_in);
    let (mean_out, var_out) = mean_var(r_out);
    let depth = mean_out - mean_in;
    let noise = (var_in / T::from_usize(r_in.len()) + var_out / T::from_usize(r_out.len())).sqrt();
    let snr = depth / noise;
    (!snr.is_nan()).then_some(TransitScore { depth, snr })
}

/// SNR values for formats without infinities such as JSON: $+\infty$ is written as `"inf"`,
/// $-\infty$ and NaN are written as null and read back as $-\infty$
pub(crate) mod snr_serde {
    use crate::float_trait::Float;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    enum Infinity {
        Inf,
    }

    #[derive(Serialize, Deserialize)]
    #[serde(untagged, bound = "T: Float")]
    enum Repr<T> {
        Value(T),
        Infinity(Infinity),
    }

    fn to_repr<T: Float>(x: T) -> Option<Repr<T>> {
        if x.is_finite() {
            Some(Repr::Value(x))
        } else if x == T::infinity() {
            Some(Repr::Infinity(Infinity::Inf))
        } else {
            None
        }
    }

    fn from_repr<T: Float>(repr: Option<Repr<T>>) -> T {
        match repr {
            Some(Repr::Value(x)) => x,
            Some(Repr::Infinity(Infinity::Inf)) => T::infinity(),
            None => T::neg_infinity(),
        }
    }

    pub mod value {
        use super::*;

        pub fn serialize<S, T>(x: &T, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
            T: Float,
        {
            to_repr(*x).serialize(serializer)
        }

        pub fn deserialize<'de, D, T>(deserializer: D) -> Result<T, D::Error>
        where
            D: Deserializer<'de>,
            T: Float,
        {
            Option::<Repr<T>>::deserialize(deserializer).map(from_repr)
        }
    }

    pub mod array {
        use super::*;

        use ndarray::Array1;

        pub fn serialize<S, T>(x: &Array1<T>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
            T: Float,
        {
            serializer.collect_seq(x.iter().map(|&x| to_repr(x)))
        }

        pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Array1<T>, D::Error>
        where
            D: Deserializer<'de>,
            T: Float,
        {
            let x: Vec<Option<Repr<T>>> = Vec::deserialize(deserializer)?;
            Ok(x.into_iter().map(from_repr).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn welch_statistic() {
        let r_in = [-1.0_f64, -3.0];
        let r_out = [0.0_f64, 1.0, -1.0, 0.0];
        let score = score(&r_in, &r_out).unwrap();
        assert_relative_eq!(score.depth, 2.0);
        // var_in = 1, var_out = 0.5
        assert_relative_eq!(score.snr, 2.0 / f64::sqrt(1.0 / 2.0 + 0.5 / 4.0));
    }

    #[test]
    fn negative_depth_is_allowed() {
        let score = score(&[1.0_f64, 1.2], &[0.0_f64, 0.1, -0.1]).unwrap();
        assert!(score.depth < 0.0);
        assert!(score.snr < 0.0);
    }

    #[test]
    fn empty_pool() {
        assert_eq!(score::<f64>(&[], &[1.0, 2.0]), None);
        assert_eq!(score::<f64>(&[1.0], &[]), None);
    }

    #[test]
    fn zero_noise_zero_depth_is_undefined() {
        assert_eq!(score(&[1.0_f64, 1.0], &[1.0_f64, 1.0, 1.0]), None);
        assert_eq!(score(&[1.0_f32], &[1.0_f32]), None);
    }

    #[test]
    fn zero_noise_with_depth_is_infinite() {
        let score = score(&[0.5_f64, 0.5], &[1.0_f64, 1.0]).unwrap();
        assert_eq!(score.depth, 0.5);
        assert_eq!(score.snr, f64::INFINITY);

        let inverted = super::score(&[1.0_f32], &[0.5_f32]).unwrap();
        assert_eq!(inverted.snr, f32::NEG_INFINITY);
    }

    #[test]
    fn json_keeps_infinite_snr() {
        let score = TransitScore {
            depth: 0.5_f64,
            snr: f64::INFINITY,
        };
        let json = serde_json::to_string(&score).unwrap();
        assert_eq!(json, r#"{"depth":0.5,"snr":"inf"}"#);
        let restored: TransitScore<f64> = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, score);
    }
}
