//! Local polynomial trend of a transit window

use crate::data::median_of_sorted;
use crate::error::FitError;
use crate::float_trait::Float;
use crate::window::TransitWindow;

use ndarray::{Array1, Array2};

/// Polynomial in $t - t_\mathrm{ref}$, coefficients are ordered from the constant term up
#[derive(Clone, Debug, PartialEq)]
pub struct PolynomialModel<T> {
    coefficients: Array1<T>,
    t_ref: T,
}

impl<T> PolynomialModel<T>
where
    T: Float,
{
    /// Ridge-regularised least squares fit to the out-of-transit part of the window
    ///
    /// Time origin is the median out-of-transit time. The normal equations
    /// $(V^T V + \varepsilon I) c = V^T f$ of the Vandermonde matrix $V$ are solved with the
    /// Cholesky decomposition.
    pub fn fit_window(
        t: &[T],
        flux: &[T],
        window: &TransitWindow,
        order: usize,
        ridge: T,
    ) -> Result<Self, FitError> {
        let n_out = window.out_of_transit_len();
        if n_out < order.saturating_add(1) {
            return Err(FitError::TooFewPoints {
                actual: n_out,
                order,
            });
        }
        // Out-of-transit times are sorted, the median is a middle element of both ranges joined
        let [before, after] = window.out_of_transit();
        let t_ref = {
            let t_before = &t[before];
            let t_after = &t[after];
            let at = |i: usize| {
                if i < t_before.len() {
                    t_before[i]
                } else {
                    t_after[i - t_before.len()]
                }
            };
            let i = (n_out - 1) / 2;
            if n_out % 2 == 0 {
                T::half() * (at(i) + at(i + 1))
            } else {
                at(i)
            }
        };
        let points = window.out_of_transit_indices().map(|i| (t[i], flux[i]));
        Self::fit_points(points, t_ref, order, ridge)
    }

    /// Fit arbitrary points, time origin is the median of given times which must be sorted
    pub fn fit_sorted(t: &[T], flux: &[T], order: usize, ridge: T) -> Result<Self, FitError> {
        if t.len() < order.saturating_add(1) {
            return Err(FitError::TooFewPoints {
                actual: t.len(),
                order,
            });
        }
        let t_ref = median_of_sorted(t);
        Self::fit_points(t.iter().copied().zip(flux.iter().copied()), t_ref, order, ridge)
    }

    fn fit_points(
        points: impl Iterator<Item = (T, T)>,
        t_ref: T,
        order: usize,
        ridge: T,
    ) -> Result<Self, FitError> {
        let size = order + 1;
        let mut normal = Array2::<T>::zeros((size, size));
        let mut rhs = Array1::<T>::zeros(size);
        let mut powers = Array1::<T>::zeros(size);
        for (t, f) in points {
            let x = t - t_ref;
            let mut p = T::one();
            for power in powers.iter_mut() {
                *power = p;
                p *= x;
            }
            for i in 0..size {
                rhs[i] += powers[i] * f;
                for j in 0..=i {
                    normal[(i, j)] += powers[i] * powers[j];
                }
            }
        }
        for i in 0..size {
            normal[(i, i)] += ridge;
        }

        let coefficients = cholesky_solve(normal, rhs)?;
        if coefficients.iter().any(|c| !c.is_finite()) {
            return Err(FitError::NonFiniteSolution);
        }
        Ok(Self {
            coefficients,
            t_ref,
        })
    }

    pub fn coefficients(&self) -> &Array1<T> {
        &self.coefficients
    }

    pub fn t_ref(&self) -> T {
        self.t_ref
    }

    pub fn order(&self) -> usize {
        self.coefficients.len() - 1
    }

    /// Horner evaluation
    pub fn eval(&self, t: T) -> T {
        let x = t - self.t_ref;
        self.coefficients
            .iter()
            .rev()
            .fold(T::zero(), |acc, &c| acc * x + c)
    }
}

/// Solve symmetric positive definite system, only the lower triangle of `a` is used
fn cholesky_solve<T: Float>(mut a: Array2<T>, mut b: Array1<T>) -> Result<Array1<T>, FitError> {
    let n = b.len();
    // In-place decomposition A = L L^T
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[(i, j)];
            for k in 0..j {
                sum -= a[(i, k)] * a[(j, k)];
            }
            if i == j {
                // Also catches NaN
                if !(sum > T::zero()) {
                    return Err(FitError::NotPositiveDefinite);
                }
                a[(i, i)] = sum.sqrt();
            } else {
                a[(i, j)] = sum / a[(j, j)];
            }
        }
    }
    // L y = b
    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum -= a[(i, j)] * b[j];
        }
        b[i] = sum / a[(i, i)];
    }
    // L^T x = y
    for i in (0..n).rev() {
        let mut sum = b[i];
        for j in (i + 1)..n {
            sum -= a[(j, i)] * b[j];
        }
        b[i] = sum / a[(i, i)];
    }
    Ok(b)
}

/// Detrended transit window: polynomial model evaluated over the whole local window
#[derive(Clone, Debug)]
pub struct DetrendedWindow<T> {
    pub window: TransitWindow,
    pub model: Vec<T>,
}

impl<T> DetrendedWindow<T>
where
    T: Float,
{
    pub fn new(
        t: &[T],
        flux: &[T],
        window: TransitWindow,
        order: usize,
        ridge: T,
    ) -> Result<Self, FitError> {
        let polynomial = PolynomialModel::fit_window(t, flux, &window, order, ridge)?;
        let model = t[window.local.clone()]
            .iter()
            .map(|&t| polynomial.eval(t))
            .collect();
        Ok(Self { window, model })
    }

    /// Residual flux of the in-transit points
    pub fn in_transit_residuals<'a>(&'a self, flux: &'a [T]) -> impl Iterator<Item = T> + 'a {
        let offset = self.window.local.start;
        self.window
            .in_transit
            .clone()
            .map(move |i| flux[i] - self.model[i - offset])
    }

    /// Residual flux of the out-of-transit points
    pub fn out_of_transit_residuals<'a>(&'a self, flux: &'a [T]) -> impl Iterator<Item = T> + 'a {
        let offset = self.window.local.start;
        self.window
            .out_of_transit_indices()
            .map(move |i| flux[i] - self.model[i - offset])
    }
}

#[cfg(test)]
#[allow(clippy::unreadable_literal)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use light_curve_common::linspace;

    #[test]
    fn exact_cubic() {
        let t = linspace(100.0_f64, 101.0, 50);
        let f: Vec<_> = t
            .iter()
            .map(|&t| {
                let x = t - 100.3;
                1.0 + 0.5 * x - 0.25 * x * x + 0.125 * x * x * x
            })
            .collect();
        let model = PolynomialModel::fit_sorted(&t, &f, 3, 0.0).unwrap();
        for (&t, &f) in t.iter().zip(&f) {
            assert_relative_eq!(model.eval(t), f, max_relative = 1e-9);
        }
        assert_eq!(model.order(), 3);
    }

    #[test]
    fn ridge_keeps_constant_fit() {
        let t = linspace(0.0_f64, 0.5, 40);
        let f = vec![1.0; 40];
        let model = PolynomialModel::fit_sorted(&t, &f, 2, f64::ridge()).unwrap();
        assert_relative_eq!(model.eval(0.25), 1.0, max_relative = 1e-7);
        assert_relative_eq!(model.coefficients()[0], 1.0, max_relative = 1e-7);
    }

    #[test]
    fn ridge_regularises_degenerate_design() {
        // All points share the same time, the design matrix has rank one
        let t = [5.0_f64; 4];
        let f = [1.0, 1.1, 0.9, 1.0];
        assert_eq!(
            PolynomialModel::fit_sorted(&t, &f, 2, 0.0),
            Err(FitError::NotPositiveDefinite)
        );
        let model = PolynomialModel::fit_sorted(&t, &f, 2, 1e-8).unwrap();
        assert_relative_eq!(model.eval(5.0), 1.0, max_relative = 1e-6);
    }

    #[test]
    fn underflowing_design_is_singular() {
        let t: Vec<_> = (0..10).map(|i| 1e-170 * i as f64).collect();
        let f = vec![1.0_f64; 10];
        assert_eq!(
            PolynomialModel::fit_sorted(&t, &f, 1, 0.0),
            Err(FitError::NotPositiveDefinite)
        );
        assert!(PolynomialModel::fit_sorted(&t, &f, 1, 1e-8).is_ok());
    }

    #[test]
    fn too_few_points() {
        let t = [0.0_f64, 1.0];
        let f = [1.0_f64, 1.0];
        assert_eq!(
            PolynomialModel::fit_sorted(&t, &f, 2, 1e-8),
            Err(FitError::TooFewPoints {
                actual: 2,
                order: 2
            })
        );
        assert_eq!(
            PolynomialModel::fit_sorted(&t, &f, usize::MAX, 1e-8),
            Err(FitError::TooFewPoints {
                actual: 2,
                order: usize::MAX
            })
        );
    }

    #[test]
    fn window_fit_ignores_transit() {
        let t = linspace(0.0_f64, 1.0, 101);
        let f: Vec<_> = t
            .iter()
            .map(|&t| {
                let trend = 1.0 + 0.01 * t - 0.02 * t * t;
                if (t - 0.5).abs() <= 0.05 + 1e-9 {
                    trend - 0.1
                } else {
                    trend
                }
            })
            .collect();
        let window = TransitWindow {
            local: 20..81,
            in_transit: 45..56,
        };
        let model = PolynomialModel::fit_window(&t, &f, &window, 2, 1e-8).unwrap();
        // Median of 20..45 and 56..81 joined
        assert_relative_eq!(model.t_ref(), 0.5 * (t[44] + t[56]), max_relative = 1e-12);

        let detrended = DetrendedWindow::new(&t, &f, window, 2, 1e-8).unwrap();
        for r in detrended.out_of_transit_residuals(&f) {
            assert!(r.abs() < 1e-6);
        }
        for r in detrended.in_transit_residuals(&f) {
            assert_relative_eq!(r, -0.1, epsilon = 1e-6);
        }
    }
}
