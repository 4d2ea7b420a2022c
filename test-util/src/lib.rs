use light_curve_pbls::{TransitEphemeris, inject_box_transit};
use rand::prelude::*;
use rand_distr::Normal;
use std::f64::consts::PI;

/// Periodic box transit, `epoch` is a mid-transit time in days
#[derive(Clone, Copy, Debug)]
pub struct BoxTransit {
    pub period: f64,
    pub duration_hr: f64,
    pub epoch: f64,
    pub depth: f64,
}

/// Two-harmonic rotational modulation:
/// $a_1 \sin(2\pi t / P) + a_2 \sin(4\pi t / P + \phi_2)$
#[derive(Clone, Copy, Debug)]
pub struct Rotation {
    pub period: f64,
    pub amplitude: f64,
    pub second_amplitude: f64,
    pub second_phase: f64,
}

impl Rotation {
    fn eval(&self, t: f64) -> f64 {
        let phase = 2.0 * PI * t / self.period;
        self.amplitude * f64::sin(phase)
            + self.second_amplitude * f64::sin(2.0 * phase + self.second_phase)
    }
}

/// Normalised light curve: $(1 + \mathrm{rotation}) \times \mathrm{transits} + \mathrm{noise}$
#[derive(Clone, Debug)]
pub struct SyntheticLightCurve {
    t: Vec<f64>,
    transits: Vec<BoxTransit>,
    rotation: Option<Rotation>,
    noise: Option<(f64, u64)>,
}

impl SyntheticLightCurve {
    pub fn new(t: Vec<f64>) -> Self {
        Self {
            t,
            transits: vec![],
            rotation: None,
            noise: None,
        }
    }

    /// `n` observations with `cadence` starting at zero
    pub fn uniform(n: usize, cadence: f64) -> Self {
        Self::new((0..n).map(|i| cadence * i as f64).collect())
    }

    pub fn with_transit(mut self, transit: BoxTransit) -> Self {
        self.transits.push(transit);
        self
    }

    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = Some(rotation);
        self
    }

    /// Gaussian noise of `sigma` from a generator seeded with `seed`, zero `sigma` adds nothing
    pub fn with_noise(mut self, sigma: f64, seed: u64) -> Self {
        self.noise = (sigma > 0.0).then_some((sigma, seed));
        self
    }

    pub fn t(&self) -> &[f64] {
        &self.t
    }

    pub fn flux(&self) -> Vec<f64> {
        let mut flux = vec![1.0; self.t.len()];
        for transit in &self.transits {
            let ephemeris =
                TransitEphemeris::from_hours(transit.period, transit.duration_hr, transit.epoch)
                    .expect("transit parameters must be valid");
            flux = inject_box_transit(&self.t, &flux, &ephemeris, transit.depth)
                .expect("transit depth must be valid")
                .to_vec();
        }
        if let Some(rotation) = &self.rotation {
            for (f, &t) in flux.iter_mut().zip(&self.t) {
                *f *= 1.0 + rotation.eval(t);
            }
        }
        if let Some((sigma, seed)) = self.noise {
            let mut rng = StdRng::seed_from_u64(seed);
            let normal = Normal::new(0.0, sigma).expect("sigma must be positive");
            for f in flux.iter_mut() {
                *f += normal.sample(&mut rng);
            }
        }
        flux
    }

    /// Time and flux arrays
    pub fn arrays(&self) -> (Vec<f64>, Vec<f64>) {
        (self.t.clone(), self.flux())
    }
}
