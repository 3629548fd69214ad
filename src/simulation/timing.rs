//! Launch timing
//!
//! Inter-arrival intervals between launches. `lambda` is the launch rate
//! divided by the speed limit; every family has mean `1 / lambda`.

use clap::ValueEnum;
use rand::Rng;
use rand_distr::{Distribution, Exp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LaunchTiming {
    /// Exponential gaps (a Poisson arrival process)
    #[default]
    Poisson,
    /// Gaps uniform on `[0, 2 / lambda)`
    Uniform,
    /// Constant gaps of `1 / lambda`. Cars still launch only on whole ticks.
    Periodic,
}

impl LaunchTiming {
    /// Draw the interval until the next launch
    pub fn sample<R: Rng + ?Sized>(&self, lambda: f64, rng: &mut R) -> f64 {
        match self {
            LaunchTiming::Poisson => Exp::new(lambda)
                .map(|exp| exp.sample(rng))
                .unwrap_or(f64::INFINITY),
            LaunchTiming::Uniform => rng.random::<f64>() * 2.0 / lambda,
            LaunchTiming::Periodic => 1.0 / lambda,
        }
    }
}
