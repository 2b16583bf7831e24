//! Parameter-set contract and the priors shipped with the crate.
//!
//! A parameter set is a named group of related sampled parameters. The model
//! owns an ordered collection of sets and delegates sample initialization,
//! prior likelihoods and validity checks to them. Each set only ever sees the
//! column block of the sample matrix that holds its own parameters; offsets
//! live in the compiled [`Layout`](crate::Layout), not in the sets.

use std::f64::consts::PI;

use faer::{MatMut, MatRef};
use rand::{Rng, RngCore};
use rand_distr::StandardNormal;

/// A named group of sampled parameters.
///
/// `block` is always the sub-matrix of the shared sample matrix holding
/// exactly this set's parameters: rows are samples, columns are the set's
/// parameters in declaration order.
pub trait ParameterSet: Send + Sync + std::fmt::Debug {
    /// Number of parameters in this set.
    fn count(&self) -> usize;

    /// Draw initial values for every sample row from the prior.
    fn initialize_sample(&self, rng: &mut dyn RngCore, block: MatMut<'_, f64>);

    /// Accumulate this set's prior log-likelihood into `prior`, one entry per
    /// sample row. Contributions are additive across sets; the vector is
    /// zeroed by the host, not here.
    fn prior_likelihood(&self, block: MatRef<'_, f64>, prior: &mut [f64]);

    /// Flag samples that violate this set's constraints by setting their
    /// `mask` entry non-zero. Entries set by other sets must never be
    /// cleared.
    fn verify(&self, block: MatRef<'_, f64>, mask: &mut [u8]);
}

/// Parameters distributed uniformly over a common support interval.
///
/// Samples with any parameter outside the support are flagged invalid by
/// `verify`; the prior density is constant inside it.
#[derive(Clone, Debug)]
pub struct UniformPrior {
    count: usize,
    low: f64,
    high: f64,
}

impl UniformPrior {
    pub fn new(count: usize, low: f64, high: f64) -> Self {
        assert!(high > low, "empty uniform support [{low}, {high}]");
        Self { count, low, high }
    }

    pub fn support(&self) -> (f64, f64) {
        (self.low, self.high)
    }
}

impl ParameterSet for UniformPrior {
    fn count(&self) -> usize {
        self.count
    }

    fn initialize_sample(&self, rng: &mut dyn RngCore, mut block: MatMut<'_, f64>) {
        for k in 0..block.ncols() {
            for r in 0..block.nrows() {
                block[(r, k)] = rng.random_range(self.low..self.high);
            }
        }
    }

    fn prior_likelihood(&self, block: MatRef<'_, f64>, prior: &mut [f64]) {
        debug_assert!(block.nrows() == prior.len());
        let logp = -(self.count as f64) * (self.high - self.low).ln();
        for p in prior.iter_mut() {
            *p += logp;
        }
    }

    fn verify(&self, block: MatRef<'_, f64>, mask: &mut [u8]) {
        debug_assert!(block.nrows() == mask.len());
        for (r, flag) in mask.iter_mut().enumerate() {
            for k in 0..block.ncols() {
                let value = block[(r, k)];
                if value < self.low || value > self.high {
                    *flag = 1;
                }
            }
        }
    }
}

/// Parameters with independent Gaussian priors of a common mean and spread.
#[derive(Clone, Debug)]
pub struct GaussianPrior {
    count: usize,
    mean: f64,
    sigma: f64,
}

impl GaussianPrior {
    pub fn new(count: usize, mean: f64, sigma: f64) -> Self {
        assert!(sigma > 0.0, "non-positive standard deviation {sigma}");
        Self { count, mean, sigma }
    }
}

impl ParameterSet for GaussianPrior {
    fn count(&self) -> usize {
        self.count
    }

    fn initialize_sample(&self, rng: &mut dyn RngCore, mut block: MatMut<'_, f64>) {
        for k in 0..block.ncols() {
            for r in 0..block.nrows() {
                let z: f64 = rng.sample(StandardNormal);
                block[(r, k)] = self.mean + self.sigma * z;
            }
        }
    }

    fn prior_likelihood(&self, block: MatRef<'_, f64>, prior: &mut [f64]) {
        debug_assert!(block.nrows() == prior.len());
        let constant = -(self.sigma.ln() + (2.0 * PI).ln() / 2.0) * self.count as f64;
        for (r, p) in prior.iter_mut().enumerate() {
            let mut logp = constant;
            for k in 0..block.ncols() {
                let z = (block[(r, k)] - self.mean) / self.sigma;
                logp -= z * z / 2.0;
            }
            *p += logp;
        }
    }

    fn verify(&self, _block: MatRef<'_, f64>, _mask: &mut [u8]) {
        // the support is the whole real line
    }
}
