//! Likelihood evaluation for a Mogi point pressure source in an elastic
//! half space, driven by an external Bayesian Monte-Carlo sampler.
//!
//! The crate implements one model of a larger inference problem: it owns a
//! contiguous column range of the sampler's shared sample matrix, and for
//! every candidate sample it evaluates the analytic surface displacement
//! field of a point pressure source, compares it against observed
//! displacements and reports a data log-likelihood. Prior likelihoods and
//! validity checks are delegated to the configured parameter sets.
//!
//! ```no_run
//! use faer::Mat;
//! use mogi_rs::{ModelConfig, UniformPrior};
//! use rand::rngs::SmallRng;
//! use rand::SeedableRng;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = ModelConfig {
//!     psets: vec![
//!         ("location".to_string(), Box::new(UniformPrior::new(2, -10.0, 10.0)) as _),
//!         ("depth".to_string(), Box::new(UniformPrior::new(1, 1.0, 10.0)) as _),
//!         ("source".to_string(), Box::new(UniformPrior::new(1, -1.0, 2.0)) as _),
//!     ],
//!     observations: 363,
//!     case: "synthetic".into(),
//!     ..ModelConfig::default()
//! };
//! let model = config.initialize(0)?;
//!
//! let samples = 1024;
//! let mut theta = Mat::zeros(samples, model.parameters());
//! let mut rng = SmallRng::seed_from_u64(42);
//! model.initialize_sample(&mut rng, theta.as_mut());
//!
//! let mut prior = vec![0f64; samples];
//! let mut data = vec![0f64; samples];
//! let mut mask = vec![0u8; samples];
//! model.prior_likelihood(theta.as_ref(), &mut prior);
//! model.data_likelihood(theta.as_ref(), &mut data)?;
//! model.verify(theta.as_ref(), &mut mask);
//! # Ok(())
//! # }
//! ```

pub(crate) mod inputs;
pub(crate) mod layout;
pub(crate) mod model;
pub(crate) mod norm;
pub(crate) mod params;
pub(crate) mod source;

pub use inputs::{Inputs, Station};
pub use layout::{Layout, SetLayout};
pub use model::{normalization, BayesianModel, Model, ModelConfig, ModelError};
pub use norm::{Norm, L1, L2, LInf};
pub use params::{GaussianPrior, ParameterSet, UniformPrior};
pub use source::{DisplacementSource, Mogi, SourceError};
