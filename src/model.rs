//! The Mogi model: per-sample likelihood evaluation for a point pressure
//! source in an elastic half space.
//!
//! The model plugs into an external Bayesian sampler that owns the sample
//! matrix, the likelihood vectors and the validity mask. Construction is two
//! phase: a [`ModelConfig`] carries the user-facing settings, and
//! [`ModelConfig::initialize`] compiles the parameter layout, loads the case
//! inputs and returns an immutable [`Model`] implementing the
//! [`BayesianModel`] protocol the sampler drives once per step.

use std::path::PathBuf;

use faer::reborrow::ReborrowMut;
use faer::{MatMut, MatRef};
use itertools::izip;
use rand::RngCore;
use rayon::prelude::*;
use thiserror::Error;

use crate::inputs::{self, Inputs, Station};
use crate::layout::Layout;
use crate::norm::{Norm, L2};
use crate::params::ParameterSet;
use crate::source::{DisplacementSource, Mogi};

/// Everything that can abort model initialization or an evaluation pass.
///
/// Initialization errors are fatal configuration problems: the process is
/// expected to report them once and exit before any sampling begins.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("missing required parameter set '{name}'")]
    MissingParameterSet { name: &'static str },
    #[error("parameter set 'location' must provide x and y, found {count} parameters")]
    NarrowLocation { count: usize },
    #[error("bad case name: '{}'", case.display())]
    CaseNotFound { case: PathBuf },
    #[error("missing station locations: no '{file}' in '{}'", case.display())]
    MissingStations { file: String, case: PathBuf },
    #[error("missing displacements: no '{file}' in '{}'", case.display())]
    MissingDisplacements { file: String, case: PathBuf },
    #[error("malformed station record at line {line} of '{file}'")]
    MalformedStations { file: String, line: usize },
    #[error("malformed displacement vector in '{file}'")]
    MalformedDisplacements { file: String },
    #[error("displacement vector in '{file}' has {actual} entries, expected {expected}")]
    ShapeMismatch {
        file: String,
        expected: usize,
        actual: usize,
    },
    #[error("expected 3 displacement components per station: {stations} stations vs {observations} observations")]
    ObservationCount {
        stations: usize,
        observations: usize,
    },
    #[error("could not read '{file}' in '{}'", case.display())]
    Io {
        file: String,
        case: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("forward model failed for sample {sample}")]
    Source {
        sample: usize,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// The protocol a sampler drives once per sampling step.
///
/// All methods take the full shared sample matrix; the model restricts it to
/// its own column range internally, so several models can share one matrix.
/// The likelihood vectors and the validity mask are owned by the sampler and
/// aligned with the matrix rows.
pub trait BayesianModel: Send + Sync {
    /// Number of parameters this model owns in the sample matrix.
    fn parameters(&self) -> usize;

    /// Fill this model's columns of `theta` with draws from the priors.
    fn initialize_sample(&self, rng: &mut dyn RngCore, theta: MatMut<'_, f64>);

    /// Accumulate the prior log-likelihood of every sample into `prior`.
    fn prior_likelihood(&self, theta: MatRef<'_, f64>, prior: &mut [f64]);

    /// Overwrite `data` with the data log-likelihood of every sample.
    fn data_likelihood(&self, theta: MatRef<'_, f64>, data: &mut [f64]) -> anyhow::Result<()>;

    /// Set `mask` entries non-zero for samples that violate the model
    /// constraints. Never clears entries set by others.
    fn verify(&self, theta: MatRef<'_, f64>, mask: &mut [u8]);
}

/// User-facing configuration of the model, normally assembled by the host's
/// config layer.
pub struct ModelConfig {
    /// The named parameter sets, in configuration order. The sets named
    /// "location", "depth" and "source" are required.
    pub psets: Vec<(String, Box<dyn ParameterSet>)>,
    /// Number of observed displacement components, three per station.
    pub observations: usize,
    /// The directory with the input files.
    pub case: PathBuf,
    /// The name of the file with the displacements.
    pub displacements: String,
    /// The name of the file with the locations of the observation points.
    pub stations: String,
    /// The Poisson ratio of the half space.
    pub nu: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            psets: Vec::new(),
            observations: 3 * (11 * 11),
            case: PathBuf::from("synthetic"),
            displacements: "displacements.txt".to_string(),
            stations: "stations.txt".to_string(),
            nu: 0.25,
        }
    }
}

impl ModelConfig {
    /// Initialize the model with the default Mogi source and Euclidean norm.
    ///
    /// `offset` is the first column of the shared sample matrix owned by
    /// this model.
    pub fn initialize(self, offset: usize) -> Result<Model, ModelError> {
        let nu = self.nu;
        self.initialize_with(offset, Mogi::new(nu), L2)
    }

    /// Initialize the model with a custom displacement source and norm.
    ///
    /// Compiles the parameter layout, loads the station and displacement
    /// files and computes the likelihood normalization. Either every step
    /// succeeds or the first failure is returned and no model exists.
    pub fn initialize_with<S, N>(
        self,
        offset: usize,
        source: S,
        norm: N,
    ) -> Result<Model<S, N>, ModelError>
    where
        S: DisplacementSource,
        N: Norm,
    {
        let layout = Layout::compile(&self.psets)?;
        let Inputs {
            stations,
            displacements,
        } = inputs::load_inputs(
            &self.case,
            &self.stations,
            &self.displacements,
            self.observations,
        )?;
        let normalization = normalization(self.observations);

        log::info!(
            "mogi model: {} observations, {} parameters in {} sets",
            self.observations,
            layout.parameters(),
            layout.sets().len()
        );
        for set in layout.sets() {
            log::info!(
                "    {}: offset {}, count {}",
                set.name,
                set.offset,
                set.count
            );
        }
        log::info!(
            "case '{}': {} stations, {} displacement components",
            self.case.display(),
            stations.len(),
            displacements.len()
        );

        Ok(Model {
            psets: self.psets,
            layout,
            stations,
            observed: displacements,
            normalization,
            offset,
            source,
            norm,
        })
    }
}

/// The normalization of the Gaussian data likelihood, `-ln(2 pi) * n / 2`.
pub fn normalization(observations: usize) -> f64 {
    -(2.0 * std::f64::consts::PI).ln() * observations as f64 / 2.0
}

/// An initialized model. Immutable: all mutation happens in the vectors the
/// sampler passes in.
#[derive(Debug)]
pub struct Model<S = Mogi, N = L2> {
    psets: Vec<(String, Box<dyn ParameterSet>)>,
    layout: Layout,
    stations: Vec<Station>,
    observed: Vec<f64>,
    normalization: f64,
    offset: usize,
    source: S,
    norm: N,
}

impl<S, N> Model<S, N>
where
    S: DisplacementSource,
    N: Norm,
{
    pub fn parameters(&self) -> usize {
        self.layout.parameters()
    }

    pub fn observations(&self) -> usize {
        self.observed.len()
    }

    pub fn normalization(&self) -> f64 {
        self.normalization
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn observed(&self) -> &[f64] {
        &self.observed
    }

    /// The columns of the shared sample matrix that belong to this model.
    fn restrict<'a>(&self, theta: MatRef<'a, f64>) -> MatRef<'a, f64> {
        theta.subcols(self.offset, self.layout.parameters())
    }

    fn restrict_mut<'a>(&self, theta: MatMut<'a, f64>) -> MatMut<'a, f64> {
        theta.subcols_mut(self.offset, self.layout.parameters())
    }

    /// Fill this model's columns of `theta` with initial draws, one
    /// parameter set at a time.
    pub fn initialize_sample(&self, rng: &mut dyn RngCore, theta: MatMut<'_, f64>) {
        let mut theta = self.restrict_mut(theta);
        for (set, (_, pset)) in izip!(self.layout.sets(), &self.psets) {
            pset.initialize_sample(rng, theta.rb_mut().subcols_mut(set.offset, set.count));
        }
    }

    /// Accumulate every set's prior log-likelihood contribution, in
    /// configuration order. The sets are parameter-disjoint, so the
    /// contributions are additive.
    pub fn prior_likelihood(&self, theta: MatRef<'_, f64>, prior: &mut [f64]) {
        let theta = self.restrict(theta);
        assert!(prior.len() == theta.nrows());
        for (set, (_, pset)) in izip!(self.layout.sets(), &self.psets) {
            pset.prior_likelihood(theta.subcols(set.offset, set.count), prior);
        }
    }

    /// Overwrite `data` with the data log-likelihood of every sample row.
    ///
    /// For each row: extract the source location, depth and strength
    /// exponent through the compiled layout, evaluate the forward model at
    /// the stations, subtract the observations and convert the residual norm
    /// into `normalization - norm / 2`. Rows are independent and evaluated
    /// in parallel; a forward-model failure for any row aborts the whole
    /// pass.
    pub fn data_likelihood(
        &self,
        theta: MatRef<'_, f64>,
        data: &mut [f64],
    ) -> Result<(), ModelError> {
        let theta = self.restrict(theta);
        assert!(data.len() == theta.nrows());

        let observations = self.observed.len();
        let x_idx = self.layout.x_idx();
        let y_idx = self.layout.y_idx();
        let d_idx = self.layout.d_idx();
        let s_idx = self.layout.s_idx();

        data.par_iter_mut().enumerate().try_for_each_init(
            || vec![0f64; observations],
            |residual, (sample, llk)| {
                let x = theta[(sample, x_idx)];
                let y = theta[(sample, y_idx)];
                let depth = theta[(sample, d_idx)];
                // the sampler explores the log of the source strength
                let strength = 10f64.powf(theta[(sample, s_idx)]);

                self.source
                    .displacements(x, y, depth, strength, &self.stations, residual)
                    .map_err(|err| ModelError::Source {
                        sample,
                        source: Box::new(err),
                    })?;

                izip!(residual.iter_mut(), self.observed.iter())
                    .for_each(|(u, observed)| *u -= observed);

                *llk = self.normalization - self.norm.eval(residual) / 2.0;
                Ok(())
            },
        )
    }

    /// Let every parameter set flag the samples it judges invalid. Masking
    /// is monotone: entries are only ever set, never cleared.
    pub fn verify(&self, theta: MatRef<'_, f64>, mask: &mut [u8]) {
        let theta = self.restrict(theta);
        assert!(mask.len() == theta.nrows());
        for (set, (_, pset)) in izip!(self.layout.sets(), &self.psets) {
            pset.verify(theta.subcols(set.offset, set.count), mask);
        }
    }
}

impl<S, N> BayesianModel for Model<S, N>
where
    S: DisplacementSource,
    N: Norm,
{
    fn parameters(&self) -> usize {
        Model::parameters(self)
    }

    fn initialize_sample(&self, rng: &mut dyn RngCore, theta: MatMut<'_, f64>) {
        Model::initialize_sample(self, rng, theta)
    }

    fn prior_likelihood(&self, theta: MatRef<'_, f64>, prior: &mut [f64]) {
        Model::prior_likelihood(self, theta, prior)
    }

    fn data_likelihood(&self, theta: MatRef<'_, f64>, data: &mut [f64]) -> anyhow::Result<()> {
        Ok(Model::data_likelihood(self, theta, data)?)
    }

    fn verify(&self, theta: MatRef<'_, f64>, mask: &mut [u8]) {
        Model::verify(self, theta, mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn normalization_of_nothing_is_zero() {
        assert_eq!(normalization(0), 0.0);
    }

    #[test]
    fn normalization_is_known_constant() {
        assert_abs_diff_eq!(normalization(6), -3.0 * (2.0 * std::f64::consts::PI).ln());
        assert_abs_diff_eq!(normalization(6), -5.513631199228036, epsilon = 1e-12);
    }

    #[test]
    fn normalization_decreases_with_observations() {
        let mut last = normalization(0);
        for n in [1, 10, 121, 363] {
            let current = normalization(n);
            assert!(current < last);
            last = current;
        }
    }

    #[test]
    fn config_defaults_match_synthetic_case() {
        let config = ModelConfig::default();
        assert_eq!(config.observations, 363);
        assert_eq!(config.case, PathBuf::from("synthetic"));
        assert_eq!(config.displacements, "displacements.txt");
        assert_eq!(config.stations, "stations.txt");
        assert_eq!(config.nu, 0.25);
    }
}
