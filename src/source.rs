//! The analytic displacement source.
//!
//! Provides the `DisplacementSource` contract consumed by the data-likelihood
//! evaluator, together with the default closed-form implementation: a Mogi
//! [1958] point pressure source in an elastic half space.

use std::error::Error;
use std::f64::consts::PI;

use thiserror::Error;

use crate::inputs::Station;

/// A physical model predicting surface displacements at a set of stations.
///
/// Implementations must be pure functions of their arguments: the evaluator
/// calls them once per candidate sample, possibly from several threads at
/// once, and relies on identical inputs producing identical outputs.
///
/// The output convention is station major: `out` has length
/// `3 * stations.len()` and holds the `(east, north, up)` triple for each
/// station in station order.
pub trait DisplacementSource: Send + Sync {
    /// Errors reported for numerically degenerate geometries.
    ///
    /// A failure aborts the whole evaluation pass, it is not a per-sample
    /// rejection.
    type Error: Error + Send + Sync + 'static;

    /// Predict the displacement field of a source at `(x, y, depth)` with the
    /// given strength, evaluated at every station.
    fn displacements(
        &self,
        x: f64,
        y: f64,
        depth: f64,
        strength: f64,
        stations: &[Station],
        out: &mut [f64],
    ) -> Result<(), Self::Error>;
}

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("singular geometry: source coincides with station {station}")]
    SingularGeometry { station: usize },
}

/// The Mogi point pressure source.
///
/// The surface displacement at a station offset `(dx, dy)` from the source
/// epicenter is
///
/// ```text
/// u = (1 - nu) * dV / pi * (dx, dy, depth) / R^3,   R^2 = dx^2 + dy^2 + depth^2
/// ```
///
/// where `dV` is the volume change of the source and `nu` the Poisson ratio
/// of the half space.
#[derive(Clone, Copy, Debug)]
pub struct Mogi {
    nu: f64,
}

impl Mogi {
    pub fn new(nu: f64) -> Self {
        Self { nu }
    }

    pub fn nu(&self) -> f64 {
        self.nu
    }
}

impl Default for Mogi {
    fn default() -> Self {
        Self::new(0.25)
    }
}

impl DisplacementSource for Mogi {
    type Error = SourceError;

    fn displacements(
        &self,
        x: f64,
        y: f64,
        depth: f64,
        strength: f64,
        stations: &[Station],
        out: &mut [f64],
    ) -> Result<(), SourceError> {
        assert!(out.len() == 3 * stations.len());

        let scale = (1.0 - self.nu) * strength / PI;
        for (station, (point, u)) in stations.iter().zip(out.chunks_exact_mut(3)).enumerate() {
            let dx = point.x - x;
            let dy = point.y - y;
            let r2 = dx * dx + dy * dy + depth * depth;
            let r3 = r2 * r2.sqrt();
            if !(r3.is_finite() && r3 > 0.0) {
                return Err(SourceError::SingularGeometry { station });
            }
            u[0] = scale * dx / r3;
            u[1] = scale * dy / r3;
            u[2] = scale * depth / r3;
        }
        Ok(())
    }
}
