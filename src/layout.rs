//! Compilation of the flat parameter layout.

use crate::model::ModelError;
use crate::params::ParameterSet;

pub(crate) const LOCATION: &str = "location";
pub(crate) const DEPTH: &str = "depth";
pub(crate) const SOURCE: &str = "source";

/// One parameter set's slice of the flat parameter vector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SetLayout {
    pub name: String,
    pub offset: usize,
    pub count: usize,
}

/// The compiled layout of the model's parameter vector.
///
/// Assigns every parameter set a contiguous, non-overlapping offset range in
/// configuration order, and resolves the four indices the data-likelihood
/// evaluator reads directly: the x/y source location, the source depth, and
/// the source strength exponent. Computed once during model initialization
/// and immutable afterwards.
#[derive(Clone, Debug)]
pub struct Layout {
    sets: Vec<SetLayout>,
    parameters: usize,
    x_idx: usize,
    y_idx: usize,
    d_idx: usize,
    s_idx: usize,
}

impl Layout {
    /// Compile the layout of an ordered parameter-set collection.
    ///
    /// Fails fast if any of the required sets ("location", "depth",
    /// "source") is absent or if the location set cannot hold an x/y pair.
    pub fn compile(psets: &[(String, Box<dyn ParameterSet>)]) -> Result<Self, ModelError> {
        let mut sets = Vec::with_capacity(psets.len());
        let mut offset = 0;
        for (name, pset) in psets {
            let count = pset.count();
            sets.push(SetLayout {
                name: name.clone(),
                offset,
                count,
            });
            offset += count;
        }

        let require = |name: &'static str| {
            sets.iter()
                .find(|set| set.name == name)
                .ok_or(ModelError::MissingParameterSet { name })
        };

        let location = require(LOCATION)?;
        if location.count < 2 {
            return Err(ModelError::NarrowLocation {
                count: location.count,
            });
        }
        let x_idx = location.offset;
        let y_idx = x_idx + 1;
        let d_idx = require(DEPTH)?.offset;
        let s_idx = require(SOURCE)?.offset;

        Ok(Self {
            sets,
            parameters: offset,
            x_idx,
            y_idx,
            d_idx,
            s_idx,
        })
    }

    /// Total number of parameters owned by the model.
    pub fn parameters(&self) -> usize {
        self.parameters
    }

    /// Per-set offsets, in configuration order.
    pub fn sets(&self) -> &[SetLayout] {
        &self.sets
    }

    pub fn x_idx(&self) -> usize {
        self.x_idx
    }

    pub fn y_idx(&self) -> usize {
        self.y_idx
    }

    pub fn d_idx(&self) -> usize {
        self.d_idx
    }

    pub fn s_idx(&self) -> usize {
        self.s_idx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::UniformPrior;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn pset(count: usize) -> Box<dyn ParameterSet> {
        Box::new(UniformPrior::new(count, 0.0, 1.0))
    }

    fn named(counts: &[usize]) -> Vec<(String, Box<dyn ParameterSet>)> {
        // required sets first so the layout always compiles
        let mut psets = vec![
            ("location".to_string(), pset(2)),
            ("depth".to_string(), pset(1)),
            ("source".to_string(), pset(1)),
        ];
        for (i, &count) in counts.iter().enumerate() {
            psets.push((format!("extra{i}"), pset(count)));
        }
        psets
    }

    #[test]
    fn resolves_named_indices() {
        let psets = named(&[]);
        let layout = Layout::compile(&psets).unwrap();
        assert_eq!(layout.parameters(), 4);
        assert_eq!(layout.x_idx(), 0);
        assert_eq!(layout.y_idx(), 1);
        assert_eq!(layout.d_idx(), 2);
        assert_eq!(layout.s_idx(), 3);
    }

    #[test]
    fn indices_follow_configuration_order() {
        let psets = vec![
            ("source".to_string(), pset(1)),
            ("depth".to_string(), pset(2)),
            ("location".to_string(), pset(3)),
        ];
        let layout = Layout::compile(&psets).unwrap();
        assert_eq!(layout.s_idx(), 0);
        assert_eq!(layout.d_idx(), 1);
        assert_eq!(layout.x_idx(), 3);
        assert_eq!(layout.y_idx(), 4);
        assert_eq!(layout.parameters(), 6);
    }

    #[test]
    fn missing_required_set_fails_fast() {
        let psets = vec![
            ("location".to_string(), pset(2)),
            ("depth".to_string(), pset(1)),
        ];
        let err = Layout::compile(&psets).unwrap_err();
        assert!(matches!(
            err,
            ModelError::MissingParameterSet { name: "source" }
        ));
    }

    #[test]
    fn single_parameter_location_is_rejected() {
        let psets = vec![
            ("location".to_string(), pset(1)),
            ("depth".to_string(), pset(1)),
            ("source".to_string(), pset(1)),
        ];
        let err = Layout::compile(&psets).unwrap_err();
        assert!(matches!(err, ModelError::NarrowLocation { count: 1 }));
    }

    proptest! {
        #[test]
        fn offsets_are_contiguous_and_exhaustive(counts in proptest::collection::vec(1usize..8, 0..6)) {
            let psets = named(&counts);
            let layout = Layout::compile(&psets).unwrap();

            let mut expected = 0;
            for set in layout.sets() {
                prop_assert_eq!(set.offset, expected);
                expected += set.count;
            }
            prop_assert_eq!(layout.parameters(), expected);

            let total: usize = psets.iter().map(|(_, p)| p.count()).sum();
            prop_assert_eq!(layout.parameters(), total);
        }
    }
}
