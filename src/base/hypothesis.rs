use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Defines the modelling hypotheses (reduced tensorial settings)
///
/// `Undefined` is the wildcard: data attached to it applies to every
/// hypothesis which has not been specialized.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Deserialize, Serialize)]
pub enum Hypothesis {
    /// Wildcard matching all hypotheses
    Undefined,

    /// 1D axisymmetrical generalised plane strain
    AxisymmetricalGeneralisedPlaneStrain,

    /// 1D axisymmetrical generalised plane stress
    AxisymmetricalGeneralisedPlaneStress,

    /// 2D axisymmetrical
    Axisymmetrical,

    /// 2D plane stress
    PlaneStress,

    /// 2D plane strain
    PlaneStrain,

    /// 2D generalised plane strain
    GeneralisedPlaneStrain,

    /// 3D
    Tridimensional,
}

impl Hypothesis {
    /// Holds all hypotheses but the wildcard
    pub const ALL: [Hypothesis; 7] = [
        Hypothesis::AxisymmetricalGeneralisedPlaneStrain,
        Hypothesis::AxisymmetricalGeneralisedPlaneStress,
        Hypothesis::Axisymmetrical,
        Hypothesis::PlaneStress,
        Hypothesis::PlaneStrain,
        Hypothesis::GeneralisedPlaneStrain,
        Hypothesis::Tridimensional,
    ];

    /// Returns the name of the hypothesis
    pub fn name(&self) -> &'static str {
        match self {
            Hypothesis::Undefined => "Undefined",
            Hypothesis::AxisymmetricalGeneralisedPlaneStrain => "AxisymmetricalGeneralisedPlaneStrain",
            Hypothesis::AxisymmetricalGeneralisedPlaneStress => "AxisymmetricalGeneralisedPlaneStress",
            Hypothesis::Axisymmetrical => "Axisymmetrical",
            Hypothesis::PlaneStress => "PlaneStress",
            Hypothesis::PlaneStrain => "PlaneStrain",
            Hypothesis::GeneralisedPlaneStrain => "GeneralisedPlaneStrain",
            Hypothesis::Tridimensional => "Tridimensional",
        }
    }

    /// Returns the space dimension
    ///
    /// The wildcard has no dimension and returns None.
    pub fn space_dimension(&self) -> Option<usize> {
        match self {
            Hypothesis::Undefined => None,
            Hypothesis::AxisymmetricalGeneralisedPlaneStrain => Some(1),
            Hypothesis::AxisymmetricalGeneralisedPlaneStress => Some(1),
            Hypothesis::Axisymmetrical => Some(2),
            Hypothesis::PlaneStress => Some(2),
            Hypothesis::PlaneStrain => Some(2),
            Hypothesis::GeneralisedPlaneStrain => Some(2),
            Hypothesis::Tridimensional => Some(3),
        }
    }

    /// Returns the number of components of a symmetric tensor
    ///
    /// ```text
    /// 1D → 3,  2D → 4,  3D → 6
    /// ```
    pub fn stensor_size(&self) -> Option<usize> {
        self.space_dimension().map(|d| match d {
            1 => 3,
            2 => 4,
            _ => 6,
        })
    }

    /// Returns the number of components of a non-symmetric tensor
    ///
    /// ```text
    /// 1D → 3,  2D → 5,  3D → 9
    /// ```
    pub fn tensor_size(&self) -> Option<usize> {
        self.space_dimension().map(|d| match d {
            1 => 3,
            2 => 5,
            _ => 9,
        })
    }

    /// Indicates a plane-stress-like hypothesis (the axial stress vanishes)
    pub fn is_plane_stress_like(&self) -> bool {
        matches!(
            self,
            Hypothesis::PlaneStress | Hypothesis::AxisymmetricalGeneralisedPlaneStress
        )
    }
}

impl fmt::Display for Hypothesis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Hypothesis {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Undefined" => Ok(Hypothesis::Undefined),
            "AxisymmetricalGeneralisedPlaneStrain" => Ok(Hypothesis::AxisymmetricalGeneralisedPlaneStrain),
            "AxisymmetricalGeneralisedPlaneStress" => Ok(Hypothesis::AxisymmetricalGeneralisedPlaneStress),
            "Axisymmetrical" => Ok(Hypothesis::Axisymmetrical),
            "PlaneStress" => Ok(Hypothesis::PlaneStress),
            "PlaneStrain" => Ok(Hypothesis::PlaneStrain),
            "GeneralisedPlaneStrain" => Ok(Hypothesis::GeneralisedPlaneStrain),
            "Tridimensional" => Ok(Hypothesis::Tridimensional),
            _ => Err(Error::UnknownName {
                family: "modelling hypothesis".to_string(),
                name: s.to_string(),
                entry: "modelling_hypotheses".to_string(),
            }),
        }
    }
}

/// Holds values keyed by modelling hypothesis with a wildcard fallback
///
/// A lookup for a specific hypothesis returns the specialized value if there
/// is one, the wildcard value otherwise, and None if neither exists.
#[derive(Clone, Debug, Serialize)]
pub struct HypothesisMap<T> {
    /// Value attached to the wildcard
    default: Option<T>,

    /// Values attached to specific hypotheses
    specialized: BTreeMap<Hypothesis, T>,
}

impl<T: Clone> HypothesisMap<T> {
    /// Allocates an empty map
    pub fn new() -> Self {
        HypothesisMap {
            default: None,
            specialized: BTreeMap::new(),
        }
    }

    /// Allocates a map with a wildcard value
    pub fn with_default(value: T) -> Self {
        HypothesisMap {
            default: Some(value),
            specialized: BTreeMap::new(),
        }
    }

    /// Returns the value for a hypothesis, falling back to the wildcard
    pub fn get(&self, hypothesis: Hypothesis) -> Option<&T> {
        if hypothesis != Hypothesis::Undefined {
            if let Some(value) = self.specialized.get(&hypothesis) {
                return Some(value);
            }
        }
        self.default.as_ref()
    }

    /// Returns the wildcard value
    pub fn get_default(&self) -> Option<&T> {
        self.default.as_ref()
    }

    /// Returns the value specialized for a hypothesis (no fallback)
    pub fn get_specialized(&self, hypothesis: Hypothesis) -> Option<&T> {
        self.specialized.get(&hypothesis)
    }

    /// Indicates whether a hypothesis has a specialized value
    pub fn is_specialized(&self, hypothesis: Hypothesis) -> bool {
        self.specialized.contains_key(&hypothesis)
    }

    /// Returns the specialized hypotheses in increasing order
    pub fn specialized_hypotheses(&self) -> Vec<Hypothesis> {
        self.specialized.keys().copied().collect()
    }

    /// Sets a value
    ///
    /// Setting the wildcard value does not touch the specialized values.
    pub fn set(&mut self, hypothesis: Hypothesis, value: T) {
        if hypothesis == Hypothesis::Undefined {
            self.default = Some(value);
        } else {
            self.specialized.insert(hypothesis, value);
        }
    }

    /// Updates the value(s) attached to a hypothesis, all or nothing
    ///
    /// * `Undefined` updates the wildcard value and every specialized value
    /// * a specific hypothesis is first specialized by copying the wildcard value
    ///
    /// The closure is applied to copies; the map is only modified if the
    /// closure succeeds on every target.
    pub fn try_update<F>(&mut self, hypothesis: Hypothesis, mut f: F) -> Result<()>
    where
        F: FnMut(&mut T) -> Result<()>,
        T: Default,
    {
        if hypothesis == Hypothesis::Undefined {
            let mut default = self.default.clone().unwrap_or_default();
            f(&mut default)?;
            let mut specialized = self.specialized.clone();
            for value in specialized.values_mut() {
                f(value)?;
            }
            self.default = Some(default);
            self.specialized = specialized;
        } else {
            let mut value = match self.specialized.get(&hypothesis) {
                Some(v) => v.clone(),
                None => self.default.clone().unwrap_or_default(),
            };
            f(&mut value)?;
            self.specialized.insert(hypothesis, value);
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{Hypothesis, HypothesisMap};
    use crate::{Error, Result};

    #[test]
    fn derive_and_names_work() {
        let h = Hypothesis::PlaneStrain;
        let clone = h.clone();
        assert_eq!(format!("{:?}", clone), "PlaneStrain");
        assert_eq!(format!("{}", h), "PlaneStrain");
        for h in Hypothesis::ALL {
            assert_eq!(h.name().parse::<Hypothesis>().unwrap(), h);
        }
        assert_eq!(
            "Plane".parse::<Hypothesis>().err(),
            Some(Error::UnknownName {
                family: "modelling hypothesis".to_string(),
                name: "Plane".to_string(),
                entry: "modelling_hypotheses".to_string(),
            })
        );
    }

    #[test]
    fn sizes_work() {
        assert_eq!(Hypothesis::Undefined.stensor_size(), None);
        assert_eq!(Hypothesis::AxisymmetricalGeneralisedPlaneStrain.stensor_size(), Some(3));
        assert_eq!(Hypothesis::PlaneStress.stensor_size(), Some(4));
        assert_eq!(Hypothesis::Tridimensional.stensor_size(), Some(6));
        assert_eq!(Hypothesis::Axisymmetrical.tensor_size(), Some(5));
        assert_eq!(Hypothesis::Tridimensional.tensor_size(), Some(9));
        assert!(Hypothesis::PlaneStress.is_plane_stress_like());
        assert!(!Hypothesis::PlaneStrain.is_plane_stress_like());
    }

    #[test]
    fn lookup_falls_back_to_wildcard() {
        let mut map: HypothesisMap<i32> = HypothesisMap::new();
        assert_eq!(map.get(Hypothesis::PlaneStrain), None);
        map.set(Hypothesis::Undefined, 1);
        assert_eq!(map.get(Hypothesis::PlaneStrain), Some(&1));
        map.set(Hypothesis::PlaneStrain, 2);
        assert_eq!(map.get(Hypothesis::PlaneStrain), Some(&2));
        assert_eq!(map.get(Hypothesis::Tridimensional), Some(&1));
        assert_eq!(map.get(Hypothesis::Undefined), Some(&1));
        assert_eq!(map.specialized_hypotheses(), vec![Hypothesis::PlaneStrain]);
    }

    #[test]
    fn try_update_is_atomic() -> Result<()> {
        let mut map = HypothesisMap::with_default(vec![1]);
        map.try_update(Hypothesis::PlaneStress, |v| {
            v.push(2);
            Ok(())
        })?;
        assert_eq!(map.get(Hypothesis::PlaneStress), Some(&vec![1, 2]));
        map.try_update(Hypothesis::Undefined, |v| {
            v.push(3);
            Ok(())
        })?;
        assert_eq!(map.get(Hypothesis::PlaneStress), Some(&vec![1, 2, 3]));
        assert_eq!(map.get(Hypothesis::Tridimensional), Some(&vec![1, 3]));

        // fails on the specialized value only: nothing changes
        let res = map.try_update(Hypothesis::Undefined, |v| {
            if v.len() == 3 {
                return Err(Error::Numerical("stop".to_string()));
            }
            v.push(4);
            Ok(())
        });
        assert_eq!(res.err(), Some(Error::Numerical("stop".to_string())));
        assert_eq!(map.get(Hypothesis::Tridimensional), Some(&vec![1, 3]));
        Ok(())
    }
}
