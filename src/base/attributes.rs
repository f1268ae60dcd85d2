use crate::{Error, Result};
use serde::Serialize;
use std::collections::BTreeMap;

/// Defines the attribute recording that the stiffness tensor is needed
pub const ATTRIBUTE_REQUIRES_STIFFNESS_TENSOR: &str = "requires_stiffness_tensor";

/// Defines the attribute recording that thermal expansion is handled by a brick
pub const ATTRIBUTE_HANDLES_THERMAL_EXPANSION: &str = "handles_thermal_expansion";

/// Defines the attribute holding the porosity evolution algorithm
pub const ATTRIBUTE_POROSITY_EVOLUTION_ALGORITHM: &str = "porosity_evolution_algorithm";

/// Defines the attribute holding the staggered scheme acceleration algorithm
pub const ATTRIBUTE_STAGGERED_SCHEME_ACCELERATION: &str = "staggered_scheme_acceleration";

/// Defines the attribute recording that the elastic prediction helper exists
pub const ATTRIBUTE_ELASTIC_PREDICTION: &str = "elastic_prediction";

/// Holds the value of an attribute
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Boolean(bool),
    Real(f64),
    UnsignedInteger(usize),
    String(String),
    Strings(Vec<String>),
}

/// Converts an attribute value into a concrete type
pub trait FromAttribute: Sized {
    fn from_attribute(value: &AttributeValue) -> Option<Self>;
}

impl FromAttribute for bool {
    fn from_attribute(value: &AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

impl FromAttribute for f64 {
    fn from_attribute(value: &AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::Real(x) => Some(*x),
            _ => None,
        }
    }
}

impl FromAttribute for usize {
    fn from_attribute(value: &AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::UnsignedInteger(i) => Some(*i),
            _ => None,
        }
    }
}

impl FromAttribute for String {
    fn from_attribute(value: &AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::String(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl FromAttribute for Vec<String> {
    fn from_attribute(value: &AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::Strings(s) => Some(s.clone()),
            _ => None,
        }
    }
}

/// Holds typed attributes used to pass decisions between bricks
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Attributes {
    all: BTreeMap<String, AttributeValue>,
}

impl Attributes {
    /// Allocates an empty set
    pub fn new() -> Self {
        Attributes { all: BTreeMap::new() }
    }

    /// Sets an attribute
    ///
    /// Fails if the attribute exists with a different value and `allow_override` is false.
    pub fn set(&mut self, key: &str, value: AttributeValue, allow_override: bool) -> Result<()> {
        if let Some(existing) = self.all.get(key) {
            if !allow_override && existing != &value {
                return Err(Error::AttributeExists(key.to_string()));
            }
        }
        self.all.insert(key.to_string(), value);
        Ok(())
    }

    /// Returns an attribute converted to a concrete type
    ///
    /// Returns None if the attribute is absent or has another type.
    pub fn get<T: FromAttribute>(&self, key: &str) -> Option<T> {
        self.all.get(key).and_then(|v| T::from_attribute(v))
    }

    /// Returns a boolean attribute, or false if absent
    pub fn flag(&self, key: &str) -> bool {
        self.get::<bool>(key).unwrap_or(false)
    }

    /// Indicates whether an attribute exists
    pub fn contains(&self, key: &str) -> bool {
        self.all.contains_key(key)
    }

    /// Returns an iterator over all attributes (sorted by key)
    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttributeValue)> {
        self.all.iter()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{AttributeValue, Attributes};
    use crate::{Error, Result};

    #[test]
    fn set_and_get_work() -> Result<()> {
        let mut att = Attributes::new();
        att.set("requires_stiffness_tensor", AttributeValue::Boolean(true), false)?;
        att.set("algorithm", AttributeValue::String("staggered_scheme".to_string()), false)?;
        att.set("n", AttributeValue::UnsignedInteger(3), false)?;
        assert_eq!(att.get::<bool>("requires_stiffness_tensor"), Some(true));
        assert_eq!(att.get::<String>("algorithm"), Some("staggered_scheme".to_string()));
        assert_eq!(att.get::<usize>("n"), Some(3));
        assert_eq!(att.get::<f64>("n"), None);
        assert_eq!(att.get::<bool>("missing"), None);
        assert!(att.flag("requires_stiffness_tensor"));
        assert!(!att.flag("missing"));
        assert!(att.contains("n"));
        assert_eq!(att.iter().count(), 3);
        Ok(())
    }

    #[test]
    fn set_captures_conflicts() -> Result<()> {
        let mut att = Attributes::new();
        att.set("flag", AttributeValue::Boolean(true), false)?;
        att.set("flag", AttributeValue::Boolean(true), false)?;
        assert_eq!(
            att.set("flag", AttributeValue::Boolean(false), false).err(),
            Some(Error::AttributeExists("flag".to_string()))
        );
        att.set("flag", AttributeValue::Boolean(false), true)?;
        assert_eq!(att.get::<bool>("flag"), Some(false));
        att.set("names", AttributeValue::Strings(vec!["a".to_string()]), false)?;
        assert_eq!(att.get::<Vec<String>>("names"), Some(vec!["a".to_string()]));
        Ok(())
    }
}
