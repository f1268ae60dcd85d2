use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Defines the key marking a named structure in the JSON representation
pub const STRUCTURE_NAME_KEY: &str = "$name";

/// Defines an option map (sorted by key)
pub type OptionMap = BTreeMap<String, OptionValue>;

/// Holds a named structure such as `Norton { K: 100e6, n: 5 }`
#[derive(Clone, Debug, PartialEq)]
pub struct DataStructure {
    /// Name of the structure (e.g. the name of a brick variant)
    pub name: String,

    /// Options of the structure
    pub options: OptionMap,
}

impl DataStructure {
    /// Allocates a new instance
    pub fn new(name: &str, options: OptionMap) -> Self {
        DataStructure {
            name: name.to_string(),
            options,
        }
    }
}

/// Holds the value of a brick option
///
/// JSON representation: booleans, numbers, strings, arrays and objects map
/// directly; an object with a `"$name"` key is a named structure whose other
/// keys form its option map.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum OptionValue {
    Boolean(bool),
    Integer(i64),
    Real(f64),
    String(String),
    Array(Vec<OptionValue>),
    Map(OptionMap),
    Structure(DataStructure),
}

impl OptionValue {
    /// Returns a short name of the value's type
    pub fn type_name(&self) -> &'static str {
        match self {
            OptionValue::Boolean(..) => "boolean",
            OptionValue::Integer(..) => "integer",
            OptionValue::Real(..) => "real",
            OptionValue::String(..) => "string",
            OptionValue::Array(..) => "array",
            OptionValue::Map(..) => "map",
            OptionValue::Structure(..) => "structure",
        }
    }

    /// Returns the boolean value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer value
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            OptionValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the real value (integers are promoted)
    pub fn as_real(&self) -> Option<f64> {
        match self {
            OptionValue::Integer(i) => Some(*i as f64),
            OptionValue::Real(x) => Some(*x),
            _ => None,
        }
    }

    /// Returns the string value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Returns the map value
    pub fn as_map(&self) -> Option<&OptionMap> {
        match self {
            OptionValue::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Returns a structure
    ///
    /// A plain string is accepted as a structure without options.
    pub fn as_structure(&self) -> Option<DataStructure> {
        match self {
            OptionValue::String(s) => Some(DataStructure::new(s, OptionMap::new())),
            OptionValue::Structure(d) => Some(d.clone()),
            _ => None,
        }
    }

    /// Returns a list of structures
    ///
    /// A single structure (or string) is accepted as a list of one element.
    pub fn as_structures(&self) -> Option<Vec<DataStructure>> {
        match self {
            OptionValue::Array(values) => values.iter().map(|v| v.as_structure()).collect(),
            _ => self.as_structure().map(|d| vec![d]),
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value: Value = self.clone().into();
        write!(f, "{}", value)
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Boolean(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        OptionValue::Integer(value)
    }
}

impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        OptionValue::Real(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::String(value.to_string())
    }
}

impl From<DataStructure> for OptionValue {
    fn from(value: DataStructure) -> Self {
        OptionValue::Structure(value)
    }
}

impl TryFrom<Value> for OptionValue {
    type Error = String;
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Null => Err("null is not a valid option value".to_string()),
            Value::Bool(b) => Ok(OptionValue::Boolean(b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(OptionValue::Integer(i))
                } else if let Some(x) = n.as_f64() {
                    Ok(OptionValue::Real(x))
                } else {
                    Err(format!("number {} cannot be represented", n))
                }
            }
            Value::String(s) => Ok(OptionValue::String(s)),
            Value::Array(values) => {
                let array: Result<Vec<_>, _> = values.into_iter().map(OptionValue::try_from).collect();
                Ok(OptionValue::Array(array?))
            }
            Value::Object(object) => {
                let mut name = None;
                let mut map = OptionMap::new();
                for (key, value) in object {
                    if key == STRUCTURE_NAME_KEY {
                        match value {
                            Value::String(s) => name = Some(s),
                            _ => return Err(format!("'{}' must be a string", STRUCTURE_NAME_KEY)),
                        }
                    } else {
                        map.insert(key, OptionValue::try_from(value)?);
                    }
                }
                match name {
                    Some(n) => Ok(OptionValue::Structure(DataStructure { name: n, options: map })),
                    None => Ok(OptionValue::Map(map)),
                }
            }
        }
    }
}

impl From<OptionValue> for Value {
    fn from(value: OptionValue) -> Self {
        fn map_to_object(map: OptionMap) -> Map<String, Value> {
            map.into_iter().map(|(k, v)| (k, Value::from(v))).collect()
        }
        match value {
            OptionValue::Boolean(b) => Value::Bool(b),
            OptionValue::Integer(i) => Value::Number(Number::from(i)),
            OptionValue::Real(x) => match Number::from_f64(x) {
                Some(n) => Value::Number(n),
                None => Value::String(format!("{}", x)),
            },
            OptionValue::String(s) => Value::String(s),
            OptionValue::Array(values) => Value::Array(values.into_iter().map(Value::from).collect()),
            OptionValue::Map(map) => Value::Object(map_to_object(map)),
            OptionValue::Structure(d) => {
                let mut object = map_to_object(d.options);
                object.insert(STRUCTURE_NAME_KEY.to_string(), Value::String(d.name));
                Value::Object(object)
            }
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{DataStructure, OptionMap, OptionValue};

    #[test]
    fn getters_work() {
        assert_eq!(OptionValue::Boolean(true).as_bool(), Some(true));
        assert_eq!(OptionValue::Integer(3).as_real(), Some(3.0));
        assert_eq!(OptionValue::Real(0.5).as_real(), Some(0.5));
        assert_eq!(OptionValue::Real(0.5).as_integer(), None);
        assert_eq!(OptionValue::from("Mises").as_str(), Some("Mises"));
        assert_eq!(OptionValue::from("Mises").as_bool(), None);
        assert_eq!(OptionValue::Map(OptionMap::new()).type_name(), "map");
    }

    #[test]
    fn structures_work() {
        let s = OptionValue::from("Hooke").as_structure().unwrap();
        assert_eq!(s, DataStructure::new("Hooke", OptionMap::new()));

        let mut options = OptionMap::new();
        options.insert("K".to_string(), OptionValue::Real(100e6));
        let norton = OptionValue::Structure(DataStructure::new("Norton", options));
        let list = OptionValue::Array(vec![norton.clone(), OptionValue::from("Plastic")]);
        let structures = list.as_structures().unwrap();
        assert_eq!(structures.len(), 2);
        assert_eq!(structures[0].name, "Norton");
        assert_eq!(structures[1].name, "Plastic");
        assert_eq!(norton.as_structures().unwrap().len(), 1);
        assert_eq!(OptionValue::Array(vec![OptionValue::Real(1.0)]).as_structures(), None);
    }

    #[test]
    fn json_conversion_works() {
        let json = r#"{
            "stress_potential": "Hooke",
            "inelastic_flow": {"$name": "Norton", "K": 100e6, "n": 5, "criterion": "Mises"},
            "porosity_evolution": {"algorithm": "staggered_scheme", "elastic_contribution": false},
            "list": [1, 2.5, true]
        }"#;
        let options: OptionMap = serde_json::from_str(json).unwrap();
        assert_eq!(options["stress_potential"], OptionValue::from("Hooke"));
        let flow = options["inelastic_flow"].as_structure().unwrap();
        assert_eq!(flow.name, "Norton");
        assert_eq!(flow.options["n"], OptionValue::Integer(5));
        assert_eq!(flow.options["K"], OptionValue::Real(100e6));
        let porosity = options["porosity_evolution"].as_map().unwrap();
        assert_eq!(porosity["elastic_contribution"], OptionValue::Boolean(false));
        assert_eq!(
            options["list"],
            OptionValue::Array(vec![
                OptionValue::Integer(1),
                OptionValue::Real(2.5),
                OptionValue::Boolean(true)
            ])
        );

        // back to JSON and again
        let text = serde_json::to_string(&options).unwrap();
        let again: OptionMap = serde_json::from_str(&text).unwrap();
        assert_eq!(again, options);
        assert_eq!(
            format!("{}", options["inelastic_flow"]),
            r#"{"$name":"Norton","K":100000000.0,"criterion":"Mises","n":5}"#
        );
    }

    #[test]
    fn json_conversion_captures_errors() {
        let res: Result<OptionMap, _> = serde_json::from_str(r#"{"a": null}"#);
        assert!(res.is_err());
        let res: Result<OptionMap, _> = serde_json::from_str(r#"{"a": {"$name": 1}}"#);
        assert!(res.is_err());
    }
}
