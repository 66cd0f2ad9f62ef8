use std::collections::BTreeMap;
use std::fmt;

use yaml_rust2::Yaml;

/// A single model invocation option value
#[derive(Clone, Debug)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl OptionValue {
    /// Numeric view of the value. Booleans are not numbers here.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            OptionValue::Int(i) => Some(*i as f64),
            OptionValue::Float(f) => Some(*f),
            OptionValue::Bool(_) | OptionValue::Str(_) => None,
        }
    }

    /// Numerically equal numbers are equivalent across int/float; everything
    /// else must match exactly, including the variant.
    pub fn equivalent(&self, other: &OptionValue) -> bool {
        match (self, other) {
            (OptionValue::Bool(a), OptionValue::Bool(b)) => a == b,
            (OptionValue::Str(a), OptionValue::Str(b)) => a == b,
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            },
        }
    }

    /// Parse a command-line value: boolean words, then integer, then finite
    /// float, falling back to the raw string (`nan` and `inf` stay strings).
    pub fn parse(value: &str) -> OptionValue {
        match value.to_lowercase().as_str() {
            "true" | "on" | "yes" => return OptionValue::Bool(true),
            "false" | "off" | "no" => return OptionValue::Bool(false),
            _ => {}
        }
        if let Ok(i) = value.parse::<i64>() {
            return OptionValue::Int(i);
        }
        match value.parse::<f64>() {
            Ok(f) if f.is_finite() => OptionValue::Float(f),
            _ => OptionValue::Str(value.to_string()),
        }
    }

    /// YAML scalar for this value. Floats always carry a fractional part or
    /// an exponent so they read back as floats.
    pub(crate) fn to_yaml(&self) -> Yaml {
        match self {
            OptionValue::Bool(b) => Yaml::Boolean(*b),
            OptionValue::Int(i) => Yaml::Integer(*i),
            OptionValue::Float(x) => Yaml::Real(format!("{x:?}")),
            OptionValue::Str(s) => Yaml::String(s.clone()),
        }
    }

    /// Value of a scalar YAML node. Quoted scalars arrive as `Yaml::String`
    /// and stay strings; null and collections have no value.
    pub(crate) fn from_yaml(node: &Yaml) -> Option<OptionValue> {
        match node {
            Yaml::Boolean(b) => Some(OptionValue::Bool(*b)),
            Yaml::Integer(i) => Some(OptionValue::Int(*i)),
            Yaml::Real(text) => Some(match node.as_f64() {
                Some(x) if x.is_finite() => OptionValue::Float(x),
                _ => OptionValue::Str(text.clone()),
            }),
            Yaml::String(s) => Some(OptionValue::Str(s.clone())),
            _ => None,
        }
    }
}

impl PartialEq for OptionValue {
    fn eq(&self, other: &Self) -> bool {
        self.equivalent(other)
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Bool(b) => write!(f, "{b}"),
            OptionValue::Int(i) => write!(f, "{i}"),
            // Debug keeps the fractional part, so 1.0 stays "1.0"
            OptionValue::Float(x) => write!(f, "{x:?}"),
            OptionValue::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(b: bool) -> Self {
        OptionValue::Bool(b)
    }
}

impl From<i64> for OptionValue {
    fn from(i: i64) -> Self {
        OptionValue::Int(i)
    }
}

impl From<f64> for OptionValue {
    fn from(f: f64) -> Self {
        OptionValue::Float(f)
    }
}

impl From<&str> for OptionValue {
    fn from(s: &str) -> Self {
        OptionValue::Str(s.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(s: String) -> Self {
        OptionValue::Str(s)
    }
}

/// Named generation parameters passed to a model. Keys iterate in sorted
/// order, so anything derived from an option set is independent of the order
/// in which options were inserted.
#[derive(Clone, Debug, Default)]
pub struct OptionSet(BTreeMap<String, OptionValue>);

impl OptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<OptionValue>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.0.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Same key set, and every value equivalent under [`OptionValue::equivalent`]
    pub fn equivalent(&self, other: &OptionSet) -> bool {
        self.0.len() == other.0.len()
            && self
                .0
                .iter()
                .all(|(k, v)| other.0.get(k).is_some_and(|w| v.equivalent(w)))
    }

    /// Build an option set from `NAME VALUE` pairs as given on the command line
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), OptionValue::parse(v)))
            .collect()
    }
}

impl PartialEq for OptionSet {
    fn eq(&self, other: &Self) -> bool {
        self.equivalent(other)
    }
}

impl FromIterator<(String, OptionValue)> for OptionSet {
    fn from_iter<I: IntoIterator<Item = (String, OptionValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for OptionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (idx, (k, v)) in self.0.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{k}={v}")?;
        }
        write!(f, "}}")
    }
}
