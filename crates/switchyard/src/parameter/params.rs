//! Raw request parameters as supplied by the transport.

use serde_json::{Map, Value};

use crate::error::DispatchError;

/// Parameters carried by an inbound request before binding.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Params {
    /// The request carried no parameters.
    #[default]
    None,
    /// Parameters matched to the signature by position.
    Positional(Vec<Value>),
    /// Parameters matched to the signature by name.
    Named(Map<String, Value>),
}

impl Params {
    /// Interprets the `params` member of a request.
    ///
    /// Absent and `null` parameters are equivalent.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidParams`] when the value is neither an
    /// array nor an object.
    pub fn from_value(value: Option<Value>) -> Result<Self, DispatchError> {
        match value {
            None | Some(Value::Null) => Ok(Self::None),
            Some(Value::Array(values)) => Ok(Self::Positional(values)),
            Some(Value::Object(map)) => Ok(Self::Named(map)),
            Some(_) => Err(DispatchError::invalid_params(
                "params must be an array or an object",
            )),
        }
    }

    /// Number of supplied values.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::None => 0,
            Self::Positional(values) => values.len(),
            Self::Named(map) => map.len(),
        }
    }

    /// Returns `true` when no values were supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Vec<Value>> for Params {
    fn from(values: Vec<Value>) -> Self {
        Self::Positional(values)
    }
}

impl From<Map<String, Value>> for Params {
    fn from(map: Map<String, Value>) -> Self {
        Self::Named(map)
    }
}
