//! Bound argument lists handed to invocables.

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::error::ApplicationError;

/// Failures reading a bound argument inside a target.
#[derive(Debug, Error)]
pub enum ArgumentError {
    /// The signature did not bind the argument.
    #[error("argument '{name}' was not bound")]
    Missing {
        /// Argument name.
        name: String,
    },
    /// The bound value does not deserialize into the requested type.
    #[error("argument '{name}' has an unexpected shape: {source}")]
    Shape {
        /// Argument name.
        name: String,
        /// Underlying deserialization error.
        #[source]
        source: serde_json::Error,
    },
}

/// Coerced arguments for a single dispatch, in signature order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    values: Vec<(String, Value)>,
}

impl Arguments {
    /// Creates an empty argument list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a bound value.
    pub(crate) fn push(&mut self, name: impl Into<String>, value: Value) {
        self.values.push((name.into(), value));
    }

    /// Adds a bound value, returning the extended list.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.push(name, value);
        self
    }

    /// Raw JSON value bound to `name`.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(bound, _)| bound == name)
            .map(|(_, value)| value)
    }

    /// Deserializes the argument bound to `name`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApplicationError`] wrapping [`ArgumentError`] when the
    /// argument is absent or has a different shape.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<T, ApplicationError> {
        self.get_opt(name)?.ok_or_else(|| {
            ApplicationError::new(ArgumentError::Missing {
                name: name.to_owned(),
            })
        })
    }

    /// Deserializes an optional argument, returning `None` when it was not bound.
    ///
    /// # Errors
    ///
    /// Returns an [`ApplicationError`] wrapping [`ArgumentError::Shape`] when
    /// the bound value has a different shape.
    pub fn get_opt<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, ApplicationError> {
        let Some(value) = self.value(name) else {
            return Ok(None);
        };
        serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|source| {
                ApplicationError::new(ArgumentError::Shape {
                    name: name.to_owned(),
                    source,
                })
            })
    }

    /// Iterates over `(name, value)` pairs in signature order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Names of the bound arguments in signature order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.values.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Number of bound arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` when nothing was bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
