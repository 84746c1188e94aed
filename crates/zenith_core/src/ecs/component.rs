// component.rs - Component storage and creation manifests
//
// Components are opaque to the coordinator. Each one is created and owned by
// the system registered under the component's name; the entity only keeps
// them in the order they were requested.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::any::Any;
use std::collections::HashMap;
use thiserror::Error;

/// Type-erased component data. Systems downcast to their own concrete type.
pub type Component = Box<dyn Any>;

/// Errors a system can raise while building a component from its options.
#[derive(Debug, Error)]
pub enum ComponentError {
    #[error("invalid component options: {0}")]
    InvalidOptions(#[from] serde_json::Error),

    #[error("{reason}")]
    Rejected { reason: String },
}

impl ComponentError {
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }
}

/// Deserialize a system's typed options from the raw manifest value.
pub fn parse_options<T: DeserializeOwned>(options: &Value) -> Result<T, ComponentError> {
    Ok(T::deserialize(options)?)
}

/// Ordered mapping from component name to component data.
///
/// Names keep their insertion order; lookups go through a hash index.
#[derive(Default)]
pub struct ComponentMap {
    entries: Vec<(String, Component)>,
    index: HashMap<String, usize>,
}

impl ComponentMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Insert a component. A name that is already present keeps its slot
    /// and has its data replaced.
    pub fn insert(&mut self, name: impl Into<String>, component: Component) {
        let name = name.into();
        match self.index.get(&name) {
            Some(&slot) => self.entries[slot].1 = component,
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, component));
            }
        }
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Component> {
        self.index.get(name).map(|&slot| &self.entries[slot].1)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Component> {
        let slot = *self.index.get(name)?;
        Some(&mut self.entries[slot].1)
    }

    /// Remove a component, preserving the order of the others.
    pub fn remove(&mut self, name: &str) -> Option<Component> {
        let slot = self.index.remove(name)?;
        let (_, component) = self.entries.remove(slot);
        for position in self.index.values_mut() {
            if *position > slot {
                *position -= 1;
            }
        }
        Some(component)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The manifest handed to `World::create_entity`: component names in the
/// order they should be created, each with the options for its system.
///
/// Built either from a plain list of names (every component gets empty
/// options) or from a JSON object mapping names to options. `true` and `null`
/// option values stand for "let the system pick defaults".
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ComponentManifest {
    entries: Vec<(String, Value)>,
}

/// The JSON value was neither a list of names nor an object of options.
#[derive(Debug, Error)]
#[error("a component manifest must be an array of names or an object of options")]
pub struct InvalidManifest;

impl ComponentManifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Manifest of component names with default options.
    pub fn names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut manifest = Self::new();
        for name in names {
            manifest.push(name, Value::Null);
        }
        manifest
    }

    /// Builder-style `push`.
    pub fn with(mut self, name: impl Into<String>, options: Value) -> Self {
        self.push(name, options);
        self
    }

    /// Append a component request. Later requests for a name already in the
    /// manifest are ignored.
    pub fn push(&mut self, name: impl Into<String>, options: Value) {
        let name = name.into();
        if self.contains(&name) {
            return;
        }
        let options = match options {
            Value::Null | Value::Bool(true) => Value::Object(Map::new()),
            other => other,
        };
        self.entries.push((name, options));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(existing, _)| existing == name)
    }

    pub fn names_iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn entries(&self) -> &[(String, Value)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TryFrom<Value> for ComponentManifest {
    type Error = InvalidManifest;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let mut manifest = Self::new();
        match value {
            Value::Array(names) => {
                for name in names {
                    match name {
                        Value::String(name) => manifest.push(name, Value::Null),
                        _ => return Err(InvalidManifest),
                    }
                }
            }
            Value::Object(options) => {
                for (name, options) in options {
                    manifest.push(name, options);
                }
            }
            _ => return Err(InvalidManifest),
        }
        Ok(manifest)
    }
}

impl<S: Into<String>> FromIterator<S> for ComponentManifest {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::names(iter)
    }
}

impl From<&[&str]> for ComponentManifest {
    fn from(names: &[&str]) -> Self {
        Self::names(names.iter().copied())
    }
}

impl<const N: usize> From<[&str; N]> for ComponentManifest {
    fn from(names: [&str; N]) -> Self {
        Self::names(names)
    }
}
