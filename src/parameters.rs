//! Named, typed parameter storage.
use crate::error::{KernelError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Value types that can be stored in [`ParameterData`].
pub trait ParameterType: Copy + Default + 'static {
    #[doc(hidden)]
    fn map(data: &ParameterData) -> &BTreeMap<String, Self>;
    #[doc(hidden)]
    fn map_mut(data: &mut ParameterData) -> &mut BTreeMap<String, Self>;
}

impl ParameterType for i64 {
    fn map(data: &ParameterData) -> &BTreeMap<String, Self> {
        &data.int_data
    }

    fn map_mut(data: &mut ParameterData) -> &mut BTreeMap<String, Self> {
        &mut data.int_data
    }
}

impl ParameterType for f64 {
    fn map(data: &ParameterData) -> &BTreeMap<String, Self> {
        &data.real_data
    }

    fn map_mut(data: &mut ParameterData) -> &mut BTreeMap<String, Self> {
        &mut data.real_data
    }
}

/// A store of named integer and real parameters.
///
/// Integer and real parameters live in separate namespaces, so the same name may be used once
/// for each type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterData {
    #[serde(default)]
    int_data: BTreeMap<String, i64>,
    #[serde(default)]
    real_data: BTreeMap<String, f64>,
}

impl ParameterData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a default-initialized parameter and returns a reference for setting its value.
    ///
    /// Fails with [`KernelError::DuplicateParameter`] if the name is already taken.
    pub fn add<V: ParameterType>(&mut self, name: &str) -> Result<&mut V> {
        let map = V::map_mut(self);
        if map.contains_key(name) {
            return Err(KernelError::DuplicateParameter { name: name.to_string() });
        }
        Ok(map.entry(name.to_string()).or_default())
    }

    /// Adds a parameter with the given value.
    pub fn set<V: ParameterType>(&mut self, name: &str, value: V) -> Result<()> {
        *self.add::<V>(name)? = value;
        Ok(())
    }

    /// Fails with [`KernelError::MissingParameter`] if no parameter of type `V` has the name.
    pub fn get<V: ParameterType>(&self, name: &str) -> Result<V> {
        V::map(self)
            .get(name)
            .copied()
            .ok_or_else(|| KernelError::MissingParameter { name: name.to_string() })
    }

    pub fn contains<V: ParameterType>(&self, name: &str) -> bool {
        V::map(self).contains_key(name)
    }
}
