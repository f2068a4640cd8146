//! Labeled N-dimensional dataset model.
//!
//! A [`Dataset`] is a set of named [`Variable`]s sharing one dimension
//! namespace, a subset of which are flagged as coordinates, plus
//! dataset-level attributes. Array payloads are reference counted so that
//! relabeling a variable or copying it between datasets never duplicates
//! the values; every numeric transformation allocates a fresh array.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use ndarray::{Array1, ArrayD, Axis as NdAxis, IxDyn};
use serde_json::Value;

use crate::error::{NemoError, NemoResult};

/// Attribute map shared by variables and datasets.
pub type Attributes = serde_json::Map<String, Value>;

/// A named-dimension array with attributes.
#[derive(Debug, Clone)]
pub struct Variable {
    dims: Vec<String>,
    data: Arc<ArrayD<f64>>,
    attrs: Attributes,
}

impl Variable {
    /// Create a variable, checking that one name is given per array axis.
    pub fn new<S: Into<String>>(dims: Vec<S>, data: ArrayD<f64>) -> NemoResult<Self> {
        let dims: Vec<String> = dims.into_iter().map(Into::into).collect();
        if dims.len() != data.ndim() {
            return Err(NemoError::DimensionMismatch {
                dims_given: dims,
                ndim: data.ndim(),
            });
        }
        Ok(Self {
            dims,
            data: Arc::new(data),
            attrs: Attributes::new(),
        })
    }

    /// Create a variable from row-major values.
    pub fn from_shape_vec<S: Into<String>>(
        dims: Vec<S>,
        shape: &[usize],
        values: Vec<f64>,
    ) -> NemoResult<Self> {
        let data = ArrayD::from_shape_vec(IxDyn(shape), values)
            .map_err(|e| NemoError::InvalidShape(format!("{:?}: {}", shape, e)))?;
        Self::new(dims, data)
    }

    /// A zero-dimensional variable.
    pub fn scalar(value: f64) -> Self {
        Self {
            dims: Vec::new(),
            data: Arc::new(ArrayD::from_elem(IxDyn(&[]), value)),
            attrs: Attributes::new(),
        }
    }

    /// A one-dimensional variable along `dim`.
    pub fn coordinate(dim: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            dims: vec![dim.into()],
            data: Arc::new(Array1::from(values).into_dyn()),
            attrs: Attributes::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    pub fn dims(&self) -> &[String] {
        &self.dims
    }

    pub fn data(&self) -> &ArrayD<f64> {
        &self.data
    }

    /// Shared handle to the payload.
    pub fn shared_data(&self) -> Arc<ArrayD<f64>> {
        Arc::clone(&self.data)
    }

    pub fn attrs(&self) -> &Attributes {
        &self.attrs
    }

    pub fn attrs_mut(&mut self) -> &mut Attributes {
        &mut self.attrs
    }

    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.attrs.insert(key.into(), value.into());
    }

    /// String attribute, if present and a string.
    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).and_then(Value::as_str)
    }

    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn has_dim(&self, dim: &str) -> bool {
        self.dims.iter().any(|d| d == dim)
    }

    /// Array axis index of a named dimension.
    pub fn axis_of(&self, dim: &str) -> Option<usize> {
        self.dims.iter().position(|d| d == dim)
    }

    /// Length along a named dimension.
    pub fn len_of(&self, dim: &str) -> Option<usize> {
        self.axis_of(dim).map(|i| self.data.len_of(NdAxis(i)))
    }

    /// Rename one dimension of this variable. No-op when absent.
    pub fn rename_dim(&mut self, old: &str, new: &str) {
        for d in self.dims.iter_mut() {
            if d == old {
                *d = new.to_string();
            }
        }
    }

    /// Same dimensions and attributes, new payload.
    pub fn with_data(&self, data: ArrayD<f64>) -> NemoResult<Self> {
        let mut var = Self::new(self.dims.clone(), data)?;
        var.attrs = self.attrs.clone();
        Ok(var)
    }

    /// Same payload and attributes under new dimension names.
    pub fn with_dims<S: Into<String>>(&self, dims: Vec<S>) -> NemoResult<Self> {
        let dims: Vec<String> = dims.into_iter().map(Into::into).collect();
        if dims.len() != self.data.ndim() {
            return Err(NemoError::DimensionMismatch {
                dims_given: dims,
                ndim: self.data.ndim(),
            });
        }
        Ok(Self {
            dims,
            data: Arc::clone(&self.data),
            attrs: self.attrs.clone(),
        })
    }

    /// Apply `f` element-wise into a new variable.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            dims: self.dims.clone(),
            data: Arc::new(self.data.mapv(f)),
            attrs: self.attrs.clone(),
        }
    }

    /// Value of a zero-dimensional variable.
    pub fn scalar_value(&self) -> Option<f64> {
        if self.ndim() == 0 {
            self.data.iter().next().copied()
        } else {
            None
        }
    }

    /// Values of a one-dimensional variable.
    pub fn values_1d(&self) -> Option<Vec<f64>> {
        if self.ndim() == 1 {
            Some(self.data.iter().copied().collect())
        } else {
            None
        }
    }

    /// Drop a length-one dimension.
    pub fn squeeze(&self, dim: &str) -> Option<Self> {
        let axis = self.axis_of(dim)?;
        if self.data.len_of(NdAxis(axis)) != 1 {
            return None;
        }
        let data = self.data.index_axis(NdAxis(axis), 0).to_owned();
        let mut dims = self.dims.clone();
        dims.remove(axis);
        Some(Self {
            dims,
            data: Arc::new(data),
            attrs: self.attrs.clone(),
        })
    }

    /// Element-wise comparison; NaN equals NaN.
    pub fn values_eq(&self, other: &Variable, tolerance: f64) -> bool {
        if self.dims != other.dims || self.shape() != other.shape() {
            return false;
        }
        self.data
            .iter()
            .zip(other.data.iter())
            .all(|(a, b)| (a.is_nan() && b.is_nan()) || (a - b).abs() <= tolerance)
    }

    /// Values and attributes equal.
    pub fn approx_eq(&self, other: &Variable, tolerance: f64) -> bool {
        self.values_eq(other, tolerance) && self.attrs == other.attrs
    }
}

/// Named variables over a shared dimension namespace.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    variables: BTreeMap<String, Variable>,
    coords: BTreeSet<String>,
    attrs: Attributes,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    /// Variable lookup that fails with `MissingVariable`.
    pub fn require(&self, name: &str) -> NemoResult<&Variable> {
        self.variables
            .get(name)
            .ok_or_else(|| NemoError::missing_variable(name))
    }

    /// Mutable access to one variable's attributes.
    pub fn var_attrs_mut(&mut self, name: &str) -> Option<&mut Attributes> {
        self.variables.get_mut(name).map(Variable::attrs_mut)
    }

    /// Insert or replace a data variable, keeping its coordinate flag if it
    /// already was a coordinate.
    pub fn insert(&mut self, name: impl Into<String>, var: Variable) -> NemoResult<()> {
        let name = name.into();
        self.check_dims(&name, &var)?;
        self.variables.insert(name, var);
        Ok(())
    }

    /// Insert or replace a variable and flag it as a coordinate.
    pub fn insert_coord(&mut self, name: impl Into<String>, var: Variable) -> NemoResult<()> {
        let name = name.into();
        self.insert(name.clone(), var)?;
        self.coords.insert(name);
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Option<Variable> {
        self.coords.remove(name);
        self.variables.remove(name)
    }

    /// Flag an existing variable as coordinate.
    pub fn set_coord(&mut self, name: &str) -> bool {
        if self.variables.contains_key(name) {
            self.coords.insert(name.to_string());
            true
        } else {
            false
        }
    }

    pub fn is_coord(&self, name: &str) -> bool {
        self.coords.contains(name)
    }

    /// All variable names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }

    pub fn variables(&self) -> impl Iterator<Item = (&str, &Variable)> {
        self.variables.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Variables that are not coordinates.
    pub fn data_vars(&self) -> impl Iterator<Item = (&str, &Variable)> {
        self.variables
            .iter()
            .filter(|(k, _)| !self.coords.contains(*k))
            .map(|(k, v)| (k.as_str(), v))
    }

    pub fn coords(&self) -> impl Iterator<Item = (&str, &Variable)> {
        self.variables
            .iter()
            .filter(|(k, _)| self.coords.contains(*k))
            .map(|(k, v)| (k.as_str(), v))
    }

    pub fn coord_names(&self) -> impl Iterator<Item = &str> {
        self.coords.iter().map(String::as_str)
    }

    pub fn attrs(&self) -> &Attributes {
        &self.attrs
    }

    pub fn attrs_mut(&mut self) -> &mut Attributes {
        &mut self.attrs
    }

    /// Dimension lengths over all variables.
    pub fn dims(&self) -> BTreeMap<String, usize> {
        let mut dims = BTreeMap::new();
        for var in self.variables.values() {
            for (d, n) in var.dims().iter().zip(var.shape()) {
                dims.entry(d.clone()).or_insert(*n);
            }
        }
        dims
    }

    pub fn dim_len(&self, dim: &str) -> Option<usize> {
        self.variables.values().find_map(|v| v.len_of(dim))
    }

    pub fn has_dim(&self, dim: &str) -> bool {
        self.variables.values().any(|v| v.has_dim(dim))
    }

    fn check_dims(&self, name: &str, var: &Variable) -> NemoResult<()> {
        for (dim, found) in var.dims().iter().zip(var.shape()) {
            let expected = self
                .variables
                .iter()
                .filter(|(k, _)| k.as_str() != name)
                .find_map(|(_, v)| v.len_of(dim));
            if let Some(expected) = expected {
                if expected != *found {
                    return Err(NemoError::ShapeMismatch {
                        name: name.to_string(),
                        dim: dim.clone(),
                        expected,
                        found: *found,
                    });
                }
            }
        }
        Ok(())
    }

    /// Rename a dimension in every variable.
    pub fn rename_dim(&mut self, old: &str, new: &str) -> NemoResult<()> {
        if old == new || !self.has_dim(old) {
            return Ok(());
        }
        if let (Some(a), Some(b)) = (self.dim_len(old), self.dim_len(new)) {
            if a != b {
                return Err(NemoError::ShapeMismatch {
                    name: old.to_string(),
                    dim: new.to_string(),
                    expected: b,
                    found: a,
                });
            }
        }
        for var in self.variables.values_mut() {
            var.rename_dim(old, new);
        }
        Ok(())
    }

    /// Rename a variable, keeping its coordinate flag.
    pub fn rename_var(&mut self, old: &str, new: &str) -> NemoResult<()> {
        if old == new {
            return Ok(());
        }
        let was_coord = self.coords.contains(old);
        let var = self
            .remove(old)
            .ok_or_else(|| NemoError::missing_variable(old))?;
        self.remove(new);
        self.variables.insert(new.to_string(), var);
        if was_coord {
            self.coords.insert(new.to_string());
        }
        Ok(())
    }

    /// Rename both a variable and a dimension of the same name, whichever exist.
    pub fn rename(&mut self, old: &str, new: &str) -> NemoResult<()> {
        if self.contains(old) {
            self.rename_var(old, new)?;
        }
        self.rename_dim(old, new)
    }

    /// Remove every variable that uses any of `dims`.
    pub fn drop_dims(&mut self, dims: &[&str]) {
        let doomed: Vec<String> = self
            .variables
            .iter()
            .filter(|(_, v)| dims.iter().any(|d| v.has_dim(d)))
            .map(|(k, _)| k.clone())
            .collect();
        for name in doomed {
            self.remove(&name);
        }
    }

    /// Remove a length-one dimension from every variable.
    ///
    /// Returns `false` when the dimension is absent or longer than one.
    pub fn squeeze(&mut self, dim: &str) -> bool {
        if self.dim_len(dim) != Some(1) {
            return false;
        }
        for var in self.variables.values_mut() {
            if let Some(squeezed) = var.squeeze(dim) {
                *var = squeezed;
            }
        }
        true
    }

    /// Add the variables of `other`.
    ///
    /// Existing names are kept unless `overwrite` is set. Coordinate flags
    /// travel with the variables.
    pub fn union_with(&mut self, other: &Dataset, overwrite: bool) -> NemoResult<()> {
        for (name, var) in other.variables() {
            if self.contains(name) && !overwrite {
                continue;
            }
            self.insert(name, var.clone())?;
            if other.is_coord(name) {
                self.coords.insert(name.to_string());
            }
        }
        Ok(())
    }

    /// Structural equality with a tolerance on values.
    pub fn approx_eq(&self, other: &Dataset, tolerance: f64) -> bool {
        self.coords == other.coords
            && self.attrs == other.attrs
            && self.variables.len() == other.variables.len()
            && self.variables.iter().all(|(name, var)| {
                other
                    .variables
                    .get(name)
                    .map(|o| var.approx_eq(o, tolerance))
                    .unwrap_or(false)
            })
    }
}
