//! Labeled array types
//!
//! Data is stored row-major; the last axis varies fastest.

use crate::error::{EstatError, EstatResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Named axis with its ordered labels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Axis {
    pub name: String,
    pub labels: Vec<String>,
}

impl Axis {
    pub fn new(name: impl Into<String>, labels: Vec<String>) -> Self {
        Self {
            name: name.into(),
            labels,
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn position(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }
}

/// Dense array of observations; `None` marks a missing value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledArray {
    axes: Vec<Axis>,
    data: Vec<Option<f64>>,
}

/// Arrays keyed by dataset identifier
pub type ArraySet = BTreeMap<String, LabeledArray>;

impl LabeledArray {
    pub fn new(axes: Vec<Axis>, data: Vec<Option<f64>>) -> EstatResult<Self> {
        let expected: usize = axes.iter().map(Axis::len).product();
        if expected != data.len() {
            return Err(EstatError::AxisError(format!(
                "axes describe {} cells but {} values were given",
                expected,
                data.len()
            )));
        }
        Ok(Self { axes, data })
    }

    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    pub fn axis_names(&self) -> Vec<&str> {
        self.axes.iter().map(|a| a.name.as_str()).collect()
    }

    pub fn axis(&self, name: &str) -> Option<&Axis> {
        self.axes.iter().find(|a| a.name == name)
    }

    pub fn ndim(&self) -> usize {
        self.axes.len()
    }

    pub fn shape(&self) -> Vec<usize> {
        self.axes.iter().map(Axis::len).collect()
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn data(&self) -> &[Option<f64>] {
        &self.data
    }

    /// Values as floats, missing observations as `NaN`
    pub fn values_f64(&self) -> Vec<f64> {
        self.data.iter().map(|v| v.unwrap_or(f64::NAN)).collect()
    }

    /// Number of non-missing observations
    pub fn count_present(&self) -> usize {
        self.data.iter().filter(|v| v.is_some()).count()
    }

    /// Look up one cell by its labels, one per axis in axis order.
    pub fn get(&self, labels: &[&str]) -> EstatResult<Option<f64>> {
        if labels.len() != self.axes.len() {
            return Err(EstatError::AxisError(format!(
                "expected {} labels, got {}",
                self.axes.len(),
                labels.len()
            )));
        }

        let mut offset = 0;
        for (axis, label) in self.axes.iter().zip(labels) {
            let pos = axis.position(label).ok_or_else(|| {
                EstatError::AxisError(format!("label '{}' not found on axis '{}'", label, axis.name))
            })?;
            offset = offset * axis.len() + pos;
        }

        Ok(self.data[offset])
    }

    /// Rename an axis.
    pub fn rename(mut self, axis: &str, new_name: &str) -> EstatResult<Self> {
        let idx = self.axis_index(axis)?;
        self.axes[idx].name = new_name.to_string();
        Ok(self)
    }

    /// Rewrite every label of an axis.
    pub fn set_labels<F>(mut self, axis: &str, f: F) -> EstatResult<Self>
    where
        F: Fn(&str) -> String,
    {
        let idx = self.axis_index(axis)?;
        let labels = self.axes[idx].labels.iter().map(|l| f(l)).collect();
        self.axes[idx].labels = labels;
        Ok(self)
    }

    /// Reverse the order of an axis, moving the data with it.
    pub fn reverse(mut self, axis: &str) -> EstatResult<Self> {
        let idx = self.axis_index(axis)?;
        let positions: Vec<usize> = (0..self.axes[idx].len()).rev().collect();
        self.data = self.take(idx, &positions);
        self.axes[idx].labels.reverse();
        Ok(self)
    }

    /// Keep the slice at `label` and drop the axis.
    pub fn select(mut self, axis: &str, label: &str) -> EstatResult<Self> {
        let idx = self.axis_index(axis)?;
        let pos = self.axes[idx].position(label).ok_or_else(|| {
            EstatError::AxisError(format!("label '{}' not found on axis '{}'", label, axis))
        })?;
        self.data = self.take(idx, &[pos]);
        self.axes.remove(idx);
        Ok(self)
    }

    fn axis_index(&self, name: &str) -> EstatResult<usize> {
        self.axes
            .iter()
            .position(|a| a.name == name)
            .ok_or_else(|| EstatError::AxisError(format!("no axis named '{}'", name)))
    }

    /// Gather `positions` along axis `idx`, in that order.
    fn take(&self, idx: usize, positions: &[usize]) -> Vec<Option<f64>> {
        let outer: usize = self.axes[..idx].iter().map(Axis::len).product();
        let len = self.axes[idx].len();
        let inner: usize = self.axes[idx + 1..].iter().map(Axis::len).product();

        let mut out = Vec::with_capacity(outer * positions.len() * inner);
        for o in 0..outer {
            for &p in positions {
                let start = (o * len + p) * inner;
                out.extend_from_slice(&self.data[start..start + inner]);
            }
        }
        out
    }
}
