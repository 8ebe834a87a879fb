//! Reference impedance values and the collapse-if-uniform rule.

use std::fmt;

use itertools::Itertools;
use ndarray::prelude::*;
use num::complex::Complex64;

/// A scalar or an arbitrarily nested sequence of scalars.
#[derive(Clone, Debug, PartialEq)]
pub enum Nested<T> {
    Value(T),
    Seq(Vec<Nested<T>>),
}

impl<T> Nested<T> {
    pub fn from_values(values: Vec<T>) -> Self {
        Nested::Seq(values.into_iter().map(Nested::Value).collect())
    }

    pub fn from_rows(rows: Vec<Vec<T>>) -> Self {
        Nested::Seq(rows.into_iter().map(Nested::from_values).collect())
    }

    /// Leaves in depth-first order, outer to inner, left to right.
    pub fn flatten(&self) -> Vec<&T> {
        let mut leaves = vec![];
        self.collect_leaves(&mut leaves);
        leaves
    }

    fn collect_leaves<'a>(&'a self, leaves: &mut Vec<&'a T>) {
        match self {
            Nested::Value(v) => leaves.push(v),
            Nested::Seq(items) => {
                for item in items {
                    item.collect_leaves(leaves);
                }
            }
        }
    }

    pub fn as_scalar(&self) -> Option<&T> {
        match self {
            Nested::Value(v) => Some(v),
            Nested::Seq(_) => None,
        }
    }
}

impl<T: Clone + PartialEq> Nested<T> {
    /// Replaces a structure whose leaves are all exactly equal by that single
    /// value. Scalars, empty structures and mixed structures come back as is.
    pub fn collapse_uniform(self) -> Nested<T> {
        if let Nested::Seq(_) = self {
            let uniform = {
                let leaves = self.flatten();
                match leaves.first() {
                    Some(first) if leaves.iter().all_equal() => Some((*first).clone()),
                    _ => None,
                }
            };
            if let Some(value) = uniform {
                return Nested::Value(value);
            }
        }
        self
    }
}

impl<T: fmt::Display> fmt::Display for Nested<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Nested::Value(v) => write!(f, "{}", v),
            Nested::Seq(items) => write!(f, "[{}]", items.iter().join(", ")),
        }
    }
}

/// Reference impedance of a network in ohms.
pub type ReferenceImpedance = Nested<Complex64>;

impl From<ArrayView2<'_, Complex64>> for Nested<Complex64> {
    fn from(z0: ArrayView2<'_, Complex64>) -> Self {
        Nested::Seq(
            z0.outer_iter()
                .map(|row| Nested::Seq(row.iter().copied().map(Nested::Value).collect()))
                .collect(),
        )
    }
}

impl From<Array2<Complex64>> for Nested<Complex64> {
    fn from(z0: Array2<Complex64>) -> Self {
        Nested::from(z0.view())
    }
}

/// One real resistance per port.
impl From<Vec<f64>> for Nested<Complex64> {
    fn from(resistances: Vec<f64>) -> Self {
        Nested::from_values(
            resistances
                .into_iter()
                .map(|r| Complex64::new(r, 0.))
                .collect(),
        )
    }
}
