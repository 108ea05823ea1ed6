//! Parameter layout `[β_S | β_O | γ_σ | δ_ρ]` and the free/fixed split.
//!
//! Purpose
//! -------
//! Fix, for the lifetime of one fit, where each equation's coefficients sit
//! in the full parameter vector, and map between that vector and the
//! sub-vector of free parameters the optimizer actually sees.
//!
//! Key behaviors
//! -------------
//! - [`ParamLayout`] records the four block widths and hands out index
//!   ranges and views per [`Block`].
//! - [`FreeParams`] holds a template full vector (supplying fixed values)
//!   plus the sorted free indices; `restrict`/`expand` move between spaces.
//!
//! Invariants & assumptions
//! ------------------------
//! - Block order is always selection, outcome, dispersion, correlation.
//! - Fixed indices are unique and in range; at least one parameter is free.
use crate::selection::errors::{SelectionError, SelectionResult};
use ndarray::{Array1, ArrayView1, s};
use std::ops::Range;

/// The four linked equations of a generalized Heckman model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Block {
    Selection,
    Outcome,
    Dispersion,
    Correlation,
}

impl Block {
    pub const ALL: [Block; 4] =
        [Block::Selection, Block::Outcome, Block::Dispersion, Block::Correlation];

    fn position(self) -> usize {
        match self {
            Block::Selection => 0,
            Block::Outcome => 1,
            Block::Dispersion => 2,
            Block::Correlation => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Block::Selection => "selection",
            Block::Outcome => "outcome",
            Block::Dispersion => "dispersion",
            Block::Correlation => "correlation",
        }
    }
}

impl std::fmt::Display for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Block widths of the full parameter vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamLayout {
    widths: [usize; 4],
}

impl ParamLayout {
    pub fn new(selection: usize, outcome: usize, dispersion: usize, correlation: usize) -> Self {
        Self { widths: [selection, outcome, dispersion, correlation] }
    }

    pub fn width(&self, block: Block) -> usize {
        self.widths[block.position()]
    }

    /// Total parameter count `k`.
    pub fn len(&self) -> usize {
        self.widths.iter().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn range(&self, block: Block) -> Range<usize> {
        let start: usize = self.widths[..block.position()].iter().sum();
        start..start + self.width(block)
    }

    /// View of one block of a full parameter vector.
    ///
    /// Panics
    /// ------
    /// - If `theta.len() < self.len()`.
    pub fn view<'a>(&self, theta: &'a Array1<f64>, block: Block) -> ArrayView1<'a, f64> {
        let r = self.range(block);
        theta.slice(s![r.start..r.end])
    }

    /// Length and finiteness check for a full parameter vector.
    ///
    /// Errors
    /// ------
    /// - `ParamLengthMismatch`, `NonFiniteParameter`.
    pub fn check(&self, theta: &Array1<f64>) -> SelectionResult<()> {
        if theta.len() != self.len() {
            return Err(SelectionError::ParamLengthMismatch {
                expected: self.len(),
                actual: theta.len(),
            });
        }
        check_finite(theta)
    }
}

pub(crate) fn check_finite(theta: &Array1<f64>) -> SelectionResult<()> {
    match theta.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        Some((index, &value)) => Err(SelectionError::NonFiniteParameter { index, value }),
        None => Ok(()),
    }
}

/// Free-parameter view of a full vector with some entries held fixed.
#[derive(Debug, Clone, PartialEq)]
pub struct FreeParams {
    template: Array1<f64>,
    free: Vec<usize>,
}

impl FreeParams {
    /// Parameters
    /// ----------
    /// - `template`: full vector; fixed entries keep these values.
    /// - `fixed`: full-vector indices held fixed (duplicates allowed).
    ///
    /// Errors
    /// ------
    /// - `InvalidFixedIndex` for an out-of-range index.
    /// - `NoFreeParameters` when every index is fixed.
    pub fn new(template: Array1<f64>, fixed: &[usize]) -> SelectionResult<Self> {
        let k = template.len();
        let mut is_fixed = vec![false; k];
        for &index in fixed {
            if index >= k {
                return Err(SelectionError::InvalidFixedIndex { index, len: k });
            }
            is_fixed[index] = true;
        }
        let free: Vec<usize> = (0..k).filter(|&i| !is_fixed[i]).collect();
        if free.is_empty() {
            return Err(SelectionError::NoFreeParameters);
        }
        Ok(Self { template, free })
    }

    /// Full vector supplying the fixed values.
    pub fn template(&self) -> &Array1<f64> {
        &self.template
    }

    /// Full indices of the free parameters, ascending.
    pub fn indices(&self) -> &[usize] {
        &self.free
    }

    pub fn n_free(&self) -> usize {
        self.free.len()
    }

    pub fn n_full(&self) -> usize {
        self.template.len()
    }

    /// Pick the free entries of a full vector (parameters or gradient).
    pub fn restrict(&self, full: &Array1<f64>) -> Array1<f64> {
        self.free.iter().map(|&i| full[i]).collect()
    }

    /// Fill the template's free entries from `free_theta`.
    pub fn expand(&self, free_theta: &Array1<f64>) -> Array1<f64> {
        let mut full = self.template.clone();
        for (&i, &v) in self.free.iter().zip(free_theta.iter()) {
            full[i] = v;
        }
        full
    }
}
