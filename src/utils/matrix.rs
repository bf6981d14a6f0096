//! Row-major `f32` matrix used for layer weights and gradients.
//!
//! Only the products backpropagation needs are provided. Shape preconditions
//! are asserted: layers validate caller input before reaching these helpers.

use serde::{Deserialize, Serialize};

/// Dense matrix stored row-major (`rows × cols`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl Matrix {
    /// Zero-filled matrix.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, 0.0)
    }

    /// Matrix with every entry set to `value`.
    pub fn filled(rows: usize, cols: usize, value: f32) -> Self {
        Self {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }

    /// Wraps row-major data. Returns `None` when `data.len() != rows * cols`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f32>) -> Option<Self> {
        if data.len() != rows * cols {
            return None;
        }
        Some(Self { rows, cols, data })
    }

    /// Builds a matrix from equally sized rows. Returns `None` on ragged input.
    ///
    /// An empty slice yields a `0 × 0` matrix.
    pub fn from_rows(rows: &[Vec<f32>]) -> Option<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|row| row.len() != cols) {
            return None;
        }
        let data = rows.iter().flatten().copied().collect();
        Some(Self {
            rows: rows.len(),
            cols,
            data,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[row * self.cols + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: f32) {
        self.data[row * self.cols + col] = value;
    }

    pub fn row(&self, row: usize) -> &[f32] {
        let start = row * self.cols;
        &self.data[start..start + self.cols]
    }

    pub fn row_mut(&mut self, row: usize) -> &mut [f32] {
        let start = row * self.cols;
        &mut self.data[start..start + self.cols]
    }

    /// Copies the matrix into one `Vec` per row.
    pub fn to_rows(&self) -> Vec<Vec<f32>> {
        (0..self.rows).map(|r| self.row(r).to_vec()).collect()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Sets every entry to `value`.
    pub fn fill(&mut self, value: f32) {
        self.data.iter_mut().for_each(|entry| *entry = value);
    }

    /// `self · x` for a vector of length `cols`.
    pub fn mul_vec(&self, x: &[f32]) -> Vec<f32> {
        assert_eq!(x.len(), self.cols, "mul_vec: vector length mismatch");
        (0..self.rows)
            .map(|r| self.row(r).iter().zip(x).map(|(w, v)| w * v).sum())
            .collect()
    }

    /// `selfᵀ · y` for a vector of length `rows`.
    pub fn transpose_mul_vec(&self, y: &[f32]) -> Vec<f32> {
        assert_eq!(y.len(), self.rows, "transpose_mul_vec: vector length mismatch");
        let mut out = vec![0.0f32; self.cols];
        for (r, &scale) in y.iter().enumerate() {
            for (acc, &w) in out.iter_mut().zip(self.row(r)) {
                *acc += w * scale;
            }
        }
        out
    }

    /// Outer product `a · bᵀ` (`a.len() × b.len()`).
    pub fn outer(a: &[f32], b: &[f32]) -> Self {
        let mut data = Vec::with_capacity(a.len() * b.len());
        for &left in a {
            data.extend(b.iter().map(|&right| left * right));
        }
        Self {
            rows: a.len(),
            cols: b.len(),
            data,
        }
    }

    /// `self += factor * other`.
    pub fn add_scaled(&mut self, other: &Matrix, factor: f32) {
        assert_eq!(self.shape(), other.shape(), "add_scaled: shape mismatch");
        for (value, &delta) in self.data.iter_mut().zip(&other.data) {
            *value += factor * delta;
        }
    }

    /// Multiplies every entry by `factor`.
    pub fn scale(&mut self, factor: f32) {
        self.data.iter_mut().for_each(|value| *value *= factor);
    }

    /// Sum of squared entries.
    pub fn sum_of_squares(&self) -> f32 {
        self.data.iter().map(|w| w * w).sum()
    }
}
