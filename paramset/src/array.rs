//! Small N-dimensional numeric array.
//!
//! Backs the `Array` value variant: row-major `f64` storage plus the handful
//! of operations the expression sandbox exposes — transpose, matrix multiply,
//! elementwise arithmetic with scalar broadcast, and multi-axis indexing and
//! slicing. Registries are human-authored parameter sets, so none of this is
//! tuned for large data.

use std::fmt;

use crate::error::Error;

/// Row-major N-dimensional array of `f64`.
#[derive(Debug, Clone, PartialEq)]
pub struct NdArray {
    shape: Vec<usize>,
    data: Vec<f64>,
}

/// One axis of a multi-axis subscript.
///
/// Negative positions count from the end of the axis, as in `a[-1]`.
#[derive(Debug, Clone, PartialEq)]
pub enum AxisIndex {
    /// A single position; the axis is dropped from the result.
    At(i64),
    /// A `start:stop:step` span; the axis is kept.
    Span {
        start: Option<i64>,
        stop: Option<i64>,
        step: Option<i64>,
    },
}

/// Result of indexing: a scalar when every axis was a single position,
/// otherwise a smaller array.
#[derive(Debug, Clone, PartialEq)]
pub enum Indexed {
    Scalar(f64),
    Array(NdArray),
}

impl NdArray {
    /// Build an array from an explicit shape and row-major data.
    pub fn new(shape: Vec<usize>, data: Vec<f64>) -> Result<Self, Error> {
        let expect: usize = shape.iter().product();
        if expect != data.len() {
            return Err(Error::Evaluation(format!(
                "shape {:?} needs {} elements, got {}",
                shape,
                expect,
                data.len()
            )));
        }
        Ok(NdArray { shape, data })
    }

    /// 1-D array from a vector.
    pub fn from_vec(data: Vec<f64>) -> Self {
        NdArray { shape: vec![data.len()], data }
    }

    /// 2-D array from rows. All rows must have the same length.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, Error> {
        let ncols = rows.first().map(Vec::len).unwrap_or(0);
        if rows.iter().any(|r| r.len() != ncols) {
            return Err(Error::Evaluation("ragged rows in array literal".into()));
        }
        let nrows = rows.len();
        let data: Vec<f64> = rows.into_iter().flatten().collect();
        Ok(NdArray { shape: vec![nrows, ncols], data })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Row-major strides for the current shape.
    fn strides(&self) -> Vec<usize> {
        let mut strides = vec![1usize; self.shape.len()];
        for i in (0..self.shape.len().saturating_sub(1)).rev() {
            strides[i] = strides[i + 1] * self.shape[i + 1];
        }
        strides
    }

    /// Transpose: axis order reversed. A 1-D array transposes to itself.
    pub fn transpose(&self) -> NdArray {
        if self.ndim() <= 1 {
            return self.clone();
        }
        let out_shape: Vec<usize> = self.shape.iter().rev().copied().collect();
        let in_strides = self.strides();
        let mut out = NdArray {
            shape: out_shape,
            data: vec![0.0; self.data.len()],
        };
        let out_strides = out.strides();
        let ndim = self.ndim();
        // Walk every input element, mirror its multi-index into the output.
        let mut idx = vec![0usize; ndim];
        for (flat, &v) in self.data.iter().enumerate() {
            let mut rem = flat;
            for d in 0..ndim {
                idx[d] = rem / in_strides[d];
                rem %= in_strides[d];
            }
            let mut out_flat = 0usize;
            for d in 0..ndim {
                out_flat += idx[ndim - 1 - d] * out_strides[d];
            }
            out.data[out_flat] = v;
        }
        out
    }

    /// Matrix multiply. Both operands must be 2-D with compatible shapes.
    pub fn matmul(&self, rhs: &NdArray) -> Result<NdArray, Error> {
        if self.ndim() != 2 || rhs.ndim() != 2 {
            return Err(Error::Evaluation(
                "matrix multiply requires two 2-D arrays".into(),
            ));
        }
        let (m, k) = (self.shape[0], self.shape[1]);
        let (k2, n) = (rhs.shape[0], rhs.shape[1]);
        if k != k2 {
            return Err(Error::Evaluation(format!(
                "matrix shapes {m}\u{d7}{k} and {k2}\u{d7}{n} are not aligned"
            )));
        }
        let mut data = vec![0.0; m * n];
        for i in 0..m {
            for j in 0..n {
                let mut acc = 0.0;
                for p in 0..k {
                    acc += self.data[i * k + p] * rhs.data[p * n + j];
                }
                data[i * n + j] = acc;
            }
        }
        Ok(NdArray { shape: vec![m, n], data })
    }

    /// Elementwise combine with another array of identical shape.
    pub fn zip_with(&self, rhs: &NdArray, f: impl Fn(f64, f64) -> f64) -> Result<NdArray, Error> {
        if self.shape != rhs.shape {
            return Err(Error::Evaluation(format!(
                "array shapes {:?} and {:?} do not match",
                self.shape, rhs.shape
            )));
        }
        let data = self
            .data
            .iter()
            .zip(rhs.data.iter())
            .map(|(&a, &b)| f(a, b))
            .collect();
        Ok(NdArray { shape: self.shape.clone(), data })
    }

    /// Elementwise map (also used for scalar broadcast).
    pub fn map(&self, f: impl Fn(f64) -> f64) -> NdArray {
        NdArray {
            shape: self.shape.clone(),
            data: self.data.iter().map(|&a| f(a)).collect(),
        }
    }

    /// Multi-axis subscript. Fewer indices than dimensions leaves the
    /// trailing axes intact; a single `At` on every axis yields a scalar.
    pub fn index(&self, axes: &[AxisIndex]) -> Result<Indexed, Error> {
        if axes.len() > self.ndim() {
            return Err(Error::Evaluation(format!(
                "too many indices ({}) for {}-D array",
                axes.len(),
                self.ndim()
            )));
        }
        // Per axis: the positions selected, and whether the axis survives.
        let mut picks: Vec<(Vec<usize>, bool)> = Vec::with_capacity(self.ndim());
        for (d, dim) in self.shape.iter().copied().enumerate() {
            match axes.get(d) {
                None => picks.push(((0..dim).collect(), true)),
                Some(AxisIndex::At(i)) => {
                    let i = normalize(*i, dim).ok_or_else(|| {
                        Error::Evaluation(format!("index {i} out of bounds for axis of length {dim}"))
                    })?;
                    picks.push((vec![i], false));
                }
                Some(AxisIndex::Span { start, stop, step }) => {
                    picks.push((span_indices(*start, *stop, *step, dim)?, true));
                }
            }
        }

        let out_shape: Vec<usize> = picks
            .iter()
            .filter(|(_, keep)| *keep)
            .map(|(sel, _)| sel.len())
            .collect();
        let strides = self.strides();

        if picks.iter().any(|(sel, _)| sel.is_empty()) {
            return Ok(Indexed::Array(NdArray { shape: out_shape, data: Vec::new() }));
        }

        // Cartesian product of the per-axis selections, in row-major order.
        let mut data = Vec::with_capacity(out_shape.iter().product::<usize>().max(1));
        let mut cursor = vec![0usize; picks.len()];
        'outer: loop {
            let flat: usize = cursor
                .iter()
                .zip(picks.iter())
                .zip(strides.iter())
                .map(|((&c, (sel, _)), &s)| sel[c] * s)
                .sum();
            data.push(self.data[flat]);
            // Odometer increment over the selection lengths.
            for d in (0..picks.len()).rev() {
                cursor[d] += 1;
                if cursor[d] < picks[d].0.len() {
                    continue 'outer;
                }
                cursor[d] = 0;
            }
            break;
        }

        if out_shape.is_empty() {
            Ok(Indexed::Scalar(data[0]))
        } else {
            Ok(Indexed::Array(NdArray { shape: out_shape, data }))
        }
    }

    /// Compact Matlab-style description, e.g. `[1 0.2 0.03] (double)` or
    /// `[4×4 double]`.
    pub fn format_brief(&self) -> String {
        const MAX_INLINE: usize = 10;
        match self.ndim() {
            1 if self.len() <= MAX_INLINE => {
                let body: Vec<String> = self.data.iter().map(|&v| fmt_f64(v)).collect();
                format!("[{}] (double)", body.join(" "))
            }
            1 => format!("[{}\u{d7}1 double]", self.len()),
            2 => {
                let (rows, cols) = (self.shape[0], self.shape[1]);
                if rows == 1 && cols <= MAX_INLINE {
                    let body: Vec<String> = self.data.iter().map(|&v| fmt_f64(v)).collect();
                    format!("[{}] (double)", body.join(" "))
                } else if cols == 1 && rows <= MAX_INLINE {
                    let body: Vec<String> = self.data.iter().map(|&v| fmt_f64(v)).collect();
                    format!("[{}]T (double)", body.join(" "))
                } else {
                    format!("[{rows}\u{d7}{cols} double]")
                }
            }
            _ => {
                let dims: Vec<String> = self.shape.iter().map(|d| d.to_string()).collect();
                format!("[{} array (double)]", dims.join("\u{d7}"))
            }
        }
    }
}

/// Nested-list text form, re-parseable by the expression grammar.
impl fmt::Display for NdArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn rec(
            f: &mut fmt::Formatter<'_>,
            shape: &[usize],
            data: &[f64],
        ) -> fmt::Result {
            if shape.len() <= 1 {
                write!(f, "[")?;
                for (i, v) in data.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", fmt_f64(*v))?;
                }
                return write!(f, "]");
            }
            // An empty leading axis has no rows to chunk.
            if shape[0] == 0 {
                return write!(f, "[]");
            }
            let chunk = data.len() / shape[0];
            write!(f, "[")?;
            for i in 0..shape[0] {
                if i > 0 {
                    write!(f, ", ")?;
                }
                rec(f, &shape[1..], &data[i * chunk..(i + 1) * chunk])?;
            }
            write!(f, "]")
        }
        rec(f, &self.shape, &self.data)
    }
}

/// Format an `f64` the way the rest of the crate prints floats: whole values
/// keep one decimal so they read back as floats.
pub fn fmt_f64(x: f64) -> String {
    if x.fract() == 0.0 && x.abs() < 1e15 && x.is_finite() {
        format!("{x:.1}")
    } else {
        format!("{x}")
    }
}

fn normalize(i: i64, dim: usize) -> Option<usize> {
    let dim = dim as i64;
    let i = if i < 0 { i + dim } else { i };
    if (0..dim).contains(&i) {
        Some(i as usize)
    } else {
        None
    }
}

/// Expand a `start:stop:step` span into concrete positions, with Python
/// defaulting and clamping rules.
fn span_indices(
    start: Option<i64>,
    stop: Option<i64>,
    step: Option<i64>,
    dim: usize,
) -> Result<Vec<usize>, Error> {
    let step = step.unwrap_or(1);
    if step == 0 {
        return Err(Error::Evaluation("slice step cannot be zero".into()));
    }
    let d = dim as i64;
    let clamp = |i: i64| -> i64 {
        let i = if i < 0 { i + d } else { i };
        i.clamp(-1, d)
    };
    let mut out = Vec::new();
    if step > 0 {
        let mut i = clamp(start.unwrap_or(0)).max(0);
        let stop = clamp(stop.unwrap_or(d)).min(d);
        while i < stop {
            out.push(i as usize);
            i += step;
        }
    } else {
        let mut i = clamp(start.unwrap_or(d - 1)).min(d - 1);
        let stop = match stop {
            Some(s) => clamp(s),
            None => -1,
        };
        while i > stop {
            out.push(i as usize);
            i += step;
        }
    }
    Ok(out)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn mat4() -> NdArray {
        NdArray::from_rows(vec![
            vec![1.0, 2.0, 3.0, 4.0],
            vec![5.0, 6.0, 7.0, 8.0],
            vec![9.0, 10.0, 11.0, 12.0],
            vec![13.0, 14.0, 15.0, 16.0],
        ])
        .unwrap()
    }

    #[test]
    fn shape_checks() {
        assert!(NdArray::new(vec![2, 2], vec![1.0, 2.0, 3.0]).is_err());
        assert!(NdArray::from_rows(vec![vec![1.0], vec![1.0, 2.0]]).is_err());
    }

    #[test]
    fn transpose_2d() {
        let a = NdArray::from_rows(vec![vec![1.0, 2.0, 3.0]]).unwrap();
        let t = a.transpose();
        assert_eq!(t.shape(), &[3, 1]);
        assert_eq!(t.data(), &[1.0, 2.0, 3.0]);
        // Double transpose is the identity.
        assert_eq!(t.transpose(), a);
    }

    #[test]
    fn transpose_1d_is_identity() {
        let a = NdArray::from_vec(vec![1.0, 2.0]);
        assert_eq!(a.transpose(), a);
    }

    #[test]
    fn matmul_outer_product() {
        let row = NdArray::from_rows(vec![vec![1.0, 0.2]]).unwrap();
        let col = row.transpose();
        let outer = col.matmul(&row).unwrap();
        assert_eq!(outer.shape(), &[2, 2]);
        assert_eq!(outer.data(), &[1.0, 0.2, 0.2, 0.04000000000000001]);
        let inner = row.matmul(&col).unwrap();
        assert_eq!(inner.shape(), &[1, 1]);
    }

    #[test]
    fn matmul_shape_mismatch() {
        let a = NdArray::from_rows(vec![vec![1.0, 2.0]]).unwrap();
        assert!(a.matmul(&a).is_err());
    }

    #[test]
    fn elementwise_and_broadcast() {
        let a = NdArray::from_vec(vec![1.0, 2.0, 3.0]);
        let doubled = a.map(|x| x * 2.0);
        assert_eq!(doubled.data(), &[2.0, 4.0, 6.0]);
        let sum = a.zip_with(&doubled, |x, y| x + y).unwrap();
        assert_eq!(sum.data(), &[3.0, 6.0, 9.0]);
    }

    #[test]
    fn index_scalar() {
        let m = mat4();
        match m.index(&[AxisIndex::At(0), AxisIndex::At(1)]).unwrap() {
            Indexed::Scalar(v) => assert_eq!(v, 2.0),
            other => panic!("expected scalar, got {other:?}"),
        }
    }

    #[test]
    fn index_negative() {
        let m = mat4();
        match m.index(&[AxisIndex::At(-1), AxisIndex::At(-1)]).unwrap() {
            Indexed::Scalar(v) => assert_eq!(v, 16.0),
            other => panic!("expected scalar, got {other:?}"),
        }
    }

    #[test]
    fn slice_rows_pick_column() {
        // m[0:2, 1] — rows 0-1 of column 1.
        let m = mat4();
        let axes = [
            AxisIndex::Span { start: Some(0), stop: Some(2), step: None },
            AxisIndex::At(1),
        ];
        match m.index(&axes).unwrap() {
            Indexed::Array(a) => {
                assert_eq!(a.shape(), &[2]);
                assert_eq!(a.data(), &[2.0, 6.0]);
            }
            other => panic!("expected array, got {other:?}"),
        }
    }

    #[test]
    fn full_column() {
        let m = mat4();
        let axes = [
            AxisIndex::Span { start: None, stop: None, step: None },
            AxisIndex::At(1),
        ];
        match m.index(&axes).unwrap() {
            Indexed::Array(a) => assert_eq!(a.data(), &[2.0, 6.0, 10.0, 14.0]),
            other => panic!("expected array, got {other:?}"),
        }
    }

    #[test]
    fn partial_index_keeps_trailing_axes() {
        let m = mat4();
        match m.index(&[AxisIndex::At(2)]).unwrap() {
            Indexed::Array(a) => {
                assert_eq!(a.shape(), &[4]);
                assert_eq!(a.data(), &[9.0, 10.0, 11.0, 12.0]);
            }
            other => panic!("expected array, got {other:?}"),
        }
    }

    #[test]
    fn index_out_of_bounds() {
        let m = mat4();
        assert!(m.index(&[AxisIndex::At(7)]).is_err());
        assert!(m
            .index(&[AxisIndex::At(0), AxisIndex::At(0), AxisIndex::At(0)])
            .is_err());
    }

    #[test]
    fn negative_step_slice() {
        let a = NdArray::from_vec(vec![0.0, 1.0, 2.0, 3.0]);
        let axes = [AxisIndex::Span { start: None, stop: None, step: Some(-1) }];
        match a.index(&axes).unwrap() {
            Indexed::Array(r) => assert_eq!(r.data(), &[3.0, 2.0, 1.0, 0.0]),
            other => panic!("expected array, got {other:?}"),
        }
    }

    #[test]
    fn display_nested_list() {
        let m = NdArray::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(m.to_string(), "[[1.0, 2.0], [3.0, 4.0]]");
        let v = NdArray::from_vec(vec![1.5]);
        assert_eq!(v.to_string(), "[1.5]");
    }

    #[test]
    fn display_empty_slices() {
        let m = mat4();
        let axes = [
            AxisIndex::Span { start: Some(0), stop: Some(0), step: None },
            AxisIndex::Span { start: Some(0), stop: Some(2), step: None },
        ];
        match m.index(&axes).unwrap() {
            Indexed::Array(a) => {
                assert_eq!(a.shape(), &[0, 2]);
                assert_eq!(a.to_string(), "[]");
            }
            other => panic!("expected array, got {other:?}"),
        }
        let empty = NdArray::from_vec(vec![]);
        assert_eq!(empty.to_string(), "[]");
    }

    #[test]
    fn brief_formats() {
        let v = NdArray::from_vec(vec![1.0, 0.2, 0.03]);
        assert_eq!(v.format_brief(), "[1.0 0.2 0.03] (double)");
        assert_eq!(mat4().format_brief(), "[4\u{d7}4 double]");
        let col = NdArray::from_rows(vec![vec![1.0, 2.0]]).unwrap().transpose();
        assert_eq!(col.format_brief(), "[1.0 2.0]T (double)");
    }
}
