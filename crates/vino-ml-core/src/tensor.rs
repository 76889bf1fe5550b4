use crate::error::{TensorError, TensorResult};
use crate::shape::Shape;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Dense `f64` tensor: a vector (`[n]`) or a row-major matrix (`[rows, cols]`).
///
/// Feature matrices, label vectors, network weights and regression
/// coefficients are all stored as tensors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawTensor")]
pub struct Tensor {
    data: Vec<f64>,
    shape: Shape,
}

/// Unchecked serialized form; deserialization goes through [`Tensor::new`].
#[derive(Deserialize)]
struct RawTensor {
    data: Vec<f64>,
    shape: Shape,
}

impl TryFrom<RawTensor> for Tensor {
    type Error = TensorError;

    fn try_from(raw: RawTensor) -> TensorResult<Self> {
        Tensor::new(raw.data, raw.shape.to_vec())
    }
}

// ─── Construction ───────────────────────────────────────────────────────────

impl Tensor {
    /// Create a tensor from raw data and shape.
    pub fn new(data: Vec<f64>, shape: Vec<usize>) -> TensorResult<Self> {
        let s = Shape::new(shape);
        if data.len() != s.numel() {
            return Err(TensorError::ShapeMismatch {
                expected: s.to_vec(),
                got: vec![data.len()],
            });
        }
        Ok(Tensor { data, shape: s })
    }

    /// Create a tensor filled with zeros.
    pub fn zeros(shape: Vec<usize>) -> Self {
        Tensor::full(shape, 0.0)
    }

    /// Create a tensor filled with ones.
    pub fn ones(shape: Vec<usize>) -> Self {
        Tensor::full(shape, 1.0)
    }

    /// Create a tensor filled with a constant value.
    pub fn full(shape: Vec<usize>, value: f64) -> Self {
        let s = Shape::new(shape);
        Tensor {
            data: vec![value; s.numel()],
            shape: s,
        }
    }

    /// Create a 1-D tensor from a slice.
    pub fn from_slice(data: &[f64]) -> Self {
        Tensor {
            data: data.to_vec(),
            shape: Shape::new(vec![data.len()]),
        }
    }

    /// Create a matrix from row vectors. `cols` fixes the width so that an
    /// empty row set still yields a `[0, cols]` matrix.
    pub fn from_rows(rows: &[Vec<f64>], cols: usize) -> TensorResult<Self> {
        let mut flat = Vec::with_capacity(rows.len() * cols);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(TensorError::ShapeMismatch {
                    expected: vec![i, cols],
                    got: vec![i, row.len()],
                });
            }
            flat.extend_from_slice(row);
        }
        Tensor::new(flat, vec![rows.len(), cols])
    }

    /// Create a matrix from a nested slice, inferring the width from the
    /// first row.
    pub fn from_vec2d(data: &[Vec<f64>]) -> TensorResult<Self> {
        let cols = data.first().map_or(0, Vec::len);
        Tensor::from_rows(data, cols)
    }

    /// Uniform samples in `[low, high)` drawn from a caller-owned generator.
    pub fn uniform<R: Rng>(shape: Vec<usize>, low: f64, high: f64, rng: &mut R) -> Self {
        let s = Shape::new(shape);
        let data = (0..s.numel()).map(|_| rng.gen_range(low..high)).collect();
        Tensor { data, shape: s }
    }

    /// Random tensor with uniform distribution in [0, 1).
    pub fn rand(shape: Vec<usize>, seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Tensor::uniform(shape, 0.0, 1.0, &mut rng)
    }

    // ─── Accessors ──────────────────────────────────────────────────────────

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn shape_vec(&self) -> Vec<usize> {
        self.shape.to_vec()
    }

    pub fn ndim(&self) -> usize {
        self.shape.ndim()
    }

    pub fn numel(&self) -> usize {
        self.data.len()
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<f64> {
        self.data
    }

    /// Number of rows of a matrix, or length of a vector.
    pub fn rows(&self) -> usize {
        self.shape.dims().first().copied().unwrap_or(1)
    }

    /// Number of columns of a matrix (1 for vectors).
    pub fn cols(&self) -> usize {
        match self.shape.dims() {
            [_, c] => *c,
            _ => 1,
        }
    }

    fn offset(&self, indices: &[usize]) -> TensorResult<usize> {
        if indices.len() != self.ndim() {
            return Err(TensorError::InvalidOperation(format!(
                "expected {} indices, got {}",
                self.ndim(),
                indices.len()
            )));
        }
        let mut offset = 0;
        for (axis, &idx) in indices.iter().enumerate() {
            let size = self.shape.dim(axis)?;
            if idx >= size {
                return Err(TensorError::IndexOutOfBounds {
                    index: idx,
                    axis,
                    size,
                });
            }
            offset = offset * size + idx;
        }
        Ok(offset)
    }

    /// Multi-dimensional indexing.
    pub fn get(&self, indices: &[usize]) -> TensorResult<f64> {
        Ok(self.data[self.offset(indices)?])
    }

    /// Borrow one row of a matrix.
    pub fn row(&self, i: usize) -> TensorResult<&[f64]> {
        let (rows, cols) = self.shape.matrix()?;
        if i >= rows {
            return Err(TensorError::IndexOutOfBounds {
                index: i,
                axis: 0,
                size: rows,
            });
        }
        Ok(&self.data[i * cols..(i + 1) * cols])
    }

    /// Iterate over the rows of a matrix.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        let cols = self.cols();
        let rows = if self.ndim() == 2 { self.rows() } else { 0 };
        (0..rows).map(move |i| &self.data[i * cols..(i + 1) * cols])
    }

    // ─── Shape Manipulation ─────────────────────────────────────────────────

    /// Reshape the tensor (data remains the same, only shape changes).
    pub fn reshape(&self, new_shape: Vec<usize>) -> TensorResult<Tensor> {
        let ns = Shape::new(new_shape);
        if self.numel() != ns.numel() {
            return Err(TensorError::ShapeMismatch {
                expected: ns.to_vec(),
                got: self.shape_vec(),
            });
        }
        Ok(Tensor {
            data: self.data.clone(),
            shape: ns,
        })
    }

    /// Transpose a matrix.
    pub fn t(&self) -> TensorResult<Tensor> {
        let (rows, cols) = self.shape.matrix()?;
        let mut data = vec![0.0; self.numel()];
        for i in 0..rows {
            for j in 0..cols {
                data[j * rows + i] = self.data[i * cols + j];
            }
        }
        Ok(Tensor {
            data,
            shape: self.shape.transposed()?,
        })
    }

    /// Concatenate matrices along axis 0 (stack rows) or 1 (append columns).
    pub fn concatenate(tensors: &[&Tensor], axis: usize) -> TensorResult<Tensor> {
        let first = tensors.first().ok_or(TensorError::EmptyTensor)?;
        let (rows, cols) = first.shape.matrix()?;
        match axis {
            0 => {
                let mut data = Vec::new();
                let mut total_rows = 0;
                for t in tensors {
                    let (r, c) = t.shape.matrix()?;
                    if c != cols {
                        return Err(TensorError::ShapeMismatch {
                            expected: vec![r, cols],
                            got: t.shape_vec(),
                        });
                    }
                    data.extend_from_slice(&t.data);
                    total_rows += r;
                }
                Tensor::new(data, vec![total_rows, cols])
            }
            1 => {
                let mut total_cols = 0;
                for t in tensors {
                    let (r, c) = t.shape.matrix()?;
                    if r != rows {
                        return Err(TensorError::ShapeMismatch {
                            expected: vec![rows, c],
                            got: t.shape_vec(),
                        });
                    }
                    total_cols += c;
                }
                let mut data = Vec::with_capacity(rows * total_cols);
                for i in 0..rows {
                    for t in tensors {
                        let c = t.cols();
                        data.extend_from_slice(&t.data[i * c..(i + 1) * c]);
                    }
                }
                Tensor::new(data, vec![rows, total_cols])
            }
            _ => Err(TensorError::InvalidAxis { axis, ndim: 2 }),
        }
    }

    /// Gather the given rows of a matrix, in the given order.
    pub fn select_rows(&self, indices: &[usize]) -> TensorResult<Tensor> {
        let (rows, cols) = self.shape.matrix()?;
        let mut data = Vec::with_capacity(indices.len() * cols);
        for &i in indices {
            if i >= rows {
                return Err(TensorError::IndexOutOfBounds {
                    index: i,
                    axis: 0,
                    size: rows,
                });
            }
            data.extend_from_slice(&self.data[i * cols..(i + 1) * cols]);
        }
        Tensor::new(data, vec![indices.len(), cols])
    }

    /// Rows `start..end` of a matrix, or elements `start..end` of a vector.
    /// An empty range is allowed.
    pub fn slice_rows(&self, start: usize, end: usize) -> TensorResult<Tensor> {
        let rows = self.rows();
        if start > end || end > rows {
            return Err(TensorError::IndexOutOfBounds {
                index: end,
                axis: 0,
                size: rows,
            });
        }
        let cols = self.cols();
        let data = self.data[start * cols..end * cols].to_vec();
        let mut shape = self.shape_vec();
        shape[0] = end - start;
        Tensor::new(data, shape)
    }

    // ─── Element-wise Unary Operations ──────────────────────────────────────

    pub fn apply<F: Fn(f64) -> f64>(&self, f: F) -> Tensor {
        Tensor {
            data: self.data.iter().map(|&x| f(x)).collect(),
            shape: self.shape.clone(),
        }
    }

    pub fn sqrt(&self) -> Tensor {
        self.apply(f64::sqrt)
    }

    pub fn relu(&self) -> Tensor {
        self.apply(|x| x.max(0.0))
    }

    /// Derivative mask of ReLU: 1 where the input was positive, else 0.
    pub fn relu_mask(&self) -> Tensor {
        self.apply(|x| if x > 0.0 { 1.0 } else { 0.0 })
    }

    pub fn add_scalar(&self, s: f64) -> Tensor {
        self.apply(|x| x + s)
    }

    pub fn mul_scalar(&self, s: f64) -> Tensor {
        self.apply(|x| x * s)
    }

    // ─── Element-wise Binary Operations ─────────────────────────────────────

    /// Same-shape element-wise op, or a row vector (`[cols]` or `[1, cols]`)
    /// broadcast across every row of a matrix.
    fn binary_op<F: Fn(f64, f64) -> f64>(&self, other: &Tensor, op: F) -> TensorResult<Tensor> {
        if self.shape == other.shape {
            let data = self
                .data
                .iter()
                .zip(other.data.iter())
                .map(|(&a, &b)| op(a, b))
                .collect();
            return Ok(Tensor {
                data,
                shape: self.shape.clone(),
            });
        }

        let broadcastable = self.ndim() == 2
            && other.numel() == self.cols()
            && (other.ndim() == 1 || (other.ndim() == 2 && other.rows() == 1));
        if !broadcastable {
            return Err(TensorError::ShapeMismatch {
                expected: self.shape_vec(),
                got: other.shape_vec(),
            });
        }

        let cols = self.cols();
        let data = self
            .data
            .iter()
            .enumerate()
            .map(|(i, &a)| op(a, other.data[i % cols]))
            .collect();
        Ok(Tensor {
            data,
            shape: self.shape.clone(),
        })
    }

    pub fn add(&self, other: &Tensor) -> TensorResult<Tensor> {
        self.binary_op(other, |a, b| a + b)
    }

    pub fn sub(&self, other: &Tensor) -> TensorResult<Tensor> {
        self.binary_op(other, |a, b| a - b)
    }

    pub fn mul(&self, other: &Tensor) -> TensorResult<Tensor> {
        self.binary_op(other, |a, b| a * b)
    }

    pub fn div(&self, other: &Tensor) -> TensorResult<Tensor> {
        self.binary_op(other, |a, b| a / b)
    }

    // ─── Reduction Operations ───────────────────────────────────────────────

    pub fn sum_all(&self) -> f64 {
        self.data.iter().sum()
    }

    pub fn mean_all(&self) -> TensorResult<f64> {
        if self.data.is_empty() {
            return Err(TensorError::EmptyTensor);
        }
        Ok(self.sum_all() / self.numel() as f64)
    }

    /// Sum of a matrix along an axis. Axis 0 yields one value per column
    /// (`[cols]`), axis 1 one value per row (`[rows]`).
    pub fn sum_axis(&self, axis: usize) -> TensorResult<Tensor> {
        let (rows, cols) = self.shape.matrix()?;
        match axis {
            0 => {
                let mut out = vec![0.0; cols];
                for row in self.iter_rows() {
                    for (acc, &v) in out.iter_mut().zip(row) {
                        *acc += v;
                    }
                }
                Tensor::new(out, vec![cols])
            }
            1 => {
                let out = self.iter_rows().map(|r| r.iter().sum()).collect();
                Tensor::new(out, vec![rows])
            }
            _ => Err(TensorError::InvalidAxis { axis, ndim: 2 }),
        }
    }

    /// Mean along an axis.
    pub fn mean_axis(&self, axis: usize) -> TensorResult<Tensor> {
        let size = self.shape.dim(axis)?;
        if size == 0 {
            return Err(TensorError::EmptyTensor);
        }
        Ok(self.sum_axis(axis)?.mul_scalar(1.0 / size as f64))
    }

    /// Population standard deviation of each column.
    pub fn std_axis0(&self) -> TensorResult<Tensor> {
        let mean = self.mean_axis(0)?;
        let centered = self.sub(&mean)?;
        let sq = centered.mul(&centered)?;
        Ok(sq.mean_axis(0)?.sqrt())
    }

    // ─── Matrix Multiply ────────────────────────────────────────────────────

    /// Matrix product of two 2-D tensors.
    pub fn matmul(&self, other: &Tensor) -> TensorResult<Tensor> {
        let (m, k) = self.shape.matrix()?;
        let (k2, n) = other.shape.matrix()?;
        if k != k2 {
            return Err(TensorError::ShapeMismatch {
                expected: vec![k, n],
                got: vec![k2, n],
            });
        }

        let mut data = vec![0.0; m * n];
        for i in 0..m {
            for p in 0..k {
                let a = self.data[i * k + p];
                if a == 0.0 {
                    continue;
                }
                let b_row = &other.data[p * n..(p + 1) * n];
                let out_row = &mut data[i * n..(i + 1) * n];
                for (o, &b) in out_row.iter_mut().zip(b_row) {
                    *o += a * b;
                }
            }
        }
        Tensor::new(data, vec![m, n])
    }
}

impl PartialEq for Tensor {
    fn eq(&self, other: &Self) -> bool {
        self.shape == other.shape && self.data == other.data
    }
}

impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tensor{} [", self.shape)?;
        for (i, v) in self.data.iter().take(8).enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{:.4}", v)?;
        }
        if self.numel() > 8 {
            write!(f, ", …")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_creation() {
        let t = Tensor::new(vec![1.0, 2.0, 3.0, 4.0], vec![2, 2]).unwrap();
        assert_eq!(t.rows(), 2);
        assert_eq!(t.cols(), 2);
        assert_eq!(t.get(&[1, 0]).unwrap(), 3.0);
        assert!(Tensor::new(vec![1.0], vec![2, 2]).is_err());
    }

    #[test]
    fn test_deserialize_checks_length() {
        let t = Tensor::new(vec![1.0, 2.0, 3.0, 4.0], vec![2, 2]).unwrap();
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(serde_json::from_str::<Tensor>(&json).unwrap(), t);

        let short = r#"{"data":[1.0,2.0,3.0],"shape":{"dims":[2,2]}}"#;
        let err = serde_json::from_str::<Tensor>(short).unwrap_err();
        assert!(err.to_string().contains("Shape mismatch"), "{err}");
    }

    #[test]
    fn test_from_rows_keeps_width_when_empty() {
        let t = Tensor::from_rows(&[], 11).unwrap();
        assert_eq!(t.shape_vec(), vec![0, 11]);
        assert_eq!(t.iter_rows().count(), 0);
    }

    #[test]
    fn test_from_rows_rejects_ragged() {
        let rows = vec![vec![1.0, 2.0], vec![3.0]];
        assert!(Tensor::from_rows(&rows, 2).is_err());
    }

    #[test]
    fn test_row_broadcast() {
        let x = Tensor::from_vec2d(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        let b = Tensor::from_slice(&[10.0, 20.0]);
        let y = x.add(&b).unwrap();
        assert_eq!(y.data(), &[11.0, 22.0, 13.0, 24.0]);

        let bad = Tensor::from_slice(&[1.0, 2.0, 3.0]);
        assert!(x.add(&bad).is_err());
    }

    #[test]
    fn test_matmul_and_transpose() {
        let a = Tensor::from_vec2d(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
        let at = a.t().unwrap();
        assert_eq!(at.shape_vec(), vec![3, 2]);
        let aat = a.matmul(&at).unwrap();
        assert_eq!(aat.data(), &[14.0, 32.0, 32.0, 77.0]);
        assert!(a.matmul(&a).is_err());
    }

    #[test]
    fn test_concatenate_columns() {
        let ones = Tensor::ones(vec![2, 1]);
        let x = Tensor::from_vec2d(&[vec![5.0, 6.0], vec![7.0, 8.0]]).unwrap();
        let aug = Tensor::concatenate(&[&ones, &x], 1).unwrap();
        assert_eq!(aug.data(), &[1.0, 5.0, 6.0, 1.0, 7.0, 8.0]);
    }

    #[test]
    fn test_select_and_slice_rows() {
        let x = Tensor::from_vec2d(&[vec![0.0], vec![1.0], vec![2.0], vec![3.0]]).unwrap();
        assert_eq!(x.select_rows(&[3, 0]).unwrap().data(), &[3.0, 0.0]);
        assert_eq!(x.slice_rows(1, 3).unwrap().data(), &[1.0, 2.0]);
        assert_eq!(x.slice_rows(4, 4).unwrap().shape_vec(), vec![0, 1]);
        assert!(x.slice_rows(2, 5).is_err());

        let y = Tensor::from_slice(&[9.0, 8.0, 7.0]);
        assert_eq!(y.slice_rows(1, 3).unwrap().data(), &[8.0, 7.0]);
    }

    #[test]
    fn test_axis_reductions() {
        let x = Tensor::from_vec2d(&[vec![1.0, 10.0], vec![3.0, 30.0]]).unwrap();
        assert_eq!(x.sum_axis(0).unwrap().data(), &[4.0, 40.0]);
        assert_eq!(x.sum_axis(1).unwrap().data(), &[11.0, 33.0]);
        assert_eq!(x.mean_axis(0).unwrap().data(), &[2.0, 20.0]);
        let std = x.std_axis0().unwrap();
        assert_relative_eq!(std.data()[0], 1.0);
        assert_relative_eq!(std.data()[1], 10.0);
    }

    #[test]
    fn test_relu_and_mask() {
        let x = Tensor::from_slice(&[-1.0, 0.0, 2.5]);
        assert_eq!(x.relu().data(), &[0.0, 0.0, 2.5]);
        assert_eq!(x.relu_mask().data(), &[0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_rand_is_seeded() {
        let a = Tensor::rand(vec![3, 3], Some(7));
        let b = Tensor::rand(vec![3, 3], Some(7));
        assert_eq!(a, b);
        assert!(a.data().iter().all(|&v| (0.0..1.0).contains(&v)));
    }
}
