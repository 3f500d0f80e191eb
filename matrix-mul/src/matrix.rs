//! Dense square matrices in row-major order.

use rand::Rng;

use crate::Error;

/// An `n x n` matrix of `f64`, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    n: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Wraps a row-major buffer of exactly `n * n` elements.
    pub fn new(n: usize, data: Vec<f64>) -> Result<Self, Error> {
        if data.len() != n * n {
            return Err(Error::BufferSize { n, got: data.len() });
        }
        Ok(Self { n, data })
    }

    pub fn zeros(n: usize) -> Self {
        Self {
            n,
            data: vec![0.0; n * n],
        }
    }

    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n);
        for i in 0..n {
            m.data[i * n + i] = 1.0;
        }
        m
    }

    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, Error> {
        let n = rows.len();
        let mut data = Vec::with_capacity(n * n);
        for (row, values) in rows.into_iter().enumerate() {
            if values.len() != n {
                return Err(Error::NotSquare {
                    row,
                    len: values.len(),
                    n,
                });
            }
            data.extend(values);
        }
        Ok(Self { n, data })
    }

    /// Entries drawn uniformly from `[-1, 1)`.
    pub fn random<R: Rng>(n: usize, rng: &mut R) -> Self {
        let data = (0..n * n).map(|_| rng.gen_range(-1.0..1.0)).collect();
        Self { n, data }
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.n + j]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    pub fn into_rows(self) -> Vec<Vec<f64>> {
        if self.n == 0 {
            return Vec::new();
        }
        self.data.chunks(self.n).map(<[f64]>::to_vec).collect()
    }

    /// Sequential `self x other` with the plain i-j-k loop. Used to check the
    /// distributed product.
    pub fn reference_product(&self, other: &Matrix) -> Result<Matrix, Error> {
        if self.n != other.n {
            return Err(Error::DimensionMismatch(self.n, other.n));
        }
        let n = self.n;
        let mut out = Matrix::zeros(n);
        for i in 0..n {
            for j in 0..n {
                let mut sum = 0.0;
                for k in 0..n {
                    sum += self.data[i * n + k] * other.data[k * n + j];
                }
                out.data[i * n + j] = sum;
            }
        }
        Ok(out)
    }

    /// Largest elementwise `|self - other| / max(|other|, 1)`.
    ///
    /// Entries near zero are compared absolutely so that cancellation does
    /// not blow the ratio up.
    pub fn max_relative_error(&self, other: &Matrix) -> f64 {
        self.data
            .iter()
            .zip(&other.data)
            .map(|(x, y)| (x - y).abs() / y.abs().max(1.0))
            .fold(0.0, f64::max)
    }

    /// Copy of `self` in the top-left corner of a `size x size` zero buffer.
    pub(crate) fn padded(&self, size: usize) -> Vec<f64> {
        let mut buf = vec![0.0; size * size];
        for (i, row) in self.data.chunks(self.n.max(1)).enumerate() {
            buf[i * size..i * size + self.n].copy_from_slice(row);
        }
        buf
    }

    /// The top-left `n x n` corner of a `size x size` buffer.
    pub(crate) fn cropped(buf: &[f64], size: usize, n: usize) -> Matrix {
        let mut data = Vec::with_capacity(n * n);
        for i in 0..n {
            data.extend_from_slice(&buf[i * size..i * size + n]);
        }
        Matrix { n, data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_new_checks_length() {
        assert!(Matrix::new(2, vec![1.0; 4]).is_ok());
        assert!(matches!(
            Matrix::new(2, vec![1.0; 3]),
            Err(Error::BufferSize { n: 2, got: 3 })
        ));
    }

    #[test]
    fn test_from_rows_rejects_ragged() {
        let err = Matrix::from_rows(vec![vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert!(matches!(err, Error::NotSquare { row: 1, len: 1, n: 2 }));
    }

    #[test]
    fn test_reference_product() {
        let a = Matrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        let b = Matrix::from_rows(vec![vec![5.0, 6.0], vec![7.0, 8.0]]).unwrap();
        let c = a.reference_product(&b).unwrap();
        assert_eq!(c.into_rows(), vec![vec![19.0, 22.0], vec![43.0, 50.0]]);
    }

    #[test]
    fn test_identity_entries() {
        let m = Matrix::identity(3);
        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(m.get(i, j), if i == j { 1.0 } else { 0.0 });
            }
        }
    }

    #[test]
    fn test_pad_then_crop() {
        let m = Matrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        let buf = m.padded(4);
        assert_eq!(
            buf,
            vec![
                1.0, 2.0, 0.0, 0.0, //
                3.0, 4.0, 0.0, 0.0, //
                0.0, 0.0, 0.0, 0.0, //
                0.0, 0.0, 0.0, 0.0,
            ]
        );
        assert_eq!(Matrix::cropped(&buf, 4, 2), m);
    }

    #[test]
    fn test_random_is_seeded() {
        let a = Matrix::random(5, &mut StdRng::seed_from_u64(7));
        let b = Matrix::random(5, &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
        assert!(a.as_slice().iter().all(|v| (-1.0..1.0).contains(v)));
    }

    #[test]
    fn test_max_relative_error() {
        let a = Matrix::new(1, vec![100.0]).unwrap();
        let b = Matrix::new(1, vec![101.0]).unwrap();
        let err = a.max_relative_error(&b);
        assert!((err - 1.0 / 101.0).abs() < 1e-12);
        assert_eq!(a.max_relative_error(&a), 0.0);
    }
}
