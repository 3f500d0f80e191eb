//! C ABI for the distributed matrix multiplication.
//!
//! All matrices are flat, row-major `double` arrays of `n * n` elements. The
//! output buffer is written only when the call returns `Success`.

use std::slice;

use matrix_mul::{Config, GridPolicy, Matrix, MatrixMul, PaddingPolicy};

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Success = 0,
    NullPointer = 1,
    InvalidSize = 2,
    NotPerfectSquare = 3,
    CommunicationError = 4,
    RuntimeError = 5,
    InternalError = 99,
}

impl From<matrix_mul::Error> for ErrorCode {
    fn from(err: matrix_mul::Error) -> Self {
        use matrix_mul::Error;
        match err {
            Error::Comm(_) | Error::Payload(_) => ErrorCode::CommunicationError,
            Error::DimensionMismatch(..)
            | Error::BufferSize { .. }
            | Error::NotSquare { .. }
            | Error::EmptyMatrix
            | Error::NoProcesses => ErrorCode::InvalidSize,
            Error::NotPerfectSquare { .. } => ErrorCode::NotPerfectSquare,
            Error::MissingOperands
            | Error::BlockSize { .. }
            | Error::MalformedShape(_)
            | Error::MissingResult => ErrorCode::InternalError,
        }
    }
}

/// Computes `c = a * b` with `procs` ranks and the default configuration.
///
/// # Safety
///
/// `a` and `b` must point to `n * n` readable doubles and `c` to `n * n`
/// writable doubles that do not overlap `a` or `b`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn foxmm_multiply(
    a: *const f64,
    b: *const f64,
    c: *mut f64,
    n: i64,
    procs: i32,
) -> ErrorCode {
    unsafe { foxmm_multiply_with_policy(a, b, c, n, procs, 0, 0) }
}

/// Like [`foxmm_multiply`], with the padding and grid policies spelled out.
///
/// A non-zero `tight_padding` pads `n` straight to a multiple of the grid
/// side instead of going through a power of two. A non-zero `strict_grid`
/// fails with `NotPerfectSquare` when `procs` is not a perfect square instead
/// of leaving the extra ranks idle.
///
/// # Safety
///
/// Same requirements as [`foxmm_multiply`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn foxmm_multiply_with_policy(
    a: *const f64,
    b: *const f64,
    c: *mut f64,
    n: i64,
    procs: i32,
    tight_padding: i32,
    strict_grid: i32,
) -> ErrorCode {
    if a.is_null() || b.is_null() || c.is_null() {
        return ErrorCode::NullPointer;
    }
    if n <= 0 || procs <= 0 {
        return ErrorCode::InvalidSize;
    }

    let n = n as usize;
    let Some(len) = n.checked_mul(n) else {
        return ErrorCode::InvalidSize;
    };
    let (a, b) = unsafe { (slice::from_raw_parts(a, len), slice::from_raw_parts(b, len)) };

    let a = match Matrix::new(n, a.to_vec()) {
        Ok(m) => m,
        Err(e) => return ErrorCode::from(e),
    };
    let b = match Matrix::new(n, b.to_vec()) {
        Ok(m) => m,
        Err(e) => return ErrorCode::from(e),
    };

    let config = Config::new()
        .with_padding(if tight_padding != 0 {
            PaddingPolicy::MultipleOfGrid
        } else {
            PaddingPolicy::PowerOfTwo
        })
        .with_grid(if strict_grid != 0 {
            GridPolicy::RequireSquare
        } else {
            GridPolicy::ExcludeExtra
        });

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("failed to start runtime: {}", e);
            return ErrorCode::RuntimeError;
        }
    };

    let mm = MatrixMul::new(procs as usize).with_config(config);
    let result = rt.block_on(mm.multiply(&a, &b));

    match result {
        Ok(product) => {
            let out = unsafe { slice::from_raw_parts_mut(c, len) };
            out.copy_from_slice(product.as_slice());
            ErrorCode::Success
        }
        Err(e) => {
            tracing::warn!("multiplication failed: {}", e);
            ErrorCode::from(e)
        }
    }
}

/// Side of the process grid used for `procs` processes, or 0 if `procs` is
/// not positive.
#[unsafe(no_mangle)]
pub extern "C" fn foxmm_grid_dim(procs: i32) -> i32 {
    if procs <= 0 {
        return 0;
    }
    matrix_mul::grid_dim(procs as usize) as i32
}

/// Padded dimension used for an `n x n` problem on `procs` processes with the
/// default padding policy, or 0 for non-positive arguments.
#[unsafe(no_mangle)]
pub extern "C" fn foxmm_padded_size(n: i64, procs: i32) -> i64 {
    if n <= 0 || procs <= 0 {
        return 0;
    }
    let q = matrix_mul::grid_dim(procs as usize);
    PaddingPolicy::default().padded_size(n as usize, q) as i64
}
