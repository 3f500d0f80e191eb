//! Distributed matrix multiplication on a square process grid.
//!
//! `matrix-mul` computes C = A × B with Fox's algorithm. `P` ranks are
//! arranged as a `q x q` grid (`q = floor(sqrt(P))`); each grid rank owns one
//! `L x L` block of A, B and C, and the blocks of C are built up over `q`
//! rounds of row broadcasts and column rotations.
//!
//! # Phases
//!
//! - **Topology** ([`GridTopology`]): the grid plus each rank's row and
//!   column groups. Ranks past `q * q` sit the run out.
//! - **Padding** ([`padding::scatter`]): the coordinator zero-pads A and B to
//!   a multiple of `q` and sends every rank its blocks.
//! - **Rounds** ([`fox::broadcast_multiply_rotate`]): broadcast, multiply,
//!   rotate, `q` times.
//! - **Gather** ([`gather::gather`]): the coordinator collects the C blocks
//!   and crops the padding.
//!
//! Results are deterministic for a given process count, but differ in the
//! last bits from a sequential product because the sums are grouped
//! differently.
//!
//! # Example
//!
//! ```
//! use matrix_mul::{Config, Matrix, MatrixMul, PaddingPolicy};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), matrix_mul::Error> {
//!     let a = Matrix::identity(6);
//!     let b = Matrix::identity(6);
//!
//!     let config = Config::new().with_padding(PaddingPolicy::MultipleOfGrid);
//!     let c = MatrixMul::new(9).with_config(config).multiply(&a, &b).await?;
//!     assert_eq!(c, Matrix::identity(6));
//!     Ok(())
//! }
//! ```

mod config;
mod error;
pub mod fox;
pub mod gather;
mod matrix;
mod matrix_mul;
pub mod padding;
mod topology;

pub use config::{Config, GridPolicy, PaddingPolicy};
pub use error::Error;
pub use matrix::Matrix;
pub use matrix_mul::{multiply, MatrixMul};
pub use topology::{grid_dim, GridTopology};
