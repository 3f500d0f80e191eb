//! Fox's broadcast-multiply-rotate rounds.
//!
//! Rank `(r, c)` of a `q x q` grid starts with `A[r][c]` and `B[r][c]`. In
//! round `k` the rank in column `(r + k) mod q` of row `r` broadcasts its A
//! block along the row, every rank of the row multiplies it into its
//! accumulator with the B block it currently holds, and then the B blocks of
//! each column shift up by one. After round `k` the accumulator at `(r, c)`
//! holds
//!
//! ```text
//! sum_{j=0..=k} A[r][(r+j) mod q] * B[(r+j) mod q][c]
//! ```
//!
//! so after `q` rounds it is block `(r, c)` of `A x B`.

use grid_comm::ProcessGroup;
use grid_types::{Payload, Tag};
use tracing::{debug, trace};

use crate::Error;

const BROADCAST: Tag = Tag(0x1000_0000);
const ROTATE: Tag = Tag(0x2000_0000);

/// An `L x L` tile, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    dim: usize,
    data: Vec<f64>,
}

impl Block {
    pub fn zeros(dim: usize) -> Self {
        Self {
            dim,
            data: vec![0.0; dim * dim],
        }
    }

    pub fn from_vec(dim: usize, data: Vec<f64>) -> Result<Self, Error> {
        if data.len() != dim * dim {
            return Err(Error::BlockSize {
                expected: dim * dim,
                got: data.len(),
            });
        }
        Ok(Self { dim, data })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    /// `self += a * b` with a direct i-k-j triple loop.
    pub fn multiply_accumulate(&mut self, a: &Block, b: &Block) {
        let l = self.dim;
        debug_assert_eq!(a.dim, l);
        debug_assert_eq!(b.dim, l);
        for i in 0..l {
            let out = &mut self.data[i * l..(i + 1) * l];
            for k in 0..l {
                let aik = a.data[i * l + k];
                let b_row = &b.data[k * l..(k + 1) * l];
                for (c, &bkj) in out.iter_mut().zip(b_row) {
                    *c += aik * bkj;
                }
            }
        }
    }
}

/// Runs all `q` rounds for one rank and returns its finished C block.
///
/// `row` must rank the members of the caller's grid row by column and `col`
/// the members of its grid column by row, so that `row.rank()` is the
/// caller's column and `col.rank()` its row. `own_a` is the caller's A block;
/// `local_b` starts as its B block and travels up the column.
///
/// Any communication failure aborts the whole computation; no partially
/// accumulated block is returned.
pub async fn broadcast_multiply_rotate<G>(
    row: &G,
    col: &G,
    own_a: &Block,
    local_b: Block,
) -> Result<Block, Error>
where
    G: ProcessGroup + ?Sized,
{
    let q = row.size();
    let (r, c) = (col.rank(), row.rank());
    let dim = own_a.dim();
    debug_assert_eq!(col.size(), q);

    let up = (r + q - 1) % q;
    let down = (r + 1) % q;

    let mut local_b = local_b;
    let mut local_c = Block::zeros(dim);

    for k in 0..q {
        let root = (r + k) % q;
        let outgoing = (c == root).then(|| Payload::Values(own_a.as_slice().to_vec()));
        let panel = row
            .broadcast(root, BROADCAST.offset(k), outgoing)
            .await?
            .into_values()?;
        let panel = Block::from_vec(dim, panel)?;

        local_c.multiply_accumulate(&panel, &local_b);
        trace!(r, c, k, root, "multiplied");

        let rotated = col
            .exchange(Payload::Values(local_b.into_vec()), up, down, ROTATE.offset(k))
            .await?
            .into_values()?;
        local_b = Block::from_vec(dim, rotated)?;
    }

    debug!(r, c, rounds = q, "rounds complete");
    Ok(local_c)
}
