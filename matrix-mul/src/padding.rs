//! Zero-padding the operands and handing each rank its blocks.

use grid_comm::{CartComm, ProcessGroup};
use grid_types::{Payload, Rank, Tag};
use tracing::debug;

use crate::config::PaddingPolicy;
use crate::fox::Block;
use crate::matrix::Matrix;
use crate::Error;

/// Grid rank that owns the operands and receives the result.
pub const COORDINATOR: Rank = 0;

const SHAPE: Tag = Tag(1);
const SCATTER_A: Tag = Tag(2);
const SCATTER_B: Tag = Tag(3);

/// How an `n x n` problem is laid out on a `q x q` grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub n: usize,
    pub q: usize,
    pub padded: usize,
    pub block: usize,
}

impl Layout {
    pub fn new(n: usize, q: usize, policy: PaddingPolicy) -> Self {
        let padded = policy.padded_size(n, q);
        Self {
            n,
            q,
            padded,
            block: padded / q,
        }
    }

    /// Copies block `(r, c)` out of a `padded x padded` buffer.
    pub fn extract(&self, buf: &[f64], coords: [usize; 2]) -> Result<Block, Error> {
        let [r, c] = coords;
        let l = self.block;
        let mut data = Vec::with_capacity(l * l);
        for i in 0..l {
            let start = (r * l + i) * self.padded + c * l;
            data.extend_from_slice(&buf[start..start + l]);
        }
        Block::from_vec(l, data)
    }

    /// Writes `block` into position `(r, c)` of a `padded x padded` buffer.
    pub fn place(&self, buf: &mut [f64], coords: [usize; 2], block: &Block) {
        let [r, c] = coords;
        let l = self.block;
        for (i, src) in block.as_slice().chunks(l).enumerate() {
            let start = (r * l + i) * self.padded + c * l;
            buf[start..start + l].copy_from_slice(src);
        }
    }
}

/// Distributes A and B over the grid.
///
/// The coordinator passes the operands; every other grid rank passes `None`.
/// The coordinator first broadcasts `n`, then pads both operands, cuts them
/// into `q x q` blocks and sends block `(r, c)` of each to grid rank
/// `r * q + c`, keeping its own pair without a round trip.
///
/// Returns the layout together with the caller's A and B blocks.
pub async fn scatter(
    grid: &CartComm,
    operands: Option<(&Matrix, &Matrix)>,
    policy: PaddingPolicy,
) -> Result<(Layout, Block, Block), Error> {
    let comm = grid.comm();
    let q = grid.dims()[0];

    if comm.rank() != COORDINATOR {
        let shape = comm.broadcast(COORDINATOR, SHAPE, None).await?.into_indices()?;
        let n = match shape.as_slice() {
            [n] => *n as usize,
            _ => return Err(Error::MalformedShape(shape.len())),
        };
        let layout = Layout::new(n, q, policy);

        let a = comm.recv(COORDINATOR, SCATTER_A).await?.into_values()?;
        let b = comm.recv(COORDINATOR, SCATTER_B).await?.into_values()?;
        return Ok((
            layout,
            Block::from_vec(layout.block, a)?,
            Block::from_vec(layout.block, b)?,
        ));
    }

    let (a, b) = operands.ok_or(Error::MissingOperands)?;
    if a.n() != b.n() {
        return Err(Error::DimensionMismatch(a.n(), b.n()));
    }
    if a.n() == 0 {
        return Err(Error::EmptyMatrix);
    }

    let n = a.n();
    comm.broadcast(COORDINATOR, SHAPE, Some(Payload::Indices(vec![n as u64])))
        .await?;

    let layout = Layout::new(n, q, policy);
    debug!(n, q, padded = layout.padded, block = layout.block, "scattering operands");

    let padded_a = a.padded(layout.padded);
    let padded_b = b.padded(layout.padded);

    for dest in (0..comm.size()).filter(|&dest| dest != COORDINATOR) {
        let coords = grid.coords_of(dest)?;
        let block_a = layout.extract(&padded_a, coords)?;
        let block_b = layout.extract(&padded_b, coords)?;
        comm.send(dest, SCATTER_A, Payload::Values(block_a.into_vec()))
            .await?;
        comm.send(dest, SCATTER_B, Payload::Values(block_b.into_vec()))
            .await?;
    }

    let own = grid.coords();
    Ok((
        layout,
        layout.extract(&padded_a, own)?,
        layout.extract(&padded_b, own)?,
    ))
}
