//! Collecting finished C blocks at the coordinator.

use grid_comm::{CartComm, ProcessGroup};
use grid_types::{Payload, Tag};
use tracing::debug;

use crate::fox::Block;
use crate::matrix::Matrix;
use crate::padding::{Layout, COORDINATOR};
use crate::Error;

const GATHER: Tag = Tag(4);

/// Sends `local_c` to the coordinator, which assembles the padded product and
/// crops it to `n x n`. Returns `Some` only on the coordinator.
pub async fn gather(
    grid: &CartComm,
    layout: &Layout,
    local_c: Block,
) -> Result<Option<Matrix>, Error> {
    let comm = grid.comm();
    if comm.rank() != COORDINATOR {
        comm.send(COORDINATOR, GATHER, Payload::Values(local_c.into_vec()))
            .await?;
        return Ok(None);
    }

    let mut buf = vec![0.0; layout.padded * layout.padded];
    layout.place(&mut buf, grid.coords(), &local_c);

    for source in (0..comm.size()).filter(|&source| source != COORDINATOR) {
        let data = comm.recv(source, GATHER).await?.into_values()?;
        let block = Block::from_vec(layout.block, data)?;
        layout.place(&mut buf, grid.coords_of(source)?, &block);
    }

    debug!(n = layout.n, padded = layout.padded, "gathered result");
    Ok(Some(Matrix::cropped(&buf, layout.padded, layout.n)))
}
