//! The square process grid and its row/column subgroups.

use grid_comm::{CartComm, Communicator, ProcessGroup};
use tracing::debug;

use crate::config::GridPolicy;
use crate::Error;

/// Side of the largest square grid that fits in `procs` processes.
pub fn grid_dim(procs: usize) -> usize {
    let mut q = (procs as f64).sqrt() as usize;
    while q * q > procs {
        q -= 1;
    }
    while (q + 1) * (q + 1) <= procs {
        q += 1;
    }
    q
}

/// A rank's view of the `q x q` grid.
///
/// Grid rank `r * q + c` sits at row `r`, column `c`. The row group holds the
/// `q` ranks of row `r` ranked by column; the column group holds the `q`
/// ranks of column `c` ranked by row. All three groups must be handed back
/// with [`GridTopology::release`].
pub struct GridTopology {
    grid: CartComm,
    row: Communicator,
    col: Communicator,
}

impl GridTopology {
    /// Builds the grid over the first `q * q` ranks of `world`.
    ///
    /// Collective over `world`. Ranks left over when the world size is not a
    /// perfect square get `None`, unless `policy` demands a square, in which
    /// case every rank fails with [`Error::NotPerfectSquare`] before any
    /// message is sent.
    pub async fn build(world: &Communicator, policy: GridPolicy) -> Result<Option<Self>, Error> {
        let procs = world.size();
        let q = grid_dim(procs);
        if q * q != procs && policy == GridPolicy::RequireSquare {
            return Err(Error::NotPerfectSquare { procs, grid: q });
        }

        let Some(grid) = world.cartesian([q, q], [false, false]).await? else {
            debug!(rank = world.rank(), procs, q, "rank is not on the grid");
            return Ok(None);
        };
        let row = grid.sub([false, true]).await?;
        let col = grid.sub([true, false]).await?;

        let [r, c] = grid.coords();
        debug!(rank = grid.comm().rank(), r, c, q, "joined grid");
        Ok(Some(Self { grid, row, col }))
    }

    /// Grid dimension `q`.
    pub fn dim(&self) -> usize {
        self.grid.dims()[0]
    }

    pub fn coords(&self) -> [usize; 2] {
        self.grid.coords()
    }

    pub fn grid(&self) -> &CartComm {
        &self.grid
    }

    pub fn row(&self) -> &Communicator {
        &self.row
    }

    pub fn col(&self) -> &Communicator {
        &self.col
    }

    pub fn release(self) {
        self.row.free();
        self.col.free();
        self.grid.free();
    }
}
