//! Distributed matrix multiplication implementation.

use std::sync::Arc;
use std::time::Instant;

use grid_comm::{Communicator, ProcessGroup, World};
use tracing::{debug, info};

use crate::config::Config;
use crate::fox;
use crate::gather;
use crate::matrix::Matrix;
use crate::padding::{self, COORDINATOR};
use crate::topology::{grid_dim, GridTopology};
use crate::Error;

/// Computes `A x B` on one rank of `world`.
///
/// Every rank of `world` must call this together. Rank 0 is the coordinator
/// and must pass the operands; all other ranks pass `None`. The coordinator
/// gets `Some(C)`; every other rank, including ranks left off the grid, gets
/// `None`.
pub async fn multiply(
    world: &Communicator,
    operands: Option<(&Matrix, &Matrix)>,
    config: &Config,
) -> Result<Option<Matrix>, Error> {
    if world.rank() == COORDINATOR && operands.is_none() {
        return Err(Error::MissingOperands);
    }

    let Some(topology) = GridTopology::build(world, config.grid).await? else {
        return Ok(None);
    };

    let result = run_on_grid(&topology, operands, config).await;
    topology.release();
    result
}

async fn run_on_grid(
    topology: &GridTopology,
    operands: Option<(&Matrix, &Matrix)>,
    config: &Config,
) -> Result<Option<Matrix>, Error> {
    let (layout, own_a, local_b) =
        padding::scatter(topology.grid(), operands, config.padding).await?;
    debug!(
        coords = ?topology.coords(),
        q = topology.dim(),
        block = layout.block,
        "blocks received"
    );

    let local_c =
        fox::broadcast_multiply_rotate(topology.row(), topology.col(), &own_a, local_b).await?;

    gather::gather(topology.grid(), &layout, local_c).await
}

/// Distributed matrix multiplication coordinator.
///
/// `MatrixMul` starts `procs` ranks, hands the operands to rank 0 and runs
/// [`multiply`] on all of them. The whole run fails if any rank fails.
///
/// # Example
///
/// ```
/// use matrix_mul::{Matrix, MatrixMul};
///
/// #[tokio::main]
/// async fn main() -> Result<(), matrix_mul::Error> {
///     let a = Matrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]])?;
///     let b = Matrix::from_rows(vec![vec![5.0, 6.0], vec![7.0, 8.0]])?;
///
///     let c = MatrixMul::new(4).multiply(&a, &b).await?;
///     assert_eq!(c.into_rows(), vec![vec![19.0, 22.0], vec![43.0, 50.0]]);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MatrixMul {
    procs: usize,
    config: Config,
}

impl MatrixMul {
    pub fn new(procs: usize) -> Self {
        Self {
            procs,
            config: Config::default(),
        }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn procs(&self) -> usize {
        self.procs
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Side of the process grid that will do the work.
    pub fn grid_dim(&self) -> usize {
        grid_dim(self.procs)
    }

    /// Multiplies `a` by `b`.
    pub async fn multiply(&self, a: &Matrix, b: &Matrix) -> Result<Matrix, Error> {
        if self.procs == 0 {
            return Err(Error::NoProcesses);
        }
        if a.n() != b.n() {
            return Err(Error::DimensionMismatch(a.n(), b.n()));
        }
        if a.n() == 0 {
            return Err(Error::EmptyMatrix);
        }

        let q = self.grid_dim();
        let padded = self.config.padding.padded_size(a.n(), q);
        info!(procs = self.procs, q, n = a.n(), padded, "starting multiplication");
        let started = Instant::now();

        let operands = Arc::new((a.clone(), b.clone()));
        let config = self.config;
        let results = World::run(self.procs, move |comm| {
            let operands = Arc::clone(&operands);
            async move {
                let input =
                    (comm.rank() == COORDINATOR).then(|| (&operands.0, &operands.1));
                multiply(&comm, input, &config).await
            }
        })
        .await?;

        let c = results
            .into_iter()
            .next()
            .flatten()
            .ok_or(Error::MissingResult)?;
        info!(elapsed = ?started.elapsed(), "multiplication finished");
        Ok(c)
    }
}
