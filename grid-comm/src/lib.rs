//! An in-process message-passing runtime for SPMD-style algorithms.
//!
//! `grid-comm` wires a fixed number of ranks together with channels and gives
//! each one a [`Communicator`]: point-to-point sends and receives, a broadcast
//! and a ring exchange (through [`ProcessGroup`]), group splitting and 2D
//! cartesian topologies. Each rank is meant to run as its own task, executing
//! the same program on its own data.
//!
//! # Features
//!
//! - Buffered sends; receives match on `(group, source, tag)`
//! - Subgroups with isolated traffic via [`Communicator::split`]
//! - Row/column subgroups of a grid via [`CartComm::sub`]
//! - Whole-world abort when any rank fails, see [`World::run`]
//!
//! # Example
//!
//! ```
//! use grid_comm::{Error, ProcessGroup, World};
//! use grid_types::{Payload, Tag};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Error> {
//!     let sums = World::run(3, |comm| async move {
//!         let root = comm.rank() == 0;
//!         let data = root.then(|| Payload::Values(vec![1.0, 2.0]));
//!         let values = comm.broadcast(0, Tag(1), data).await?.into_values()?;
//!         Ok::<_, Error>(values.iter().sum::<f64>())
//!     })
//!     .await?;
//!     assert_eq!(sums, vec![3.0, 3.0, 3.0]);
//!     Ok(())
//! }
//! ```

mod cart;
mod communicator;
mod endpoint;
mod error;
mod group;
mod mailbox;
mod world;

pub use cart::CartComm;
pub use communicator::Communicator;
pub use error::Error;
pub use group::ProcessGroup;
pub use world::World;
