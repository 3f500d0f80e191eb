//! The set of cooperating ranks and the launcher that runs them.

use std::future::Future;
use std::sync::{Arc, OnceLock};

use grid_types::{ContextId, Envelope, Rank};
use tokio::sync::{mpsc, watch, Mutex};
use tracing::{debug, warn};

use crate::communicator::Communicator;
use crate::endpoint::Endpoint;
use crate::Error;

/// Handle to a set of `size` ranks wired to each other.
///
/// The handle owns the abort switch. Once [`World::abort`] is called every
/// rank blocked in a receive fails with [`Error::Aborted`]; there is no way to
/// resume afterwards.
///
/// # Example
///
/// ```
/// use grid_comm::{Error, ProcessGroup, World};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Error> {
///     let ranks = World::run(4, |comm| async move {
///         Ok::<_, Error>(comm.rank())
///     })
///     .await?;
///     assert_eq!(ranks, vec![0, 1, 2, 3]);
///     Ok(())
/// }
/// ```
pub struct World {
    size: usize,
    shared: Arc<Shared>,
}

struct Shared {
    abort: watch::Sender<bool>,
    first_failure: OnceLock<Rank>,
}

impl Shared {
    fn fail(&self, rank: Rank) {
        if self.first_failure.set(rank).is_ok() {
            warn!(rank, "rank failed, aborting world");
        }
        self.abort.send_replace(true);
    }
}

impl World {
    /// Wires up `size` ranks and returns one world communicator per rank,
    /// in rank order.
    ///
    /// The `World` must outlive the communicators for aborts to reach them.
    pub fn new(size: usize) -> Result<(World, Vec<Communicator>), Error> {
        if size == 0 {
            return Err(Error::EmptyWorld);
        }

        let (abort, _) = watch::channel(false);
        let (senders, inboxes): (Vec<_>, Vec<_>) =
            (0..size).map(|_| mpsc::unbounded_channel::<Envelope>()).unzip();
        let peers: Arc<[_]> = senders.into();
        let members: Arc<[Rank]> = (0..size).collect();

        let comms = inboxes
            .into_iter()
            .enumerate()
            .map(|(rank, inbox)| {
                let endpoint = Endpoint::new(rank, Arc::clone(&peers), inbox, abort.subscribe());
                Communicator::new(
                    Arc::new(Mutex::new(endpoint)),
                    ContextId::world(),
                    Arc::clone(&members),
                    rank,
                )
            })
            .collect();

        let world = World {
            size,
            shared: Arc::new(Shared {
                abort,
                first_failure: OnceLock::new(),
            }),
        };
        Ok((world, comms))
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn abort(&self) {
        self.shared.abort.send_replace(true);
    }

    pub fn is_aborted(&self) -> bool {
        *self.shared.abort.borrow()
    }

    /// Runs `f` on every rank of a fresh world of `size` ranks, each in its
    /// own task, and returns the results in rank order.
    ///
    /// The first rank to fail (by returning an error or panicking) aborts the
    /// world, and its error is the one returned. Results of the other ranks
    /// are discarded.
    pub async fn run<F, Fut, T, E>(size: usize, f: F) -> Result<Vec<T>, E>
    where
        F: Fn(Communicator) -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: From<Error> + Send + 'static,
    {
        let (world, comms) = World::new(size)?;
        debug!(size, "launching world");

        // A finished rank's inbox stays open until every rank is joined, so
        // peers see the abort rather than a closed endpoint.
        let endpoints: Vec<_> = comms.iter().map(Communicator::endpoint).collect();

        let handles: Vec<_> = comms
            .into_iter()
            .enumerate()
            .map(|(rank, comm)| {
                let guard = FailureGuard::new(rank, Arc::clone(&world.shared));
                let task = f(comm);
                tokio::spawn(async move {
                    let result = task.await;
                    if result.is_ok() {
                        guard.disarm();
                    }
                    result
                })
            })
            .collect();

        let mut outcomes = Vec::with_capacity(size);
        for (rank, handle) in handles.into_iter().enumerate() {
            let outcome = match handle.await {
                Ok(result) => result,
                Err(_) => Err(E::from(Error::RankPanicked { rank })),
            };
            outcomes.push(outcome);
        }
        drop(endpoints);

        if let Some(&failed) = world.shared.first_failure.get() {
            if let Some(Err(e)) = outcomes.into_iter().nth(failed) {
                return Err(e);
            }
            return Err(E::from(Error::RankPanicked { rank: failed }));
        }

        outcomes.into_iter().collect()
    }
}

/// Reports its rank as failed when dropped armed, including during a panic.
struct FailureGuard {
    rank: Rank,
    shared: Arc<Shared>,
    armed: bool,
}

impl FailureGuard {
    fn new(rank: Rank, shared: Arc<Shared>) -> Self {
        Self {
            rank,
            shared,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for FailureGuard {
    fn drop(&mut self) {
        if self.armed {
            self.shared.fail(self.rank);
        }
    }
}
