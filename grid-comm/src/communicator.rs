//! Process groups over a shared endpoint.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use grid_types::{ContextId, Envelope, Payload, Rank, Tag};
use tokio::sync::Mutex;
use tracing::{debug, trace};

use crate::endpoint::Endpoint;
use crate::group::ProcessGroup;
use crate::Error;

/// A group of ranks that can talk to each other.
///
/// Every rank of a group holds its own `Communicator`. Ranks are numbered
/// `0..size()` within the group; the world rank behind each one is available
/// through [`Communicator::world_rank`]. Groups derived with
/// [`Communicator::split`] share the rank's endpoint but carry their own
/// [`ContextId`], so their traffic never mixes with the parent's.
pub struct Communicator {
    endpoint: Arc<Mutex<Endpoint>>,
    context: ContextId,
    members: Arc<[Rank]>,
    rank: Rank,
    splits: AtomicU32,
}

impl Communicator {
    pub(crate) fn new(
        endpoint: Arc<Mutex<Endpoint>>,
        context: ContextId,
        members: Arc<[Rank]>,
        rank: Rank,
    ) -> Self {
        Self {
            endpoint,
            context,
            members,
            rank,
            splits: AtomicU32::new(0),
        }
    }

    pub(crate) fn endpoint(&self) -> Arc<Mutex<Endpoint>> {
        Arc::clone(&self.endpoint)
    }

    pub fn context(&self) -> &ContextId {
        &self.context
    }

    /// World rank of group member `rank`.
    pub fn world_rank(&self, rank: Rank) -> Result<Rank, Error> {
        self.members.get(rank).copied().ok_or(Error::RankOutOfRange {
            rank,
            size: self.members.len(),
        })
    }

    /// Partitions the group.
    ///
    /// Collective: every member must call `split` in the same order. Members
    /// passing the same `color` end up in one new group, ordered by `key` and
    /// then by their rank in this group. A `None` colour takes part in the
    /// exchange but receives no group.
    pub async fn split(&self, color: Option<u32>, key: u32) -> Result<Option<Communicator>, Error> {
        let sequence = self.splits.fetch_add(1, Ordering::SeqCst);
        let size = self.size();

        let record = vec![color.map_or(0, |c| u64::from(c) + 1), u64::from(key)];
        for dest in (0..size).filter(|&dest| dest != self.rank) {
            self.send(dest, Tag::SPLIT, Payload::Indices(record.clone()))
                .await?;
        }

        let mut records = Vec::with_capacity(size);
        for source in 0..size {
            if source == self.rank {
                records.push((record[0], record[1]));
                continue;
            }
            let theirs = self.recv(source, Tag::SPLIT).await?.into_indices()?;
            match theirs.as_slice() {
                [c, k] => records.push((*c, *k)),
                _ => return Err(Error::MalformedSplit(source)),
            }
        }

        let Some(color) = color else {
            trace!(rank = self.rank, context = %self.context, "split: no colour");
            return Ok(None);
        };
        let wanted = u64::from(color) + 1;

        let mut group: Vec<(u64, Rank)> = records
            .iter()
            .enumerate()
            .filter(|(_, (c, _))| *c == wanted)
            .map(|(rank, (_, k))| (*k, rank))
            .collect();
        group.sort_unstable();

        let members = group
            .iter()
            .map(|&(_, rank)| self.world_rank(rank))
            .collect::<Result<Arc<[Rank]>, Error>>()?;
        let new_rank = group
            .iter()
            .position(|&(_, rank)| rank == self.rank)
            .ok_or(Error::RankOutOfRange {
                rank: self.rank,
                size: group.len(),
            })?;

        let context = self.context.child(sequence, color);
        debug!(
            rank = self.rank,
            parent = %self.context,
            context = %context,
            color,
            new_rank,
            size = members.len(),
            "split"
        );

        Ok(Some(Communicator::new(
            Arc::clone(&self.endpoint),
            context,
            members,
            new_rank,
        )))
    }

    /// Releases the group.
    pub fn free(self) {
        trace!(rank = self.rank, context = %self.context, "free");
    }
}

#[async_trait]
impl ProcessGroup for Communicator {
    fn rank(&self) -> Rank {
        self.rank
    }

    fn size(&self) -> usize {
        self.members.len()
    }

    async fn send(&self, dest: Rank, tag: Tag, payload: Payload) -> Result<(), Error> {
        let target = self.world_rank(dest)?;
        let source = self.world_rank(self.rank)?;
        let envelope = Envelope {
            context: self.context.clone(),
            source,
            tag,
            payload,
        };
        self.endpoint.lock().await.post(target, envelope)
    }

    async fn recv(&self, source: Rank, tag: Tag) -> Result<Payload, Error> {
        let from = self.world_rank(source)?;
        self.endpoint
            .lock()
            .await
            .receive(&self.context, from, tag)
            .await
    }
}
