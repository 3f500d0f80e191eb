//! The operations algorithms are written against.

use async_trait::async_trait;
use grid_types::{Payload, Rank, Tag};

use crate::Error;

/// Rank-in-group plus point-to-point and collective communication.
///
/// Implementors supply `send` and `recv`; `broadcast` and `exchange` are built
/// on top of them. Sends are buffered and never wait for the receiver.
#[async_trait]
pub trait ProcessGroup: Send + Sync {
    fn rank(&self) -> Rank;

    fn size(&self) -> usize;

    async fn send(&self, dest: Rank, tag: Tag, payload: Payload) -> Result<(), Error>;

    async fn recv(&self, source: Rank, tag: Tag) -> Result<Payload, Error>;

    /// Delivers the root's payload to every member along a binomial tree.
    ///
    /// The root must pass `Some`; other members pass `None` and get the
    /// root's payload back. The root gets its own payload back.
    async fn broadcast(
        &self,
        root: Rank,
        tag: Tag,
        payload: Option<Payload>,
    ) -> Result<Payload, Error> {
        let size = self.size();
        if root >= size {
            return Err(Error::RankOutOfRange { rank: root, size });
        }

        let relative = (self.rank() + size - root) % size;
        let mut payload = if relative == 0 {
            Some(payload.ok_or(Error::MissingRootPayload(root))?)
        } else {
            None
        };

        let mut mask = 1;
        while mask < size {
            if relative & mask != 0 {
                let parent = (relative - mask + root) % size;
                payload = Some(self.recv(parent, tag).await?);
                break;
            }
            mask <<= 1;
        }

        let payload = payload.ok_or(Error::MissingRootPayload(root))?;

        mask >>= 1;
        while mask > 0 {
            if relative + mask < size {
                let child = (relative + mask + root) % size;
                self.send(child, tag, payload.clone()).await?;
            }
            mask >>= 1;
        }

        Ok(payload)
    }

    /// Sends `payload` to `dest` and receives the replacement from `source`
    /// as one step. Used for ring shifts, where every member sends and
    /// receives at once.
    async fn exchange(
        &self,
        payload: Payload,
        dest: Rank,
        source: Rank,
        tag: Tag,
    ) -> Result<Payload, Error> {
        self.send(dest, tag, payload).await?;
        self.recv(source, tag).await
    }
}
