//! Buffer for messages that arrived before anyone asked for them.

use std::collections::{HashMap, VecDeque};

use grid_types::{ContextId, Envelope, Payload, Rank, Tag};

type Key = (ContextId, Rank, Tag);

/// Unexpected-message queue of one endpoint.
///
/// Messages are grouped by `(context, source, tag)` and handed out in arrival
/// order within each group.
pub struct Mailbox {
    pending: HashMap<Key, VecDeque<Payload>>,
}

impl Mailbox {
    pub fn new() -> Self {
        Self {
            pending: HashMap::new(),
        }
    }

    pub fn stash(&mut self, envelope: Envelope) {
        let key = (envelope.context, envelope.source, envelope.tag);
        self.pending.entry(key).or_default().push_back(envelope.payload);
    }

    pub fn take(&mut self, context: &ContextId, source: Rank, tag: Tag) -> Option<Payload> {
        let key = (context.clone(), source, tag);
        let queue = self.pending.get_mut(&key)?;
        let payload = queue.pop_front();
        if queue.is_empty() {
            self.pending.remove(&key);
        }
        payload
    }

    /// Number of buffered messages.
    pub fn len(&self) -> usize {
        self.pending.values().map(VecDeque::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl Default for Mailbox {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(source: Rank, tag: u32, value: f64) -> Envelope {
        Envelope {
            context: ContextId::world(),
            source,
            tag: Tag(tag),
            payload: Payload::Values(vec![value]),
        }
    }

    #[test]
    fn test_fifo_per_key() {
        let mut mailbox = Mailbox::new();
        mailbox.stash(envelope(1, 7, 1.0));
        mailbox.stash(envelope(1, 7, 2.0));
        mailbox.stash(envelope(2, 7, 3.0));
        assert_eq!(mailbox.len(), 3);

        let world = ContextId::world();
        assert_eq!(mailbox.take(&world, 1, Tag(7)), Some(Payload::Values(vec![1.0])));
        assert_eq!(mailbox.take(&world, 1, Tag(7)), Some(Payload::Values(vec![2.0])));
        assert_eq!(mailbox.take(&world, 1, Tag(7)), None);
        assert_eq!(mailbox.take(&world, 2, Tag(7)), Some(Payload::Values(vec![3.0])));
        assert!(mailbox.is_empty());
    }

    #[test]
    fn test_contexts_are_isolated() {
        let mut mailbox = Mailbox::new();
        mailbox.stash(envelope(0, 1, 1.0));

        let other = ContextId::world().child(0, 0);
        assert_eq!(mailbox.take(&other, 0, Tag(1)), None);
        assert_eq!(mailbox.len(), 1);
    }
}
