//! Wire types shared by the grid message-passing runtime.
//!
//! Every message travelling between ranks is an [`Envelope`]: the identity of
//! the communicator it belongs to, the world rank that sent it, a [`Tag`] and a
//! [`Payload`]. Receivers match on `(context, source, tag)`.

use std::fmt;

use thiserror::Error;

/// Index of a worker. Interpreted relative to a communicator unless stated
/// otherwise.
pub type Rank = usize;

/// Message tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag(pub u32);

impl Tag {
    /// Reserved for membership exchange while splitting a communicator.
    pub const SPLIT: Tag = Tag(u32::MAX);

    /// Tag offset by `n`, used for per-round tags.
    pub fn offset(self, n: usize) -> Tag {
        Tag(self.0.wrapping_add(n as u32))
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Tag::SPLIT {
            write!(f, "split")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Identity of a communicator.
///
/// The world communicator has the empty path. A group produced by a split
/// appends the parent's split sequence number and the colour, so two groups
/// with the same members but created by different splits never share traffic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ContextId(Vec<u32>);

impl ContextId {
    pub fn world() -> Self {
        Self(Vec::new())
    }

    pub fn child(&self, sequence: u32, color: u32) -> Self {
        let mut path = Vec::with_capacity(self.0.len() + 2);
        path.extend_from_slice(&self.0);
        path.push(sequence);
        path.push(color);
        Self(path)
    }

    /// Number of splits between the world and this context.
    pub fn depth(&self) -> usize {
        self.0.len() / 2
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "world")?;
        for pair in self.0.chunks(2) {
            write!(f, "/{}.{}", pair[0], pair[1])?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
#[error("expected {expected} payload, got {got}")]
pub struct PayloadMismatch {
    pub expected: &'static str,
    pub got: &'static str,
}

/// Message body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Floating-point data, e.g. a matrix block.
    Values(Vec<f64>),
    /// Integer data, e.g. shapes and membership records.
    Indices(Vec<u64>),
}

impl Payload {
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Values(_) => "values",
            Payload::Indices(_) => "indices",
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Payload::Values(v) => v.len(),
            Payload::Indices(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_values(self) -> Result<Vec<f64>, PayloadMismatch> {
        match self {
            Payload::Values(v) => Ok(v),
            other => Err(PayloadMismatch {
                expected: "values",
                got: other.kind(),
            }),
        }
    }

    pub fn into_indices(self) -> Result<Vec<u64>, PayloadMismatch> {
        match self {
            Payload::Indices(v) => Ok(v),
            other => Err(PayloadMismatch {
                expected: "indices",
                got: other.kind(),
            }),
        }
    }
}

impl From<Vec<f64>> for Payload {
    fn from(v: Vec<f64>) -> Self {
        Payload::Values(v)
    }
}

impl From<Vec<u64>> for Payload {
    fn from(v: Vec<u64>) -> Self {
        Payload::Indices(v)
    }
}

/// A message in flight.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub context: ContextId,
    /// World rank of the sender.
    pub source: Rank,
    pub tag: Tag,
    pub payload: Payload,
}
