//! Data model shared between the capture subsystem and its consumers.
//!
//! A capture is an ordered [`CallChain`] of [`Frame`]s. The span and
//! transport components depend on this crate alone and never link the
//! capture machinery itself. Encoding a chain into a wire format is the
//! caller's job; these types only guarantee a stable record shape.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder routine name for frames the runtime can place in a source
/// file but cannot name.
pub const UNKNOWN_FUNCTION: &str = "<unknown>";

/// One resolved point in a call chain.
///
/// Two frames with identical fields are indistinguishable; there is no
/// frame identity beyond the triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Frame {
    /// Source path exactly as the runtime reports it.
    pub file: String,
    /// 1-based line number within `file`.
    pub line: u32,
    /// Resolved routine name, [`UNKNOWN_FUNCTION`] when the runtime has
    /// none for this frame.
    pub function: String,
}

impl Frame {
    pub fn new(file: impl Into<String>, line: u32, function: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line,
            function: function.into(),
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}:{})", self.function, self.file, self.line)
    }
}

/// An ordered path through nested invocations.
///
/// Insertion order is significant: innermost-first for live captures,
/// deepest-within-window-first for propagation-chain captures. Chains are
/// fully materialized before being handed over and owned by the caller
/// afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallChain(Vec<Frame>);

impl CallChain {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn frames(&self) -> &[Frame] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Frame> {
        self.0.iter()
    }
}

impl From<Vec<Frame>> for CallChain {
    fn from(frames: Vec<Frame>) -> Self {
        Self(frames)
    }
}

impl FromIterator<Frame> for CallChain {
    fn from_iter<I: IntoIterator<Item = Frame>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for CallChain {
    type Item = Frame;
    type IntoIter = std::vec::IntoIter<Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a CallChain {
    type Item = &'a Frame;
    type IntoIter = std::slice::Iter<'a, Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
