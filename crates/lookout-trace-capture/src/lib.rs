//! Stack capture for the lookout diagnostics agent.
//!
//! Turns the live call stack, or a previously captured failure propagation
//! chain, into a bounded [`CallChain`] of application frames:
//!
//! - [`capture_backtrace`] snapshots the current call path, innermost
//!   frame first.
//! - [`capture_stacktrace`] walks a [`PropagationChain`] back toward the
//!   frame the failure originated in, deepest captured frame first.
//!
//! Frames whose source lives under the installed-library roots (remapped
//! std sources, cargo registry, rustup toolchains) are dropped, and at
//! most [`DEFAULT_MAX_FRAMES`] frames are retained per capture. An empty
//! stack, an empty chain, or a fully filtered walk all yield an empty
//! chain, never an error.
//!
//! Capture is synchronous and re-entrant. Concurrent callers share only
//! the init-once [`LibraryRoots`] set and the init-once frame-source
//! selection; nothing is locked after initialization.

pub(crate) mod capture;
pub(crate) mod chain;
pub(crate) mod roots;
pub(crate) mod source;

pub use self::capture::*;
pub use self::chain::PropagationChain;
pub use self::roots::LibraryRoots;
pub use self::source::{SourceCapabilities, source_capabilities};

pub use lookout_trace_types::{CallChain, Frame, UNKNOWN_FUNCTION};
