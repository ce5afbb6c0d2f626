use crate::chain::PropagationChain;
use crate::roots::LibraryRoots;
use crate::source;
use lookout_trace_types::CallChain;
use std::num::NonZeroUsize;
use tracing::warn;

/// Maximum application frames retained per capture.
pub const DEFAULT_MAX_FRAMES: usize = 50;

/// Per-capture bounds.
#[derive(Debug, Clone, Copy)]
pub struct CaptureOptions {
    /// Hard cap on retained frames; traversal stops once it is reached.
    pub max_frames: NonZeroUsize,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            max_frames: NonZeroUsize::new(DEFAULT_MAX_FRAMES)
                .expect("invariant violated: default frame bound must be non-zero"),
        }
    }
}

/// Snapshot the current call path, innermost frame first.
///
/// Returns only application frames, at most [`DEFAULT_MAX_FRAMES`] of them,
/// starting at this function's immediate caller. An empty chain is valid
/// output: a pure-library call path filters down to nothing.
#[inline(never)]
pub fn capture_backtrace() -> CallChain {
    capture_backtrace_with(LibraryRoots::process(), CaptureOptions::default())
}

/// [`capture_backtrace`] with explicit roots and bounds, for installation
/// layers that resolve their own layout.
#[inline(never)]
pub fn capture_backtrace_with(roots: &LibraryRoots, options: CaptureOptions) -> CallChain {
    capture_live(roots, options)
}

#[inline(never)]
fn capture_live(roots: &LibraryRoots, options: CaptureOptions) -> CallChain {
    let limit = options.max_frames.get();
    let mut frames = Vec::new();
    source::live_source().walk_live_stack(&mut |frame| {
        if roots.is_library_path(&frame.file) {
            return true;
        }
        frames.push(frame);
        frames.len() < limit
    });
    CallChain::from(frames)
}

/// Walk a failure's propagation chain back toward its origin.
///
/// The returned chain is ordered deepest-captured frame first, so when the
/// origin falls within the retained window it leads the result. The handle
/// is consumed; chains are only meaningfully walkable once. An empty or
/// fully-filtered chain yields an empty result, not an error.
pub fn capture_stacktrace(chain: PropagationChain) -> CallChain {
    capture_stacktrace_with(chain, LibraryRoots::process(), CaptureOptions::default())
}

/// [`capture_stacktrace`] with explicit roots and bounds.
pub fn capture_stacktrace_with(
    chain: PropagationChain,
    roots: &LibraryRoots,
    options: CaptureOptions,
) -> CallChain {
    let limit = options.max_frames.get();
    let mut frames = Vec::new();
    source::walk_propagation_chain(chain, &mut |frame| {
        if roots.is_library_path(&frame.file) {
            return true;
        }
        frames.push(frame);
        frames.len() < limit
    });
    frames.reverse();
    CallChain::from(frames)
}

/// Deprecated entry point kept for earlier integrations.
#[deprecated(since = "0.1.0", note = "use capture_backtrace instead")]
#[inline(never)]
pub fn capture() -> CallChain {
    warn!("capture is deprecated, use capture_backtrace instead");
    capture_backtrace()
}

/// Whether `function` is one of this module's capture entry points (or the
/// internal walk boundary). The frame source uses this to start live walks
/// at the entry point's immediate caller.
pub(crate) fn is_entry_symbol(function: &str) -> bool {
    let Some(tail) = function.strip_prefix(module_path!()) else {
        return false;
    };
    let Some(tail) = tail.strip_prefix("::") else {
        return false;
    };
    let name = match tail.find("::") {
        Some(end) => &tail[..end],
        None => tail,
    };
    matches!(
        name,
        "capture_live" | "capture_backtrace_with" | "capture_backtrace" | "capture"
    )
}
