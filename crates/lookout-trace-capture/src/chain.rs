use crate::source::frame_from_symbol;
use lookout_trace_types::Frame;

/// Opaque handle for the path a failure took between its origin and the
/// point it was observed.
///
/// Captured where the failure originates and carried with the error value
/// until an error-reporting integration hands it to
/// [`capture_stacktrace`](crate::capture_stacktrace), which consumes it:
/// a chain is only meaningfully walkable once. Walk order is anchor
/// (outermost handling context) toward origin (innermost frame).
pub struct PropagationChain(ChainInner);

enum ChainInner {
    /// Unwind snapshot taken at the origin, resolved lazily during the walk.
    Unwound(backtrace::Backtrace),
    /// Frames recorded by an integration layer, anchor-first.
    Recorded(Vec<Frame>),
}

impl PropagationChain {
    /// Snapshot the origin of a failure as it is constructed. Resolution is
    /// deferred until the chain is walked.
    #[inline(never)]
    pub fn capture_origin() -> Self {
        Self(ChainInner::Unwound(backtrace::Backtrace::new_unresolved()))
    }

    /// A chain recorded frame by frame, ordered from the anchor toward the
    /// origin.
    pub fn from_frames(frames: Vec<Frame>) -> Self {
        Self(ChainInner::Recorded(frames))
    }

    pub(crate) fn walk(self, sink: &mut dyn FnMut(Frame) -> bool) {
        match self.0 {
            ChainInner::Recorded(frames) => {
                for frame in frames {
                    if !sink(frame) {
                        return;
                    }
                }
            }
            ChainInner::Unwound(snapshot) => walk_unwound(snapshot, sink),
        }
    }
}

impl std::fmt::Debug for PropagationChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            ChainInner::Unwound(_) => f.write_str("PropagationChain::Unwound"),
            ChainInner::Recorded(frames) => f
                .debug_tuple("PropagationChain::Recorded")
                .field(&frames.len())
                .finish(),
        }
    }
}

/// The snapshot is innermost-first while the chain order is anchor-first,
/// so the walk runs in reverse and stops when it reaches the capture
/// machinery at the origin end.
fn walk_unwound(snapshot: backtrace::Backtrace, sink: &mut dyn FnMut(Frame) -> bool) {
    for raw in snapshot.frames().iter().rev() {
        // Inline expansions resolve innermost-first; an anchor-first walk
        // must emit them outermost-first.
        let mut expansions: Vec<Frame> = Vec::new();
        let mut reached_origin = false;
        backtrace::resolve(raw.ip(), |symbol| {
            if let Some(frame) = frame_from_symbol(symbol) {
                if is_origin_symbol(&frame.function) {
                    reached_origin = true;
                }
                expansions.push(frame);
            }
        });
        if reached_origin {
            return;
        }
        for frame in expansions.into_iter().rev() {
            if !sink(frame) {
                return;
            }
        }
    }
}

/// Everything at or below the origin snapshot call is capture machinery,
/// not part of the failure's path.
fn is_origin_symbol(function: &str) -> bool {
    if function.starts_with("backtrace::") {
        return true;
    }
    let Some(tail) = function.strip_prefix(module_path!()) else {
        return false;
    };
    tail.starts_with("::PropagationChain::capture_origin")
}
