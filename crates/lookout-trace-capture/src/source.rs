use crate::capture::is_entry_symbol;
use crate::chain::PropagationChain;
use lookout_trace_types::{Frame, UNKNOWN_FUNCTION};
use std::ffi::c_void;
use std::sync::OnceLock;
use tracing::debug;

/// What the one-shot provider probe found on this runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceCapabilities {
    /// Symbols can be resolved while the unwind is still in progress.
    pub in_walk_resolution: bool,
}

/// Produces frames one at a time, driving `sink` until it returns `false`
/// or the traversal is exhausted. Implementations resolve at most one
/// frame ahead of the sink.
pub(crate) trait FrameSource: Sync {
    /// Walk the current stack from the capture entry point's immediate
    /// caller outward to the process entry point.
    fn walk_live_stack(&self, sink: &mut dyn FnMut(Frame) -> bool);
}

/// Resolves symbols while the unwinder cursor is still advancing, so a
/// declined frame is never resolved at all.
pub(crate) struct WalkSource;

impl FrameSource for WalkSource {
    fn walk_live_stack(&self, sink: &mut dyn FnMut(Frame) -> bool) {
        let mut boundary = EntryBoundary::new();
        backtrace::trace(|raw| {
            resolve_ip(raw.ip(), &mut |frame| {
                if !boundary.crossed(&frame.function) {
                    return true;
                }
                sink(frame)
            })
        });
    }
}

/// Unwinds the whole stack unresolved first, then resolves frame by frame.
/// Fallback for runtimes where resolving mid-unwind is unavailable; the
/// expensive per-frame resolution is still bounded by the sink.
pub(crate) struct SnapshotSource;

impl FrameSource for SnapshotSource {
    fn walk_live_stack(&self, sink: &mut dyn FnMut(Frame) -> bool) {
        let mut boundary = EntryBoundary::new();
        let snapshot = backtrace::Backtrace::new_unresolved();
        for raw in snapshot.frames() {
            let keep_going = resolve_ip(raw.ip(), &mut |frame| {
                if !boundary.crossed(&frame.function) {
                    return true;
                }
                sink(frame)
            });
            if !keep_going {
                break;
            }
        }
    }
}

static WALK_SOURCE: WalkSource = WalkSource;
static SNAPSHOT_SOURCE: SnapshotSource = SnapshotSource;

fn in_walk_resolution() -> bool {
    static PROBE: OnceLock<bool> = OnceLock::new();
    *PROBE.get_or_init(|| {
        let supported = probe_in_walk_resolution();
        if !supported {
            debug!("in-walk symbol resolution unavailable; deferring resolution to snapshots");
        }
        supported
    })
}

/// The provider chosen for this process. Probed once, stable afterwards.
pub(crate) fn live_source() -> &'static dyn FrameSource {
    if in_walk_resolution() {
        &WALK_SOURCE
    } else {
        &SNAPSHOT_SOURCE
    }
}

pub fn source_capabilities() -> SourceCapabilities {
    SourceCapabilities {
        in_walk_resolution: in_walk_resolution(),
    }
}

/// Attempt to resolve any symbol mid-unwind; stops at the first success.
fn probe_in_walk_resolution() -> bool {
    let mut resolved_any = false;
    backtrace::trace(|raw| {
        backtrace::resolve(raw.ip(), |symbol| {
            resolved_any = resolved_any || symbol.name().is_some() || symbol.filename().is_some();
        });
        !resolved_any
    });
    resolved_any
}

/// Walk a propagation chain from its anchor toward the origin frame.
///
/// Provider-independent: the chain carries its own captured data. The
/// handle is consumed; a chain is only meaningfully walkable once.
pub(crate) fn walk_propagation_chain(chain: PropagationChain, sink: &mut dyn FnMut(Frame) -> bool) {
    chain.walk(sink)
}

/// Resolve one unwound address into displayable frames, one per symbol the
/// runtime reports, innermost inline expansion first. Returns `false` once
/// `each` declines further frames.
pub(crate) fn resolve_ip(ip: *mut c_void, each: &mut dyn FnMut(Frame) -> bool) -> bool {
    let mut keep_going = true;
    backtrace::resolve(ip, |symbol| {
        if !keep_going {
            return;
        }
        if let Some(frame) = frame_from_symbol(symbol) {
            keep_going = each(frame);
        }
    });
    keep_going
}

/// Frames the runtime cannot place in a source file are not representable
/// as `(file, line, function)` and are skipped.
pub(crate) fn frame_from_symbol(symbol: &backtrace::Symbol) -> Option<Frame> {
    let file = symbol.filename()?;
    let line = symbol.lineno()?;
    let function = symbol
        .name()
        .map(|name| format!("{name:#}"))
        .unwrap_or_else(|| UNKNOWN_FUNCTION.to_owned());
    Some(Frame::new(file.to_string_lossy(), line, function))
}

/// Tracks whether a live walk has passed the capture entry points yet.
///
/// The leading frames of a raw walk are the unwinder and this crate's own
/// entry points; the first frame past that contiguous run belongs to the
/// capture caller. If the entry symbols never resolve, nothing is emitted,
/// which the caller already treats as a valid empty capture.
struct EntryBoundary {
    passed_entry: bool,
    crossed: bool,
}

impl EntryBoundary {
    fn new() -> Self {
        Self {
            passed_entry: false,
            crossed: false,
        }
    }

    /// `true` once `function` belongs to the capture caller's side of the
    /// stack.
    fn crossed(&mut self, function: &str) -> bool {
        if self.crossed {
            return true;
        }
        if is_entry_symbol(function) {
            self.passed_entry = true;
            return false;
        }
        if self.passed_entry {
            self.crossed = true;
            return true;
        }
        false
    }
}
