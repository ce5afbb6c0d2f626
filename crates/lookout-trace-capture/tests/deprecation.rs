#![allow(deprecated)]

use lookout_trace_capture::{CallChain, capture, capture_backtrace};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

/// Counts warn-level events emitted by the capture crate.
struct WarnCounter(Arc<AtomicUsize>);

impl<S: Subscriber> Layer<S> for WarnCounter {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if *metadata.level() == Level::WARN && metadata.target().starts_with("lookout_trace_capture")
        {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[inline(never)]
fn capture_both() -> (CallChain, CallChain) {
    // One source line, so both chains record the same call site.
    (capture(), capture_backtrace())
}

#[test]
fn capture_alias_warns_once_per_call_and_matches_capture_backtrace() {
    // Warm the init-once roots and provider selection so their one-time
    // diagnostics are not attributed to the alias.
    let _ = capture_backtrace();

    let warnings = Arc::new(AtomicUsize::new(0));

    let subscriber = tracing_subscriber::registry().with(WarnCounter(warnings.clone()));
    let (aliased, direct) = tracing::subscriber::with_default(subscriber, capture_both);
    assert_eq!(
        warnings.load(Ordering::SeqCst),
        1,
        "one deprecation event per alias call"
    );
    assert_eq!(aliased, direct, "alias content must match capture_backtrace");

    let subscriber = tracing_subscriber::registry().with(WarnCounter(warnings.clone()));
    tracing::subscriber::with_default(subscriber, || {
        let _ = capture();
        let _ = capture();
    });
    assert_eq!(
        warnings.load(Ordering::SeqCst),
        3,
        "every alias call emits its own event"
    );
}
