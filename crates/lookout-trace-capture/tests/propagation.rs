use lookout_trace_capture::{PropagationChain, capture_stacktrace};

mod storage {
    use lookout_trace_capture::PropagationChain;

    #[inline(never)]
    pub fn read_index() -> PropagationChain {
        std::hint::black_box(PropagationChain::capture_origin())
    }

    #[inline(never)]
    pub fn open_segment() -> PropagationChain {
        std::hint::black_box(read_index())
    }
}

#[test]
fn origin_chain_leads_with_the_failing_frame() {
    let chain = storage::open_segment();
    let trace = capture_stacktrace(chain);
    assert!(
        !trace.is_empty(),
        "origin snapshot produced no application frames"
    );
    let functions: Vec<&str> = trace.iter().map(|f| f.function.as_str()).collect();
    assert!(
        functions[0].contains("read_index"),
        "deepest frame must lead, got {functions:?}"
    );
    let read_at = functions
        .iter()
        .position(|f| f.contains("read_index"))
        .expect("read_index frame missing");
    let open_at = functions
        .iter()
        .position(|f| f.contains("open_segment"))
        .expect("open_segment frame missing");
    assert!(
        read_at < open_at,
        "origin must precede its handler: {functions:?}"
    );
}

#[test]
fn origin_chain_excludes_capture_machinery() {
    let trace = capture_stacktrace(storage::open_segment());
    assert!(
        trace
            .iter()
            .all(|f| !f.function.starts_with("lookout_trace_capture::")
                && !f.function.starts_with("backtrace::")),
        "capture machinery leaked into the chain: {:#?}",
        trace.frames()
    );
}
