use std::sync::Arc;

use super::{HostArg, HostCall, HostCallbackSink, HostError, HostOutput, HostUi};

#[test]
pub fn test_sink_tags_stream_lines() {
    let sink = HostCallbackSink::new();

    sink.write("no newline");
    sink.write_line(Some(" then a line"));
    sink.write_line(None);
    sink.write_debug_line("dbg");
    sink.write_verbose_line("verbose");
    sink.write_warning_line("careful");
    sink.write_error_line("boom");

    let output = sink.drain();
    assert_eq!(
        output.stdout,
        "no newline then a line\n\nDEBUG: dbg\nVERBOSE: verbose\nWARNING: careful\n"
    );
    assert_eq!(output.stderr, "boom\n");
    assert_eq!(output.exit_code, 0);
}

#[test]
pub fn test_sink_drain_resets_everything() {
    let sink = HostCallbackSink::new();
    sink.write_line(Some("hello"));
    sink.write_error_line("bad");
    sink.set_should_exit(3);
    assert!(!sink.is_empty());

    let first = sink.drain();
    assert_eq!(first.exit_code, 3);

    assert!(sink.is_empty());
    assert_eq!(sink.exit_code(), 0);
    assert_eq!(sink.drain(), HostOutput::default());
}

#[test]
pub fn test_sink_last_exit_signal_wins() {
    let sink = HostCallbackSink::new();
    sink.set_should_exit(1);
    sink.set_should_exit(42);
    assert_eq!(sink.exit_code(), 42);
}

#[test]
pub fn test_sink_ignores_progress() {
    let sink = HostCallbackSink::new();
    sink.write_progress(1, &HostArg::from("50%"));
    assert!(sink.is_empty());
}

#[test]
pub fn test_sink_accepts_writes_from_other_threads() {
    let sink = Arc::new(HostCallbackSink::new());

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let sink = Arc::clone(&sink);
            std::thread::spawn(move || {
                for _ in 0..25 {
                    sink.write_line(Some(&format!("thread {i}")));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let output = sink.drain();
    assert_eq!(output.stdout.lines().count(), 100);
}

#[test]
pub fn test_from_raw_write_line() {
    let call = HostCall::try_from_raw(16, &[HostArg::from("Hello, World!")]).unwrap();

    assert_eq!(call, HostCall::WriteLine2(("Hello, World!".to_string(),)));
    assert_eq!(call.method_id(), 16);
    assert_eq!(call.method_name(), "WriteLine2");
}

#[test]
pub fn test_from_raw_set_should_exit() {
    let call = HostCall::try_from_raw(6, &[HostArg::from(42i32)]).unwrap();

    assert_eq!(call, HostCall::SetShouldExit((42,)));
    assert_eq!(call.method_name(), "SetShouldExit");
}

#[test]
pub fn test_from_raw_invalid_method_id() {
    let result = HostCall::try_from_raw(11, &[]);
    assert_eq!(result, Err(HostError::NotImplemented(11)));

    let result = HostCall::try_from_raw(999, &[]);
    assert_eq!(result, Err(HostError::NotImplemented(999)));
}

#[test]
pub fn test_from_raw_invalid_parameters() {
    // WriteLine1 takes no parameters
    let result = HostCall::try_from_raw(15, &[HostArg::from("unexpected")]);
    assert_eq!(result, Err(HostError::InvalidParameters));

    // SetShouldExit wants an Int32
    let result = HostCall::try_from_raw(6, &[HostArg::from("1")]);
    assert_eq!(result, Err(HostError::InvalidParameters));

    // Write2 is missing the text
    let result = HostCall::try_from_raw(14, &[HostArg::from(1i32), HostArg::from(2i32)]);
    assert_eq!(result, Err(HostError::InvalidParameters));
}

#[test]
pub fn test_dispatch_routes_to_sink() {
    let sink = HostCallbackSink::new();

    let calls = [
        HostCall::try_from_raw(
            14,
            &[HostArg::from(7i32), HostArg::from(0i32), HostArg::from("colored ")],
        )
        .unwrap(),
        HostCall::try_from_raw(15, &[]).unwrap(),
        HostCall::try_from_raw(
            17,
            &[HostArg::from(7i32), HostArg::from(0i32), HostArg::from("line")],
        )
        .unwrap(),
        HostCall::try_from_raw(21, &[HostArg::from("v")]).unwrap(),
        HostCall::try_from_raw(22, &[HostArg::from("w")]).unwrap(),
        HostCall::try_from_raw(19, &[HostArg::from("d")]).unwrap(),
        HostCall::try_from_raw(18, &[HostArg::from("e")]).unwrap(),
        HostCall::try_from_raw(20, &[HostArg::from(1i64), HostArg::Null]).unwrap(),
        HostCall::try_from_raw(6, &[HostArg::from(5i32)]).unwrap(),
    ];

    for call in calls {
        call.dispatch(&sink);
    }

    let output = sink.drain();
    assert_eq!(
        output.stdout,
        "colored \nline\nVERBOSE: v\nWARNING: w\nDEBUG: d\n"
    );
    assert_eq!(output.stderr, "e\n");
    assert_eq!(output.exit_code, 5);
}
