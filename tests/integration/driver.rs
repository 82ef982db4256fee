//! Runs through the driver and the console bridges

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam::channel::Receiver;
use snippad::console::{console, console_input, ConsoleBuffer, ConsoleEvent, ConsoleInput, Stream};
use snippad::driver::{Driver, DriverError};
use snippad::session::Session;

fn driver_with_input() -> (Driver, ConsoleInput, Receiver<ConsoleEvent>) {
    let (sender, events) = console();
    let (input, reader) = console_input(Some(sender.clone()));
    let session = Session::builder()
        .out(sender.writer(Stream::Out))
        .err(sender.writer(Stream::Err))
        .input(reader)
        .build()
        .unwrap();
    (Driver::new(Arc::new(session), sender), input, events)
}

/// Wait until `event` arrives, applying everything before it
fn wait_for(
    events: &Receiver<ConsoleEvent>,
    buffer: &mut ConsoleBuffer,
    event: ConsoleEvent,
) {
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let received = events
            .recv_timeout(remaining)
            .unwrap_or_else(|_| panic!("timed out waiting for {:?}", event));
        let found = received == event;
        buffer.apply(received);
        if found {
            return;
        }
    }
}

#[test]
fn test_failures_do_not_stop_the_run() {
    let (driver, _input, events) = driver_with_input();
    let summary = driver
        .run_blocking(
            "int a = 1;\nint b = a / 0;\nundefined();\nSystem.out.println(a + b);\n",
            &[],
        )
        .unwrap();
    assert_eq!(summary.units, 4);
    assert_eq!(summary.valid, 2);
    assert_eq!(summary.thrown, 1);
    assert_eq!(summary.rejected, 1);

    let mut buffer = ConsoleBuffer::new();
    buffer.drain(&events);
    let text = buffer.text();
    assert!(text.contains("ArithmeticException: / by zero"));
    assert!(text.contains("\"undefined();\" -> cannot find symbol"));
    assert!(text.ends_with("1\nCode evaluation successful at \"System.out.println(a + b);\"\n"));
}

#[test]
fn test_oversized_repeat_throws_and_run_continues() {
    let (driver, _input, events) = driver_with_input();
    let summary = driver
        .run_blocking(
            "text.repeat(\"ab\", 9223372036854775807);\nint after = 1;\nafter;",
            &["text.*".to_string()],
        )
        .unwrap();
    assert_eq!(summary.units, 3);
    assert_eq!(summary.thrown, 1);
    assert_eq!(summary.valid, 2);

    let mut buffer = ConsoleBuffer::new();
    buffer.drain(&events);
    assert!(buffer.text().contains("requested length too large"));
    assert_eq!(driver.session().variables(), ["int after = 1"]);
}

#[test]
fn test_deep_nesting_is_rejected_and_run_continues() {
    let (driver, _input, events) = driver_with_input();
    let source = format!(
        "{}1{};\nint after = 2;\nafter;",
        "(".repeat(200_000),
        ")".repeat(200_000)
    );
    let summary = driver.run_blocking(source, &[]).unwrap();
    assert_eq!(summary.units, 3);
    assert_eq!(summary.rejected, 1);
    assert_eq!(summary.valid, 2);

    let mut buffer = ConsoleBuffer::new();
    buffer.drain(&events);
    assert!(buffer.text().contains("too deeply nested"));
    assert_eq!(driver.session().variables(), ["int after = 2"]);
}

#[test]
fn test_incomplete_tail_is_never_evaluated() {
    let (driver, _input, _events) = driver_with_input();
    let summary = driver
        .run_blocking("int x = 1;\nint y = ", &[])
        .unwrap();
    assert_eq!(summary.units, 1);
    assert_eq!(summary.remainder.trim(), "int y =");
    assert_eq!(driver.session().variables(), ["int x = 1"]);
}

#[test]
fn test_input_round_trip() {
    let (driver, input, events) = driver_with_input();
    let handle = driver
        .run("String name = io.readLine();\nSystem.out.println(\"hi \" + name);", &[])
        .unwrap();

    let mut buffer = ConsoleBuffer::new();
    wait_for(&events, &mut buffer, ConsoleEvent::InputRequested);
    input.submit("ada").unwrap();
    wait_for(&events, &mut buffer, ConsoleEvent::RunFinished);

    assert_eq!(handle.join().unwrap().valid, 2);
    assert!(buffer.text().contains("hi ada\n"));
}

#[test]
fn test_close_unblocks_pending_read() {
    let (driver, _input, events) = driver_with_input();
    let handle = driver
        .run("String line = System.in.readLine();\nline;", &[])
        .unwrap();

    let mut buffer = ConsoleBuffer::new();
    wait_for(&events, &mut buffer, ConsoleEvent::InputRequested);
    let started = Instant::now();
    driver.session().close().unwrap();
    wait_for(&events, &mut buffer, ConsoleEvent::RunFinished);
    assert!(started.elapsed() < Duration::from_secs(5));

    // The run ends either with the read returning null or with the
    // session refusing the next unit
    let _ = handle.join();
    assert!(driver.session().is_closed());
}

#[test]
fn test_close_interrupts_infinite_loop() {
    let (driver, _input, events) = driver_with_input();
    let handle = driver
        .run("{ System.out.println(\"start\"); while (true) {} }", &[])
        .unwrap();

    let mut buffer = ConsoleBuffer::new();
    let deadline = Instant::now() + Duration::from_secs(10);
    while !buffer.text().contains("start\n") {
        assert!(Instant::now() < deadline, "loop never started");
        buffer.drain(&events);
        thread::sleep(Duration::from_millis(5));
    }
    driver.session().close().unwrap();
    wait_for(&events, &mut buffer, ConsoleEvent::RunFinished);
    let summary = handle.join().unwrap();
    assert_eq!(summary.thrown, 1);
    assert!(buffer.text().contains("InterruptedException"));
}

#[test]
fn test_second_run_is_busy() {
    let (driver, input, events) = driver_with_input();
    let first = driver.run("String s = io.readLine();", &[]).unwrap();
    assert!(driver.is_busy());
    assert!(matches!(driver.run("1;", &[]), Err(DriverError::Busy)));

    let mut buffer = ConsoleBuffer::new();
    wait_for(&events, &mut buffer, ConsoleEvent::InputRequested);
    input.submit("done").unwrap();
    first.join().unwrap();
    assert!(!driver.is_busy());
    assert_eq!(driver.run_blocking("s;", &[]).unwrap().valid, 1);
}

#[test]
fn test_cancel_stops_between_units() {
    let (driver, _input, events) = driver_with_input();
    let handle = driver
        .run("int n = 0;\nwhile (true) { n++; }\nn = -1;", &[])
        .unwrap();

    let mut buffer = ConsoleBuffer::new();
    wait_for(
        &events,
        &mut buffer,
        ConsoleEvent::Status("Code evaluation successful at \"int n = 0;\"".to_string()),
    );
    handle.cancel();
    let summary = handle.join().unwrap();
    assert!(summary.cancelled);
    assert!(summary.units <= 2);
    assert!(driver.session().evaluate("n;").unwrap()[0].value.as_deref() != Some("-1"));
}
