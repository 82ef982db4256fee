//! Session behaviour through the public API

use std::io::{self, Write};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;
use snippad::session::{class, ReaderInput, Session, SessionError, Status};

/// Shared in-memory sink
#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl Write for Capture {
    fn write(
        &mut self,
        buf: &[u8],
    ) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn session() -> (Session, Capture, Capture) {
    let out = Capture::default();
    let err = Capture::default();
    let session = Session::builder()
        .out(out.clone())
        .err(err.clone())
        .build()
        .unwrap();
    (session, out, err)
}

#[test]
fn test_declaration_then_expression() {
    let (session, _, _) = session();
    let first = session.evaluate("int x = 1;").unwrap();
    let second = session.evaluate("x + 1;").unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].status, Status::Valid);
    assert_eq!(first[0].value, None);
    assert_eq!(second[0].status, Status::Valid);
    assert_eq!(second[0].value.as_deref(), Some("2"));
}

#[test]
fn test_methods_recursion_and_loops() {
    let (session, out, _) = session();
    session
        .evaluate("int fib(int n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); }")
        .unwrap();
    session
        .evaluate("for (int i = 0; i < 5; i++) { System.out.print(fib(i) + \" \"); }")
        .unwrap();
    assert_eq!(out.text(), "0 1 1 2 3 ");
    assert_eq!(
        session.evaluate("fib(10);").unwrap()[0].value.as_deref(),
        Some("55")
    );
}

#[test]
fn test_strings_echo_quoted() {
    let (session, _, _) = session();
    let results = session.evaluate("\"ab\" + 1;").unwrap();
    assert_eq!(results[0].value.as_deref(), Some("\"ab1\""));
}

#[test]
fn test_imports_resolve_native_packages() {
    let (session, _, _) = session();
    assert!(session.evaluate("sqrt(16.0);").unwrap()[0].is_rejected());
    session.evaluate("import math.*;").unwrap();
    assert_eq!(
        session.evaluate("sqrt(16.0);").unwrap()[0].value.as_deref(),
        Some("4.0")
    );
    assert_eq!(
        session.evaluate("text.upper(\"abc\");").unwrap()[0].value.as_deref(),
        Some("\"ABC\"")
    );

    let rejected = session.evaluate("import nowhere.*;").unwrap();
    assert!(rejected[0].diagnostics[0]
        .message
        .contains("package nowhere does not exist"));
    assert_eq!(session.imports(), ["math.*"]);
}

#[test]
fn test_runtime_errors_carry_trace() {
    let (session, _, _) = session();
    session
        .evaluate("int div(int a, int b) { return a / b; }")
        .unwrap();
    let results = session.evaluate("div(1, 0);").unwrap();
    let thrown = results[0].thrown.as_ref().unwrap();
    assert_eq!(thrown.class, class::ARITHMETIC);
    assert_eq!(thrown.trace, ["div"]);

    let results = session.evaluate("throw \"boom\";").unwrap();
    let thrown = results[0].thrown.as_ref().unwrap();
    assert_eq!(thrown.class, class::RUNTIME);
    assert_eq!(thrown.message, "boom");

    let results = session.evaluate("text.parseInt(\"x1\");").unwrap();
    assert_eq!(results[0].thrown.as_ref().unwrap().class, class::NUMBER_FORMAT);
}

#[test]
fn test_deep_recursion_overflows() {
    let (session, _, _) = session();
    session
        .evaluate("int down(int n) { return down(n + 1); }")
        .unwrap();
    let session = Arc::new(session);
    let worker = {
        let session = session.clone();
        thread::Builder::new()
            .stack_size(64 * 1024 * 1024)
            .spawn(move || session.evaluate("down(0);").unwrap())
            .unwrap()
    };
    let results = worker.join().unwrap();
    let thrown = results[0].thrown.as_ref().unwrap();
    assert_eq!(thrown.class, class::STACK_OVERFLOW);
}

#[test]
fn test_static_rejections() {
    let (session, _, _) = session();
    let cases = [
        ("y;", "cannot find symbol"),
        ("break;", "break outside"),
        ("return 1;", "return outside"),
        ("if (1) {}", "cannot be converted to boolean"),
        ("int f() { }", "missing return"),
    ];
    for (source, expected) in cases {
        let results = session.evaluate(source).unwrap();
        assert!(results[0].is_rejected(), "{} was accepted", source);
        assert!(
            results[0].diagnostics[0].message.contains(expected),
            "{}: {}",
            source,
            results[0].diagnostics[0].message
        );
    }
    assert!(session.variables().is_empty());
    assert!(session.methods().is_empty());
}

#[test]
fn test_redeclaration_replaces() {
    let (session, _, _) = session();
    session.evaluate("int x = 1;").unwrap();
    session.evaluate("String x = \"one\";").unwrap();
    assert_eq!(session.variables(), ["String x = \"one\""]);
}

#[test]
fn test_reads_from_input_source() {
    let out = Capture::default();
    let session = Session::builder()
        .out(out.clone())
        .err(io::sink())
        .input(ReaderInput::new(&b"first\nsecond\n"[..]))
        .build()
        .unwrap();
    session
        .evaluate("System.out.println(System.in.readLine() + \"|\" + io.readLine());")
        .unwrap();
    let results = session.evaluate("System.in.readLine();").unwrap();
    assert_eq!(out.text(), "first|second\n");
    assert_eq!(results[0].value.as_deref(), Some("null"));
}

#[test]
fn test_stderr_is_separate() {
    let (session, out, err) = session();
    session
        .evaluate("System.err.println(\"bad\"); System.out.println(\"good\");")
        .unwrap();
    assert_eq!(out.text(), "good\n");
    assert_eq!(err.text(), "bad\n");
}

#[test]
fn test_close_is_idempotent() {
    let (session, _, _) = session();
    session.close().unwrap();
    session.close().unwrap();
    assert!(session.is_closed());
    assert!(matches!(session.evaluate("1;"), Err(SessionError::Closed)));
}
