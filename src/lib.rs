//! snippad - a scratchpad for snippet code
//!
//! Program text is split into complete units and evaluated, one unit at a
//! time, against a long-lived session whose variables, methods, imports
//! and classpath persist across runs.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use snippad::console::{console, Stream};
//! use snippad::driver::Driver;
//! use snippad::session::Session;
//!
//! let (sender, events) = console();
//! let session = Session::builder()
//!     .out(sender.writer(Stream::Out))
//!     .err(sender.writer(Stream::Err))
//!     .build()
//!     .unwrap();
//! let driver = Driver::new(Arc::new(session), sender);
//! let summary = driver
//!     .run_blocking("int x = 1;\nx + 1;", &["math.*".to_string()])
//!     .unwrap();
//! assert_eq!(summary.valid, 2);
//! # drop(events);
//! ```

#![doc(html_root_url = "https://docs.rs/snippad")]
#![warn(rust_2018_idioms)]

pub mod console;
pub mod driver;
pub mod frontend;
pub mod registry;
pub mod repl;
pub mod session;
pub mod tui;

// Utility modules
pub mod util;

// Re-exports
pub use driver::{Driver, DriverError, RunHandle, RunSummary};
pub use session::{Session, SessionError, SnippetResult, Status};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const NAME: &str = "snippad";
