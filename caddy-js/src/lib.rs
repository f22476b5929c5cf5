//! # caddy-js
//!
//! Tooling around JavaScript challenge attempts.
//!
//! - [`runner`] executes a script in a fresh engine context whose only host
//!   object is a capturing `console`, and hands back the captured lines.
//! - [`extract`] parses a source file (TypeScript + JSX superset) and pulls out
//!   the bodies of named function declarations matching a prefix.
//! - [`check`] glues the two together: every extracted attempt is run against
//!   a challenge's test cases.
//!
//! Both the runner and the extractor read their input through
//! [`loader::SourceLoader`].

pub mod check;
pub mod extract;
pub mod loader;
pub mod runner;

pub use check::{AttemptReport, Challenge, CheckError, CheckOptions, TestCase};
pub use extract::{Dialect, ExtractError, ExtractOptions, Extractor, FunctionMatch, OutputFormat};
pub use loader::{LoaderError, SourceLoader};
pub use runner::{Bindings, RunError, RunOutcome, Runner, RunnerOptions};
