//! Advisory creation, rate limiting, and terminal rendering.
//!
//! This crate provides structured [`Diagnostic`] messages with severity levels
//! and codes. The thread-safe [`DiagnosticSink`] accumulates them while worker
//! threads process compile actions, its [`WarnOnce`] gate keeps run-wide
//! advisories from repeating, and [`TerminalRenderer`] formats the result.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod once;
pub mod renderer;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::{Diagnostic, Severity};
pub use once::{OnceKind, WarnOnce};
pub use renderer::{DiagnosticRenderer, TerminalRenderer};
pub use sink::DiagnosticSink;
