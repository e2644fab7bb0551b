//! Host toolchain lookups and compiler process execution.
//!
//! Everything here touches the host outside the workspace: querying Xcode for
//! SDK locations, walking `PATH` past `ccache` shims, and spawning compilers.
//! Both seams are traits ([`HostToolchain`], [`ProcessRunner`]) so the
//! extraction pipeline can be driven by fakes in tests.

#![warn(missing_docs)]

pub mod error;
pub mod host;
pub mod quote;
pub mod runner;

pub use error::ToolchainError;
pub use host::{HostToolchain, SystemToolchain};
pub use quote::{list2cmdline, param_file_contents, posix_quote};
pub use runner::{Invocation, ProcessOutput, ProcessRunner, SystemRunner};
