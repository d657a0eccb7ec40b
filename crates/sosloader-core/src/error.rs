//! # Error Types
//!
//! General error handling for dump inspection and artifact resolution.
//!
//! We use `thiserror` to automatically generate `Error` trait implementations
//! and nice error messages.
//!
//! A symbol repository not having an artifact is *not* an error. That outcome
//! is reported as [`ArtifactStatus::NotFound`](crate::types::ArtifactStatus::NotFound)
//! in the resolution result so the remaining artifacts are still fetched.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::Architecture;

/// Main error type for sosloader operations
///
/// ## Error Categories
///
/// 1. **Dump errors**: DumpUnreadable
/// 2. **Gate errors**: AmbiguousRuntimeCount, ArchitectureMismatch
/// 3. **Environment errors**: Environment (symbol subsystem, filesystem, process spawn)
///
/// Dump and gate errors stop the tool before any symbol lookup happens.
#[derive(Error, Debug)]
pub enum SosError
{
    /// The crash dump could not be opened or parsed
    ///
    /// This happens when:
    /// - The file does not exist or cannot be read
    /// - The file is not a minidump (or is truncated/corrupt)
    /// - A stream the inspector needs (system info, module list) is missing
    #[error("Unable to read dump {}: {reason}", .path.display())]
    DumpUnreadable
    {
        /// Path of the dump that failed to open
        path: PathBuf,
        /// Description of what went wrong
        reason: String,
    },

    /// The dump does not contain exactly one managed runtime
    ///
    /// Only one runtime is resolved per invocation, so both zero and several
    /// loaded runtimes stop the tool.
    #[error("{}", runtime_count_message(.count))]
    AmbiguousRuntimeCount
    {
        /// Number of runtime instances found in the dump
        count: usize,
    },

    /// The dump and this build of the tool have different pointer widths
    ///
    /// The SOS extension has to be loaded in-process by a debugger of the same
    /// bitness as the dump, so artifacts are never fetched across architectures.
    ///
    /// ## Solution
    ///
    /// Re-run with the build whose pointer width matches the dump.
    #[error("{}", architecture_mismatch_message(.host, .target))]
    ArchitectureMismatch
    {
        /// Architecture of the running process
        host: Architecture,
        /// Architecture recorded in the dump
        target: Architecture,
    },

    /// The environment prevented the resolution from completing
    ///
    /// Examples:
    /// - `SymInitialize` failed (dbghelp.dll missing or broken)
    /// - The destination directory could not be created
    /// - An artifact could not be copied into the destination directory
    /// - The debugger process could not be started
    #[error("{operation} failed: {source}")]
    Environment
    {
        /// What was being attempted
        operation: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl SosError
{
    /// Build an [`SosError::Environment`] from an operation description and an I/O error.
    pub fn environment(operation: impl Into<String>, source: io::Error) -> Self
    {
        Self::Environment {
            operation: operation.into(),
            source,
        }
    }
}

fn runtime_count_message(count: &usize) -> String
{
    match *count {
        0 => "This dump file does not have a CLR loaded in it.".to_string(),
        n => format!("This dump file has multiple CLR versions loaded in it ({n})."),
    }
}

fn architecture_mismatch_message(host: &Architecture, target: &Architecture) -> String
{
    match target.pointer_width() {
        Some(bits) => format!(
            "The dump was captured from a {target} process but this is the {host} build; \
             please use the {bits} bit version of sosloader to analyze this dump."
        ),
        None => format!("The dump was captured from an unsupported architecture ({target})."),
    }
}

/// Convenience type alias for `Result<T, SosError>`
///
/// ```rust
/// use sosloader_core::error::SosResult;
/// fn foo() -> SosResult<()>
/// {
///     Ok(())
/// }
/// ```
pub type SosResult<T> = std::result::Result<T, SosError>;
