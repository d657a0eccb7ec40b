//! # Launch Adapter
//!
//! Builds the debugger command line that opens a dump with SOS and the DAC
//! loaded from a resolution result, and starts it.
//!
//! Composition is pure so it can be checked without spawning anything:
//!
//! ```rust
//! use std::path::PathBuf;
//!
//! use sosloader_core::launch::DebuggerCommand;
//! use sosloader_core::types::{ArtifactKind, ArtifactStatus, ResolutionResult};
//!
//! let result = ResolutionResult {
//!     destination: PathBuf::from("C:\\Windows\\Microsoft.NET\\Framework64\\v4.0.30319"),
//!     runtime_name: "clr",
//!     statuses: ArtifactKind::ALL.iter().map(|kind| (*kind, ArtifactStatus::AlreadyLocal)).collect(),
//! };
//! let command = DebuggerCommand::new("windbg.exe", "crash.dmp", &result);
//! assert_eq!(command.command_line(), "windbg.exe -z crash.dmp -c \".loadby sos clr\"");
//! ```

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Command;

use tracing::info;

use crate::error::{SosError, SosResult};
use crate::types::ResolutionResult;

/// Default debugger executable (must be on `PATH`)
pub const DEFAULT_DEBUGGER: &str = "windbg.exe";

/// Debugger directive that loads SOS and points the DAC search at the result.
///
/// - Local match: `.loadby sos <runtime>` (SOS is loaded from next to the runtime module)
/// - Otherwise: `.load <dir>/sos; .cordll -se -lp <dir>`
#[must_use]
pub fn load_directive(result: &ResolutionResult) -> String
{
    if result.is_local_match() {
        format!(".loadby sos {}", result.runtime_name)
    } else {
        format!(
            ".load {}; .cordll -se -lp {}",
            result.destination.join("sos").display(),
            result.destination.display()
        )
    }
}

/// A debugger invocation for a dump
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebuggerCommand
{
    pub program: PathBuf,
    pub dump_path: PathBuf,
    pub directive: String,
}

impl DebuggerCommand
{
    pub fn new(program: impl Into<PathBuf>, dump_path: impl Into<PathBuf>, result: &ResolutionResult) -> Self
    {
        Self {
            program: program.into(),
            dump_path: dump_path.into(),
            directive: load_directive(result),
        }
    }

    /// Arguments passed to the debugger: `-z <dump> -c <directive>`.
    #[must_use]
    pub fn args(&self) -> Vec<OsString>
    {
        vec![
            OsString::from("-z"),
            self.dump_path.clone().into_os_string(),
            OsString::from("-c"),
            OsString::from(&self.directive),
        ]
    }

    /// Human-readable command line, with the directive quoted.
    #[must_use]
    pub fn command_line(&self) -> String
    {
        format!(
            "{} -z {} -c \"{}\"",
            self.program.display(),
            self.dump_path.display(),
            self.directive
        )
    }

    /// Start the debugger without waiting for it.
    ///
    /// ## Errors
    ///
    /// Returns `Environment` if the process cannot be started (e.g. the
    /// debugger is not on `PATH`).
    pub fn spawn(&self) -> SosResult<()>
    {
        info!("Launching {}", self.command_line());
        let child = Command::new(&self.program)
            .args(self.args())
            .spawn()
            .map_err(|err| SosError::environment(format!("Starting {}", self.program.display()), err))?;
        info!("Debugger started with PID {}", child.id());
        Ok(())
    }
}

#[cfg(test)]
mod tests
{
    use std::path::Path;

    use super::*;
    use crate::types::{ArtifactKind, ArtifactStatus};

    fn result_with(status: ArtifactStatus, destination: &str) -> ResolutionResult
    {
        ResolutionResult {
            destination: PathBuf::from(destination),
            runtime_name: "mscorwks",
            statuses: ArtifactKind::ALL.iter().map(|kind| (*kind, status)).collect(),
        }
    }

    #[test]
    fn test_local_match_uses_loadby()
    {
        let result = result_with(ArtifactStatus::AlreadyLocal, "/opt/framework");
        assert_eq!(load_directive(&result), ".loadby sos mscorwks");
    }

    #[test]
    fn test_retrieved_uses_load_and_cordll()
    {
        let result = result_with(ArtifactStatus::Retrieved, "/tmp/2.0.50727.8009");
        let expected = format!(
            ".load {}; .cordll -se -lp /tmp/2.0.50727.8009",
            Path::new("/tmp/2.0.50727.8009").join("sos").display()
        );
        assert_eq!(load_directive(&result), expected);
    }

    #[test]
    fn test_partial_result_still_loads_from_destination()
    {
        let mut result = result_with(ArtifactStatus::Retrieved, "/tmp/4.0.30319.0");
        result.statuses.insert(ArtifactKind::DataAccess, ArtifactStatus::NotFound);
        assert!(load_directive(&result).starts_with(".load "));
    }

    #[test]
    fn test_command_args()
    {
        let result = result_with(ArtifactStatus::AlreadyLocal, "/opt/framework");
        let command = DebuggerCommand::new("windbg.exe", "/dumps/app.dmp", &result);
        assert_eq!(
            command.args(),
            vec![
                OsString::from("-z"),
                OsString::from("/dumps/app.dmp"),
                OsString::from("-c"),
                OsString::from(".loadby sos mscorwks"),
            ]
        );
        assert_eq!(
            command.command_line(),
            "windbg.exe -z /dumps/app.dmp -c \".loadby sos mscorwks\""
        );
    }

    #[test]
    fn test_spawn_missing_debugger()
    {
        let result = result_with(ArtifactStatus::AlreadyLocal, "/opt/framework");
        let command = DebuggerCommand::new("/definitely/not/a/debugger", "/dumps/app.dmp", &result);
        assert!(matches!(command.spawn(), Err(SosError::Environment { .. })));
    }
}
