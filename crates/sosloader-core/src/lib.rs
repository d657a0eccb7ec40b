//! # sosloader-core
//!
//! Resolves the debug support files needed to analyze a managed (.NET
//! Framework) crash dump.
//!
//! Debugging a CLR dump requires three binaries that exactly match the
//! runtime build the dump was taken with:
//! - the runtime library itself (`clr.dll` / `mscorwks.dll`)
//! - the SOS debugger extension
//! - the data access component (DAC, `mscordacwks.dll`)
//!
//! This crate finds the runtime in a dump, checks whether the exact build is
//! installed locally, and otherwise fetches the three files from a symbol
//! store into a per-version directory.
//!
//! ## Pipeline
//!
//! 1. [`inspector::MinidumpInspector`] reads the dump and reports the target
//!    architecture plus every loaded runtime instance.
//! 2. [`inspector::select_runtime`] requires exactly one runtime.
//! 3. [`resolver::ArtifactResolver`] checks the architecture, short-circuits
//!    on a local match, and otherwise looks up each artifact through a
//!    [`symbols::SymbolProvider`] session.
//! 4. [`launch::DebuggerCommand`] builds the debugger command line that loads
//!    SOS and the DAC from the result.
//!
//! ## Platform Support
//!
//! - **Windows**: Symbol lookups go through `dbghelp.dll`/`symsrv.dll`, which
//!   handle remote symbol servers.
//! - **Other platforms**: Only local symbol stores and flat directories are
//!   searched.
//!
//! ## Why unsafe code is needed
//!
//! The Windows symbol provider calls `dbghelp.dll` through FFI. Those calls
//! are wrapped in a safe [`symbols::SymbolSession`] implementation.

#![allow(unsafe_code)] // Required for the dbghelp FFI on Windows

pub mod error;
pub mod inspector;
pub mod launch;
pub mod naming;
pub mod pe;
pub mod platform;
pub mod resolver;
pub mod symbols;
pub mod types;

// Re-export commonly used types
pub use error::{SosError, SosResult};
pub use inspector::{select_runtime, DumpInspection, DumpInspector, MinidumpInspector};
pub use launch::DebuggerCommand;
pub use resolver::{ArtifactResolver, ResolverOptions};
pub use symbols::{DefaultSymbolProvider, SymbolPath, SymbolProvider, SymbolSession};
pub use types::{
    Architecture, ArtifactDescriptor, ArtifactKind, ArtifactStatus, ResolutionResult, RuntimeInstance,
    RuntimeVersion, TargetDescriptor, TargetPlatform,
};
