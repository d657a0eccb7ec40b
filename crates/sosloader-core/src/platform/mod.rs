//! # Platform-Specific Implementations
//!
//! This module contains symbol subsystem implementations that depend on an
//! operating system API.
//!
//! - **Windows**: Uses `dbghelp.dll` (`SymInitializeW`, `SymFindFileInPathW`, `SymCleanup`)
//!   - See: [DbgHelp Functions](https://learn.microsoft.com/en-us/windows/win32/debug/dbghelp-functions)
//!
//! Other platforms fall back to [`SymbolStoreProvider`](crate::symbols::SymbolStoreProvider),
//! which only searches local symbol stores.

#[cfg(windows)]
pub mod windows;
