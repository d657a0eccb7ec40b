//! # Windows Symbol Support
//!
//! [`DbgHelpProvider`] drives `dbghelp.dll` through the `winapi` bindings. The
//! symbol handler it initializes is process-global (it is keyed by the current
//! process handle), so at most one [`DbgHelpSession`] can be open at a time.
//!
//! `dbghelp.dll` loads `symsrv.dll` for `srv*` path elements; both have to be
//! reachable (next to the executable or on `PATH`) for downloads to work.
//!
//! ## References
//!
//! - [SymInitializeW](https://learn.microsoft.com/en-us/windows/win32/api/dbghelp/nf-dbghelp-syminitializew)
//! - [SymFindFileInPathW](https://learn.microsoft.com/en-us/windows/win32/api/dbghelp/nf-dbghelp-symfindfileinpathw)
//! - [SymCleanup](https://learn.microsoft.com/en-us/windows/win32/api/dbghelp/nf-dbghelp-symcleanup)

mod dbghelp;

pub use dbghelp::{DbgHelpProvider, DbgHelpSession};
