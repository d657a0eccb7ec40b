//! # Symbol Subsystem
//!
//! Interface to whatever answers "give me the file with this name, timestamp
//! and size" for the artifact resolver.
//!
//! A [`SymbolProvider`] opens a [`SymbolSession`]; the session performs
//! lookups and must be closed exactly once. The resolver never holds a
//! session directly, it wraps it in a [`SessionGuard`] so the close happens on
//! every exit path.
//!
//! ## Implementations
//!
//! - **Windows**: [`DbgHelpProvider`](crate::platform::windows::DbgHelpProvider),
//!   backed by `SymFindFileInPathW` from `dbghelp.dll` (which delegates to
//!   `symsrv.dll` for `srv*` elements, downloads included)
//! - **All platforms**: [`SymbolStoreProvider`], which searches the local
//!   directories named in a symbol path
//!
//! ## Example
//!
//! ```rust,no_run
//! use sosloader_core::symbols::{SessionGuard, SymbolPath, SymbolProvider, SymbolStoreProvider};
//! use sosloader_core::types::ArtifactDescriptor;
//!
//! let mut provider = SymbolStoreProvider::new(SymbolPath::parse("srv*C:\\symbols"));
//! let mut session = SessionGuard::new(provider.open_session()?);
//! let found = session.find_file(&ArtifactDescriptor::new("clr.dll", 0x4ba1_da25, 0x009b_6000));
//! println!("clr.dll: {found:?}");
//! session.finish()?;
//! # Ok::<(), sosloader_core::error::SosError>(())
//! ```

mod guard;
mod store;
mod symbol_path;

use std::path::PathBuf;

pub use guard::SessionGuard;
pub use store::{SymbolStoreProvider, SymbolStoreSession};
pub use symbol_path::{StoreLayout, SymbolPath, SymbolPathElement, MICROSOFT_SYMBOL_SERVER};

use crate::error::SosResult;
use crate::types::ArtifactDescriptor;

/// An open connection to the symbol subsystem
pub trait SymbolSession
{
    /// Find the artifact with exactly this name, timestamp and size.
    ///
    /// Returns a local path to the file (possibly inside a downstream cache)
    /// or `None` if no repository has it. Misses are never errors.
    fn find_file(&mut self, artifact: &ArtifactDescriptor) -> Option<PathBuf>;

    /// Release the session.
    ///
    /// Called exactly once by [`SessionGuard`].
    ///
    /// ## Errors
    ///
    /// Returns `Environment` if the underlying subsystem fails to shut down.
    fn close(&mut self) -> SosResult<()>;
}

/// Factory for symbol sessions
pub trait SymbolProvider
{
    type Session: SymbolSession;

    /// Initialize the symbol subsystem.
    ///
    /// ## Errors
    ///
    /// Returns `Environment` if the subsystem cannot be initialized.
    fn open_session(&mut self) -> SosResult<Self::Session>;
}

/// Symbol provider used by the command-line tool on this platform.
#[cfg(windows)]
pub type DefaultSymbolProvider = crate::platform::windows::DbgHelpProvider;

/// Symbol provider used by the command-line tool on this platform.
#[cfg(not(windows))]
pub type DefaultSymbolProvider = SymbolStoreProvider;
