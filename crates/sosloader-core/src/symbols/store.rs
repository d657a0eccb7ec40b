//! Symbol lookups against local symbol stores and flat directories.
//!
//! This provider only reads what is already on disk. Remote servers named in
//! the symbol path are skipped; fetching from them is the job of the OS
//! symbol API (see the Windows provider).

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, trace, warn};

use super::{StoreLayout, SymbolPath, SymbolProvider, SymbolSession};
use crate::error::SosResult;
use crate::types::ArtifactDescriptor;

/// Name of the redirection file a symbol store may hold instead of the binary.
const POINTER_FILE: &str = "file.ptr";

/// [`SymbolProvider`] backed by the local directories of a [`SymbolPath`]
#[derive(Debug, Clone)]
pub struct SymbolStoreProvider
{
    path: SymbolPath,
}

impl SymbolStoreProvider
{
    #[must_use]
    pub fn new(path: SymbolPath) -> Self
    {
        Self { path }
    }

    pub fn symbol_path(&self) -> &SymbolPath
    {
        &self.path
    }
}

impl SymbolProvider for SymbolStoreProvider
{
    type Session = SymbolStoreSession;

    fn open_session(&mut self) -> SosResult<Self::Session>
    {
        let directories = self.path.local_directories();
        if self.path.has_remote_server() {
            warn!(
                "Remote symbol servers in '{}' are not contacted on this platform; only local stores are searched",
                self.path
            );
        }
        debug!("Opened symbol store session over {} directories", directories.len());
        Ok(SymbolStoreSession { directories })
    }
}

/// Session returned by [`SymbolStoreProvider`]
#[derive(Debug)]
pub struct SymbolStoreSession
{
    directories: Vec<(PathBuf, StoreLayout)>,
}

impl SymbolStoreSession
{
    fn lookup_in(directory: &Path, layout: StoreLayout, artifact: &ArtifactDescriptor) -> Option<PathBuf>
    {
        match layout {
            StoreLayout::Flat => Some(directory.join(&artifact.file_name)).filter(|path| path.is_file()),
            StoreLayout::SymbolStore => {
                let candidate = directory.join(artifact.store_path());
                if candidate.is_file() {
                    return Some(candidate);
                }

                let index_dir = directory.join(&artifact.file_name).join(artifact.index_key());
                follow_pointer_file(&index_dir.join(POINTER_FILE))
            }
        }
    }
}

impl SymbolSession for SymbolStoreSession
{
    fn find_file(&mut self, artifact: &ArtifactDescriptor) -> Option<PathBuf>
    {
        for (directory, layout) in &self.directories {
            trace!("Searching {} for {}", directory.display(), artifact.file_name);
            if let Some(found) = Self::lookup_in(directory, *layout, artifact) {
                debug!("Found {artifact} at {}", found.display());
                return Some(found);
            }
        }
        None
    }

    fn close(&mut self) -> SosResult<()>
    {
        self.directories.clear();
        Ok(())
    }
}

/// Resolve a `file.ptr` redirection (`PATH:<target>`); other contents such as `MSG:` are ignored.
fn follow_pointer_file(pointer: &Path) -> Option<PathBuf>
{
    let contents = fs::read_to_string(pointer).ok()?;
    let target = contents.trim().strip_prefix("PATH:")?;
    Some(PathBuf::from(target.trim())).filter(|path| path.is_file())
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn artifact() -> ArtifactDescriptor
    {
        ArtifactDescriptor::new("clr.dll", 0x5d_4a_21_b1, 0x9e_c000)
    }

    #[test]
    fn test_finds_store_entry()
    {
        let store = tempfile::tempdir().unwrap();
        let entry = store.path().join(artifact().store_path());
        fs::create_dir_all(entry.parent().unwrap()).unwrap();
        fs::write(&entry, b"clr").unwrap();

        let mut provider = SymbolStoreProvider::new(SymbolPath::parse(&format!("srv*{}", store.path().display())));
        let mut session = provider.open_session().unwrap();
        assert_eq!(session.find_file(&artifact()), Some(entry));
    }

    #[test]
    fn test_store_requires_exact_identity()
    {
        let store = tempfile::tempdir().unwrap();
        let entry = store.path().join(artifact().store_path());
        fs::create_dir_all(entry.parent().unwrap()).unwrap();
        fs::write(&entry, b"clr").unwrap();

        let mut provider = SymbolStoreProvider::new(SymbolPath::parse(&format!("srv*{}", store.path().display())));
        let mut session = provider.open_session().unwrap();
        let mut other = artifact();
        other.file_size += 0x1000;
        assert_eq!(session.find_file(&other), None);
    }

    #[test]
    fn test_follows_pointer_file()
    {
        let store = tempfile::tempdir().unwrap();
        let share = tempfile::tempdir().unwrap();
        let target = share.path().join("clr.dll");
        fs::write(&target, b"clr").unwrap();

        let index_dir = store.path().join("clr.dll").join(artifact().index_key());
        fs::create_dir_all(&index_dir).unwrap();
        fs::write(index_dir.join(POINTER_FILE), format!("PATH:{}\r\n", target.display())).unwrap();

        let mut provider = SymbolStoreProvider::new(SymbolPath::parse(&format!("cache*{}", store.path().display())));
        let mut session = provider.open_session().unwrap();
        assert_eq!(session.find_file(&artifact()), Some(target));
    }

    #[test]
    fn test_flat_directory_by_name()
    {
        let flat = tempfile::tempdir().unwrap();
        let file = flat.path().join("clr.dll");
        fs::write(&file, b"clr").unwrap();

        let mut provider = SymbolStoreProvider::new(SymbolPath::parse(&flat.path().display().to_string()));
        let mut session = provider.open_session().unwrap();
        assert_eq!(session.find_file(&artifact()), Some(file));
        assert_eq!(session.find_file(&artifact().renamed("SOS.dll")), None);
    }

    #[test]
    fn test_remote_only_path_finds_nothing()
    {
        let mut provider = SymbolStoreProvider::new(SymbolPath::parse("srv*https://msdl.microsoft.com/download/symbols"));
        let mut session = provider.open_session().unwrap();
        assert_eq!(session.find_file(&artifact()), None);
        session.close().unwrap();
    }
}
