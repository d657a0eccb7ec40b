//! Artifact descriptors and resolution results.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Identity of a single binary in a symbol repository
///
/// A symbol repository is keyed by (file name, build timestamp, image size),
/// not by content hash. Lookups are exact on all three fields.
///
/// ## Example
///
/// ```rust
/// use std::path::Path;
///
/// use sosloader_core::types::ArtifactDescriptor;
///
/// let dac = ArtifactDescriptor::new("mscordacwks.dll", 0x4ba1_da25, 0x00a9_a000);
/// assert_eq!(dac.index_key(), "4BA1DA25a9a000");
/// assert_eq!(
///     dac.store_path(),
///     Path::new("mscordacwks.dll").join("4BA1DA25a9a000").join("mscordacwks.dll")
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactDescriptor
{
    pub file_name: String,
    pub time_stamp: u32,
    pub file_size: u32,
}

impl ArtifactDescriptor
{
    #[must_use]
    pub fn new(file_name: impl Into<String>, time_stamp: u32, file_size: u32) -> Self
    {
        Self {
            file_name: file_name.into(),
            time_stamp,
            file_size,
        }
    }

    /// Same timestamp and size under another file name.
    ///
    /// Runtime, SOS and DAC binaries are all indexed under the runtime
    /// module's timestamp and size.
    #[must_use]
    pub fn renamed(&self, file_name: impl Into<String>) -> Self
    {
        Self {
            file_name: file_name.into(),
            time_stamp: self.time_stamp,
            file_size: self.file_size,
        }
    }

    /// Symbol-store index directory: upper-case 8-digit timestamp followed by the lower-case size.
    #[must_use]
    pub fn index_key(&self) -> String
    {
        format!("{:08X}{:x}", self.time_stamp, self.file_size)
    }

    /// Relative location of this artifact inside a symbol store.
    #[must_use]
    pub fn store_path(&self) -> PathBuf
    {
        [self.file_name.as_str(), self.index_key().as_str(), self.file_name.as_str()]
            .iter()
            .collect()
    }
}

impl fmt::Display for ArtifactDescriptor
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(
            f,
            "{} (timestamp 0x{:08x}, size 0x{:x})",
            self.file_name, self.time_stamp, self.file_size
        )
    }
}

/// The three support binaries a managed dump needs
///
/// [`ArtifactKind::ALL`] is the order lookups are issued in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ArtifactKind
{
    /// The runtime itself (`clr` / `mscorwks`)
    RuntimeLibrary,
    /// The SOS debugger extension
    SymbolProvider,
    /// The data-access component (DAC)
    DataAccess,
}

impl ArtifactKind
{
    pub const ALL: [ArtifactKind; 3] = [
        ArtifactKind::RuntimeLibrary,
        ArtifactKind::SymbolProvider,
        ArtifactKind::DataAccess,
    ];
}

impl fmt::Display for ArtifactKind
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            ArtifactKind::RuntimeLibrary => write!(f, "CLR"),
            ArtifactKind::SymbolProvider => write!(f, "SOS"),
            ArtifactKind::DataAccess => write!(f, "DAC"),
        }
    }
}

/// Outcome for one artifact of a resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactStatus
{
    /// Found in the symbol repository and copied to the destination
    Retrieved,
    /// The symbol repository has no entry for the artifact
    NotFound,
    /// Matching binaries are already installed on this machine
    AlreadyLocal,
}

/// Result of resolving one runtime instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionResult
{
    /// Directory holding the artifacts (usable verbatim in `.load` / `.cordll`)
    pub destination: PathBuf,
    /// Runtime library base name, `clr` or `mscorwks`
    pub runtime_name: &'static str,
    /// Status of every artifact kind
    pub statuses: BTreeMap<ArtifactKind, ArtifactStatus>,
}

impl ResolutionResult
{
    /// Status for one artifact kind.
    ///
    /// Every resolution records all three kinds; a missing entry reads as `NotFound`.
    #[must_use]
    pub fn status(&self, kind: ArtifactKind) -> ArtifactStatus
    {
        self.statuses.get(&kind).copied().unwrap_or(ArtifactStatus::NotFound)
    }

    /// True when the machine already had the artifacts and nothing was fetched.
    #[must_use]
    pub fn is_local_match(&self) -> bool
    {
        ArtifactKind::ALL
            .iter()
            .all(|kind| self.status(*kind) == ArtifactStatus::AlreadyLocal)
    }

    /// Number of artifacts copied into the destination.
    #[must_use]
    pub fn retrieved_count(&self) -> usize
    {
        self.statuses
            .values()
            .filter(|status| **status == ArtifactStatus::Retrieved)
            .count()
    }
}
