//! Runtime instances recorded in a dump.

use std::path::{Path, PathBuf};

use super::{ArtifactDescriptor, RuntimeVersion};

/// One managed runtime loaded in the dumped process
///
/// Produced by a [`DumpInspector`](crate::inspector::DumpInspector). The
/// `dac` descriptor is the identity a symbol repository indexes the runtime's
/// support files under; its timestamp and size are those of the runtime
/// module itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeInstance
{
    /// Version of the runtime build
    pub version: RuntimeVersion,
    /// Data-access module descriptor
    pub dac: ArtifactDescriptor,
    /// Path of a byte-compatible data-access module on this machine, if any
    pub local_match_path: Option<PathBuf>,
}

impl RuntimeInstance
{
    #[must_use]
    pub fn new(version: RuntimeVersion, dac: ArtifactDescriptor) -> Self
    {
        Self {
            version,
            dac,
            local_match_path: None,
        }
    }

    #[must_use]
    pub fn with_local_match(mut self, path: impl Into<PathBuf>) -> Self
    {
        self.local_match_path = Some(path.into());
        self
    }

    /// The local match path, ignoring empty paths.
    pub fn local_match(&self) -> Option<&Path>
    {
        self.local_match_path
            .as_deref()
            .filter(|path| !path.as_os_str().is_empty())
    }
}
