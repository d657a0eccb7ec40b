//! # Artifact Naming
//!
//! File names used for symbol-store lookups and for the files written to the
//! destination directory.
//!
//! | artifact       | lookup name                                            | canonical name       |
//! |----------------|--------------------------------------------------------|----------------------|
//! | runtime        | `clr.dll` (major ≥ 4) / `mscorwks.dll`                 | same                 |
//! | SOS            | `sos_<host>_<target>_<major>.<minor>.<rev>.<patch:02>.dll` | `SOS.dll`        |
//! | DAC            | `mscordacwks_<target>_<target>_<version>.dll`          | `mscordacwks.dll`    |
//!
//! The canonical names are consumed verbatim by the debugger's `.load` and
//! `.cordll` directives.
//!
//! Symbol servers only publish these binaries for the Windows .NET Framework,
//! so every name carries the `.dll` extension whatever OS a dump came from.

use crate::types::{Architecture, ArtifactKind, RuntimeVersion};

/// Extension of every artifact name.
const LIBRARY_EXTENSION: &str = "dll";

/// Runtime library base names by minimum major version, highest first.
const RUNTIME_NAMES: &[(u32, &str)] = &[(4, "clr"), (0, "mscorwks")];

/// Base name of the runtime library for a runtime version.
///
/// ```rust
/// use sosloader_core::naming::runtime_library_name;
/// use sosloader_core::types::RuntimeVersion;
///
/// assert_eq!(runtime_library_name(RuntimeVersion::new(2, 0, 50727, 8009)), "mscorwks");
/// assert_eq!(runtime_library_name(RuntimeVersion::new(4, 0, 30319, 0)), "clr");
/// ```
#[must_use]
pub fn runtime_library_name(version: RuntimeVersion) -> &'static str
{
    RUNTIME_NAMES
        .iter()
        .find(|(min_major, _)| version.major >= *min_major)
        .map_or("mscorwks", |(_, name)| *name)
}

/// Lookup name of the SOS extension.
///
/// `host` is the architecture of this process and `target` the dump's. The
/// architecture gate currently forces both to the same pointer width, but the
/// symbol store encodes them separately, so both are kept. Returns `None` when
/// the host architecture has no pointer-width tag.
///
/// ```rust
/// use sosloader_core::naming::symbol_provider_lookup_name;
/// use sosloader_core::types::{Architecture, RuntimeVersion};
///
/// let name = symbol_provider_lookup_name(Architecture::Amd64, Architecture::Amd64, RuntimeVersion::new(4, 0, 30319, 0));
/// assert_eq!(name.as_deref(), Some("sos_amd64_Amd64_4.0.30319.00.dll"));
/// ```
#[must_use]
pub fn symbol_provider_lookup_name(host: Architecture, target: Architecture, version: RuntimeVersion) -> Option<String>
{
    let host_tag = host.pointer_width_tag()?;
    Some(format!(
        "sos_{host_tag}_{target}_{}.{LIBRARY_EXTENSION}",
        version.file_name_component()
    ))
}

/// Name the DAC is indexed under for a runtime module of the given version.
///
/// Dumps do not carry the DAC's name, so the inspector derives it from the
/// dump's own architecture; both architecture fields are the target's.
/// A target without a pointer-width tag gets the canonical `mscordacwks.dll`;
/// the resolver refuses such targets before any lookup.
#[must_use]
pub fn data_access_lookup_name(target: Architecture, version: RuntimeVersion) -> String
{
    match target.pointer_width_tag() {
        Some(tag) => format!(
            "mscordacwks_{tag}_{tag}_{}.{LIBRARY_EXTENSION}",
            version.file_name_component()
        ),
        None => canonical_file_name(ArtifactKind::DataAccess, version),
    }
}

/// Name an artifact is written under in the destination directory.
#[must_use]
pub fn canonical_file_name(kind: ArtifactKind, version: RuntimeVersion) -> String
{
    let base = match kind {
        ArtifactKind::RuntimeLibrary => runtime_library_name(version),
        ArtifactKind::SymbolProvider => "SOS",
        ArtifactKind::DataAccess => "mscordacwks",
    };
    format!("{base}.{LIBRARY_EXTENSION}")
}
