//! # Dump Inspector
//!
//! Opens a crash dump and reports the managed runtimes loaded in it.
//!
//! All parsing of the dump format is delegated to the `minidump` crate. This
//! module only picks the runtime modules out of the module list and turns each
//! into a [`RuntimeInstance`]:
//!
//! 1. The runtime module is recognized by file name (`clr.dll`, `mscorwks.dll`)
//! 2. The version comes from the module's fixed file info
//! 3. The DAC descriptor reuses the module's timestamp and image size, which
//!    is how symbol servers index the runtime's support binaries
//! 4. A local match is reported when an installed runtime directory holds the
//!    very same runtime build and a DAC next to it
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use sosloader_core::inspector::{select_runtime, DumpInspector, MinidumpInspector};
//!
//! let inspection = MinidumpInspector::new().inspect(Path::new("crash.dmp"))?;
//! let runtime = select_runtime(&inspection.runtimes)?;
//! println!("{} runtime {}", inspection.target.architecture, runtime.version);
//! # Ok::<(), sosloader_core::error::SosError>(())
//! ```

use std::env;
use std::path::{Path, PathBuf};

use minidump::system_info::{Cpu, Os};
use minidump::{Minidump, MinidumpModuleList, MinidumpSystemInfo, Module};
use tracing::{debug, info, warn};

use crate::error::{SosError, SosResult};
use crate::naming::{canonical_file_name, data_access_lookup_name, runtime_library_name};
use crate::pe::PeIdentity;
use crate::types::{
    Architecture, ArtifactDescriptor, ArtifactKind, RuntimeInstance, RuntimeVersion, TargetDescriptor, TargetPlatform,
};

/// File names of runtime modules this tool knows how to service.
const RUNTIME_MODULE_NAMES: &[&str] = &["clr.dll", "mscorwks.dll"];

/// What a dump says about itself and its runtimes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpInspection
{
    pub target: TargetDescriptor,
    /// Runtime instances in the order the dump lists them
    pub runtimes: Vec<RuntimeInstance>,
}

/// Source of [`DumpInspection`]s
pub trait DumpInspector
{
    /// Open the dump at `dump_path` and enumerate its runtimes.
    ///
    /// Read-only; never modifies the dump.
    ///
    /// ## Errors
    ///
    /// - `DumpUnreadable`: the file cannot be opened or is not a supported dump
    fn inspect(&self, dump_path: &Path) -> SosResult<DumpInspection>;
}

/// Apply the one-runtime-per-invocation rule.
///
/// ## Errors
///
/// - `AmbiguousRuntimeCount`: zero or more than one runtime is loaded
pub fn select_runtime(runtimes: &[RuntimeInstance]) -> SosResult<&RuntimeInstance>
{
    match runtimes {
        [single] => Ok(single),
        _ => Err(SosError::AmbiguousRuntimeCount { count: runtimes.len() }),
    }
}

/// A runtime module record as found in the dump's module list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeModule
{
    /// Full path of the module on the dumped machine
    pub path: String,
    pub time_stamp: u32,
    pub size_of_image: u32,
    pub version: RuntimeVersion,
}

impl RuntimeModule
{
    /// Bare file name of the module, accepting either path separator.
    pub fn file_name(&self) -> &str
    {
        module_file_name(&self.path)
    }
}

fn module_file_name(path: &str) -> &str
{
    path.rsplit(['\\', '/']).next().unwrap_or(path)
}

/// Whether a module path names a managed runtime.
#[must_use]
pub fn is_runtime_module(path: &str) -> bool
{
    let name = module_file_name(path);
    RUNTIME_MODULE_NAMES
        .iter()
        .any(|candidate| name.eq_ignore_ascii_case(candidate))
}

/// [`DumpInspector`] for Windows minidumps, built on the `minidump` crate
#[derive(Debug, Clone)]
pub struct MinidumpInspector
{
    runtime_dirs: Vec<PathBuf>,
    search_installed_runtimes: bool,
}

impl Default for MinidumpInspector
{
    fn default() -> Self
    {
        Self::new()
    }
}

impl MinidumpInspector
{
    /// Inspector that looks for local matches in the installed .NET Framework directories.
    #[must_use]
    pub fn new() -> Self
    {
        Self {
            runtime_dirs: Vec::new(),
            search_installed_runtimes: true,
        }
    }

    /// Additional directories searched for a local match, before the installed runtimes.
    #[must_use]
    pub fn with_runtime_dirs(mut self, dirs: impl IntoIterator<Item = PathBuf>) -> Self
    {
        self.runtime_dirs.extend(dirs);
        self
    }

    /// Skip the installed .NET Framework directories and only search the explicit ones.
    #[must_use]
    pub fn without_installed_runtimes(mut self) -> Self
    {
        self.search_installed_runtimes = false;
        self
    }

    /// Turn a runtime module record into a runtime instance.
    ///
    /// Architectures are not judged here; [`ArtifactResolver`](crate::resolver::ArtifactResolver)
    /// rejects the ones this host cannot load.
    #[must_use]
    pub fn runtime_instance(&self, module: &RuntimeModule, architecture: Architecture) -> RuntimeInstance
    {
        let dac_name = data_access_lookup_name(architecture, module.version);
        let dac = ArtifactDescriptor::new(dac_name, module.time_stamp, module.size_of_image);
        let instance = RuntimeInstance::new(module.version, dac);

        match self.find_local_match(module, architecture) {
            Some(path) => instance.with_local_match(path),
            None => instance,
        }
    }

    /// Look for an installed runtime identical to the dumped one.
    ///
    /// A directory matches when its runtime library has the dump's timestamp
    /// and image size and a DAC sits next to it. The DAC path is returned.
    fn find_local_match(&self, module: &RuntimeModule, architecture: Architecture) -> Option<PathBuf>
    {
        let runtime_file = canonical_file_name(ArtifactKind::RuntimeLibrary, module.version);
        let dac_file = canonical_file_name(ArtifactKind::DataAccess, module.version);

        self.candidate_dirs(module.version, architecture)
            .into_iter()
            .find_map(|dir| {
                let identity = PeIdentity::read(&dir.join(&runtime_file))?;
                if identity.time_stamp != module.time_stamp || identity.size_of_image != module.size_of_image {
                    debug!("{} holds a different {runtime_file} build", dir.display());
                    return None;
                }
                Some(dir.join(&dac_file)).filter(|dac| dac.is_file())
            })
    }

    fn candidate_dirs(&self, version: RuntimeVersion, architecture: Architecture) -> Vec<PathBuf>
    {
        let mut dirs = self.runtime_dirs.clone();
        if self.search_installed_runtimes {
            if let Some(windir) = env::var_os("WINDIR") {
                dirs.extend(installed_runtime_dir(Path::new(&windir), version, architecture));
            }
        }
        dirs
    }

    fn read_dump(dump_path: &Path) -> SosResult<(Architecture, TargetPlatform, Vec<RuntimeModule>)>
    {
        let unreadable = |reason: String| SosError::DumpUnreadable {
            path: dump_path.to_path_buf(),
            reason,
        };

        let dump = Minidump::read_path(dump_path).map_err(|err| unreadable(err.to_string()))?;
        let system_info = dump
            .get_stream::<MinidumpSystemInfo>()
            .map_err(|err| unreadable(format!("system info stream: {err}")))?;
        let module_list = dump
            .get_stream::<MinidumpModuleList>()
            .map_err(|err| unreadable(format!("module list stream: {err}")))?;

        let architecture = match system_info.cpu {
            Cpu::X86 => Architecture::X86,
            Cpu::X86_64 => Architecture::Amd64,
            Cpu::Arm => Architecture::Arm,
            Cpu::Arm64 => Architecture::Arm64,
            _ => Architecture::Unknown("unsupported"),
        };
        let platform = match system_info.os {
            Os::Linux => TargetPlatform::Linux,
            Os::MacOs => TargetPlatform::MacOs,
            _ => TargetPlatform::Windows,
        };

        let modules = module_list
            .iter()
            .filter(|module| is_runtime_module(&module.code_file()))
            .map(|module| RuntimeModule {
                path: module.code_file().into_owned(),
                time_stamp: module.raw.time_date_stamp,
                size_of_image: module.raw.size_of_image,
                version: RuntimeVersion::from_file_version(
                    module.raw.version_info.file_version_hi,
                    module.raw.version_info.file_version_lo,
                ),
            })
            .collect();

        Ok((architecture, platform, modules))
    }
}

impl DumpInspector for MinidumpInspector
{
    fn inspect(&self, dump_path: &Path) -> SosResult<DumpInspection>
    {
        let (architecture, platform, modules) = Self::read_dump(dump_path)?;
        info!(
            "Inspected {}: {architecture} {platform} dump with {} runtime module(s)",
            dump_path.display(),
            modules.len()
        );

        if platform != TargetPlatform::Windows {
            warn!("{platform} dumps are not supported; only .NET Framework runtimes on Windows are recognized");
        }

        let runtimes = modules
            .iter()
            .map(|module| self.runtime_instance(module, architecture))
            .collect();

        Ok(DumpInspection {
            target: TargetDescriptor::new(architecture, dump_path).with_platform(platform),
            runtimes,
        })
    }
}

/// Framework directory under `%WINDIR%` that ships a given runtime build.
fn installed_runtime_dir(windir: &Path, version: RuntimeVersion, architecture: Architecture) -> Option<PathBuf>
{
    let framework = match architecture.pointer_width()? {
        64 => "Framework64",
        _ => "Framework",
    };
    let release = match runtime_library_name(version) {
        "clr" => "v4.0.30319",
        _ => "v2.0.50727",
    };
    Some(windir.join("Microsoft.NET").join(framework).join(release))
}
