//! # Artifact Resolver
//!
//! Decides whether a runtime's debug support files are already on this
//! machine and, if not, fetches them through a symbol session into a
//! destination directory.
//!
//! ## Flow
//!
//! ```text
//! Start -> ArchitectureChecked -> LocalMatchChecked -> Done(AlreadyLocal)
//!                                                  \-> SessionOpen -> lookups (CLR, SOS, DAC) -> SessionClosed -> Done
//! ```
//!
//! Nothing is retried. A lookup miss marks that artifact `NotFound` and the
//! remaining lookups still run. Only environment failures (session init,
//! directory creation, copying) abort a resolution, and the session is closed
//! on those paths too.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use sosloader_core::inspector::{select_runtime, DumpInspector, MinidumpInspector};
//! use sosloader_core::resolver::{ArtifactResolver, ResolverOptions};
//! use sosloader_core::symbols::{SymbolPath, SymbolStoreProvider};
//!
//! let inspection = MinidumpInspector::new().inspect(Path::new("crash.dmp"))?;
//! let runtime = select_runtime(&inspection.runtimes)?;
//!
//! let provider = SymbolStoreProvider::new(SymbolPath::parse("srv*C:\\symbols"));
//! let mut resolver = ArtifactResolver::new(provider, ResolverOptions::default());
//! let result = resolver.resolve(runtime, &inspection.target, None)?;
//! println!("Debug support files are in {}", result.destination.display());
//! # Ok::<(), sosloader_core::error::SosError>(())
//! ```

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{SosError, SosResult};
use crate::naming::{canonical_file_name, runtime_library_name, symbol_provider_lookup_name};
use crate::symbols::{SessionGuard, SymbolProvider};
use crate::types::{
    Architecture, ArtifactDescriptor, ArtifactKind, ArtifactStatus, ResolutionResult, RuntimeInstance, TargetDescriptor,
};

/// Resolver configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverOptions
{
    /// Architecture of the process that will load SOS (normally this one)
    pub host: Architecture,
    /// Parent of the per-version cache directories used when no destination is given
    pub cache_root: PathBuf,
}

impl Default for ResolverOptions
{
    fn default() -> Self
    {
        Self {
            host: Architecture::current(),
            cache_root: env::temp_dir(),
        }
    }
}

/// Resolves the CLR, SOS and DAC binaries for one runtime instance
///
/// Owns its [`SymbolProvider`]; each call to [`ArtifactResolver::resolve`]
/// opens at most one session and always closes it before returning.
pub struct ArtifactResolver<P: SymbolProvider>
{
    provider: P,
    options: ResolverOptions,
}

impl<P: SymbolProvider> ArtifactResolver<P>
{
    pub fn new(provider: P, options: ResolverOptions) -> Self
    {
        Self { provider, options }
    }

    pub fn options(&self) -> &ResolverOptions
    {
        &self.options
    }

    /// Give the provider back, e.g. to inspect a test double.
    pub fn into_provider(self) -> P
    {
        self.provider
    }

    /// Directory a runtime's artifacts land in when the caller does not choose one.
    ///
    /// Deterministic per version so later runs reuse the same files.
    #[must_use]
    pub fn default_destination(&self, instance: &RuntimeInstance) -> PathBuf
    {
        self.options.cache_root.join(instance.version.to_string())
    }

    /// Resolve the debug support files for `instance`.
    ///
    /// ## Parameters
    ///
    /// - `instance`: the single runtime selected from the dump
    /// - `target`: the dump's target descriptor
    /// - `destination`: where to put the files; defaults to [`ArtifactResolver::default_destination`]
    ///
    /// ## Errors
    ///
    /// - `ArchitectureMismatch`: the dump's pointer width differs from the host's
    /// - `Environment`: the symbol subsystem cannot be initialized, or the
    ///   destination cannot be created or written
    pub fn resolve(
        &mut self,
        instance: &RuntimeInstance,
        target: &TargetDescriptor,
        destination: Option<&Path>,
    ) -> SosResult<ResolutionResult>
    {
        let host = self.options.host;
        if !host.matches_pointer_width(target.architecture) {
            return Err(SosError::ArchitectureMismatch {
                host,
                target: target.architecture,
            });
        }

        let runtime_name = runtime_library_name(instance.version);

        if let Some(local) = instance.local_match() {
            info!("Debug support files for {} are available locally at {}", instance.version, local.display());
            let destination = local.parent().map_or_else(|| local.to_path_buf(), Path::to_path_buf);
            return Ok(ResolutionResult {
                destination,
                runtime_name,
                statuses: ArtifactKind::ALL
                    .iter()
                    .map(|kind| (*kind, ArtifactStatus::AlreadyLocal))
                    .collect(),
            });
        }

        let mut session = SessionGuard::new(self.provider.open_session()?);

        let destination = destination.map_or_else(|| self.default_destination(instance), Path::to_path_buf);
        fs::create_dir_all(&destination)
            .map_err(|err| SosError::environment(format!("Creating {}", destination.display()), err))?;

        info!("Resolving CLR {} debug support files into {}", instance.version, destination.display());

        let mut statuses = BTreeMap::new();
        for kind in ArtifactKind::ALL {
            let status = match self.descriptor(kind, instance, target) {
                Some(artifact) => match session.find_file(&artifact) {
                    Some(source) => {
                        let file_name = canonical_file_name(kind, instance.version);
                        copy_artifact(&source, &destination.join(file_name))?;
                        ArtifactStatus::Retrieved
                    }
                    None => {
                        warn!("Error retrieving {kind} ({artifact}) from the symbol server");
                        ArtifactStatus::NotFound
                    }
                },
                None => {
                    warn!("No {kind} lookup name for host architecture {host}");
                    ArtifactStatus::NotFound
                }
            };
            statuses.insert(kind, status);
        }

        session.finish()?;

        Ok(ResolutionResult {
            destination,
            runtime_name,
            statuses,
        })
    }

    /// Lookup key for one artifact kind.
    fn descriptor(
        &self,
        kind: ArtifactKind,
        instance: &RuntimeInstance,
        target: &TargetDescriptor,
    ) -> Option<ArtifactDescriptor>
    {
        match kind {
            ArtifactKind::RuntimeLibrary => Some(instance.dac.renamed(canonical_file_name(kind, instance.version))),
            ArtifactKind::SymbolProvider => {
                symbol_provider_lookup_name(self.options.host, target.architecture, instance.version)
                    .map(|name| instance.dac.renamed(name))
            }
            ArtifactKind::DataAccess => Some(instance.dac.clone()),
        }
    }
}

/// Copy a found artifact into place, replacing any stale copy.
fn copy_artifact(source: &Path, destination: &Path) -> SosResult<()>
{
    debug!("Copying {} to {}", source.display(), destination.display());
    fs::copy(source, destination).map_err(|err| {
        SosError::environment(
            format!("Copying {} to {}", source.display(), destination.display()),
            err,
        )
    })?;
    Ok(())
}
