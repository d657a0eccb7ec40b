//! Tests for artifact resolution
//!
//! A recording symbol provider stands in for the symbol subsystem so the
//! session bookkeeping and lookup order can be checked without a network.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use sosloader_core::error::{SosError, SosResult};
use sosloader_core::resolver::{ArtifactResolver, ResolverOptions};
use sosloader_core::symbols::{SymbolPath, SymbolProvider, SymbolSession, SymbolStoreProvider};
use sosloader_core::types::{
    Architecture, ArtifactDescriptor, ArtifactKind, ArtifactStatus, RuntimeInstance, RuntimeVersion, TargetDescriptor,
};
use tempfile::TempDir;

const SOS_V4_AMD64: &str = "sos_amd64_Amd64_4.0.30319.00.dll";

#[derive(Debug, Default)]
struct Recording
{
    opens: usize,
    closes: usize,
    lookups: Vec<String>,
}

/// Provider whose sessions answer from a name → path table and record every call.
#[derive(Clone, Default)]
struct RecordingProvider
{
    files: HashMap<String, PathBuf>,
    fail_open: bool,
    log: Rc<RefCell<Recording>>,
}

impl RecordingProvider
{
    fn with_file(mut self, name: &str, path: PathBuf) -> Self
    {
        self.files.insert(name.to_string(), path);
        self
    }

    fn opens(&self) -> usize
    {
        self.log.borrow().opens
    }

    fn closes(&self) -> usize
    {
        self.log.borrow().closes
    }

    fn lookups(&self) -> Vec<String>
    {
        self.log.borrow().lookups.clone()
    }
}

struct RecordingSession
{
    files: HashMap<String, PathBuf>,
    log: Rc<RefCell<Recording>>,
}

impl SymbolProvider for RecordingProvider
{
    type Session = RecordingSession;

    fn open_session(&mut self) -> SosResult<Self::Session>
    {
        if self.fail_open {
            return Err(SosError::environment(
                "Initializing symbol support",
                io::Error::new(io::ErrorKind::NotFound, "dbghelp.dll not found"),
            ));
        }
        self.log.borrow_mut().opens += 1;
        Ok(RecordingSession {
            files: self.files.clone(),
            log: Rc::clone(&self.log),
        })
    }
}

impl SymbolSession for RecordingSession
{
    fn find_file(&mut self, artifact: &ArtifactDescriptor) -> Option<PathBuf>
    {
        self.log.borrow_mut().lookups.push(artifact.file_name.clone());
        self.files.get(&artifact.file_name).cloned()
    }

    fn close(&mut self) -> SosResult<()>
    {
        self.log.borrow_mut().closes += 1;
        Ok(())
    }
}

/// A symbol repository directory holding files with distinct contents.
fn repository(names: &[&str]) -> (TempDir, RecordingProvider)
{
    let dir = tempfile::tempdir().unwrap();
    let provider = names.iter().fold(RecordingProvider::default(), |provider, name| {
        let path = dir.path().join(name);
        fs::write(&path, format!("contents of {name}")).unwrap();
        provider.with_file(name, path)
    });
    (dir, provider)
}

fn v4_instance() -> RuntimeInstance
{
    RuntimeInstance::new(
        RuntimeVersion::new(4, 0, 30319, 0),
        ArtifactDescriptor::new("mscordacwks.dll", 0x12345678, 2_048_000),
    )
}

fn amd64_target() -> TargetDescriptor
{
    TargetDescriptor::new(Architecture::Amd64, "crash.dmp")
}

fn options(host: Architecture, cache_root: &Path) -> ResolverOptions
{
    ResolverOptions {
        host,
        cache_root: cache_root.to_path_buf(),
    }
}

#[test]
fn test_end_to_end_into_default_destination()
{
    let (_repo, provider) = repository(&["clr.dll", SOS_V4_AMD64, "mscordacwks.dll"]);
    let cache = tempfile::tempdir().unwrap();

    let mut resolver = ArtifactResolver::new(provider.clone(), options(Architecture::Amd64, cache.path()));
    let result = resolver.resolve(&v4_instance(), &amd64_target(), None).unwrap();

    let expected_destination = cache.path().join("4.0.30319.0");
    assert_eq!(result.destination, expected_destination);
    assert_eq!(result.runtime_name, "clr");
    assert_eq!(provider.lookups(), vec!["clr.dll", SOS_V4_AMD64, "mscordacwks.dll"]);
    for kind in ArtifactKind::ALL {
        assert_eq!(result.status(kind), ArtifactStatus::Retrieved);
    }

    assert_eq!(
        fs::read_to_string(expected_destination.join("clr.dll")).unwrap(),
        "contents of clr.dll"
    );
    assert_eq!(
        fs::read_to_string(expected_destination.join("SOS.dll")).unwrap(),
        format!("contents of {SOS_V4_AMD64}")
    );
    assert_eq!(
        fs::read_to_string(expected_destination.join("mscordacwks.dll")).unwrap(),
        "contents of mscordacwks.dll"
    );

    assert_eq!(provider.opens(), 1);
    assert_eq!(provider.closes(), 1);
}

#[test]
fn test_explicit_destination_is_created()
{
    let (_repo, provider) = repository(&["clr.dll", SOS_V4_AMD64, "mscordacwks.dll"]);
    let cache = tempfile::tempdir().unwrap();
    let output = cache.path().join("nested").join("output");

    let mut resolver = ArtifactResolver::new(provider, options(Architecture::Amd64, cache.path()));
    let result = resolver.resolve(&v4_instance(), &amd64_target(), Some(&output)).unwrap();

    assert_eq!(result.destination, output);
    assert!(output.join("SOS.dll").is_file());
    assert!(!cache.path().join("4.0.30319.0").exists());
}

#[test]
fn test_v2_runtime_uses_mscorwks()
{
    let sos = "sos_amd64_Amd64_2.0.50727.8009.dll";
    let (_repo, provider) = repository(&["mscorwks.dll", sos]);
    let cache = tempfile::tempdir().unwrap();
    let instance = RuntimeInstance::new(
        RuntimeVersion::new(2, 0, 50727, 8009),
        ArtifactDescriptor::new("mscordacwks_amd64_amd64_2.0.50727.8009.dll", 0x4ff2_3e2c, 0x0098_0000),
    );

    let mut resolver = ArtifactResolver::new(provider.clone(), options(Architecture::Amd64, cache.path()));
    let result = resolver.resolve(&instance, &amd64_target(), None).unwrap();

    assert_eq!(result.runtime_name, "mscorwks");
    assert_eq!(
        provider.lookups(),
        vec!["mscorwks.dll", sos, "mscordacwks_amd64_amd64_2.0.50727.8009.dll"]
    );
    assert!(result.destination.join("mscorwks.dll").is_file());
    assert_eq!(result.status(ArtifactKind::DataAccess), ArtifactStatus::NotFound);
}

#[test]
fn test_local_match_skips_the_symbol_subsystem()
{
    let provider = RecordingProvider::default();
    let cache = tempfile::tempdir().unwrap();
    let framework = tempfile::tempdir().unwrap();
    let local_dac = framework.path().join("mscordacwks.dll");
    fs::write(&local_dac, b"dac").unwrap();

    let instance = v4_instance().with_local_match(&local_dac);
    let mut resolver = ArtifactResolver::new(provider.clone(), options(Architecture::Amd64, cache.path()));
    let result = resolver.resolve(&instance, &amd64_target(), None).unwrap();

    assert!(result.is_local_match());
    assert_eq!(result.destination, framework.path());
    assert_eq!(provider.opens(), 0);
    assert!(provider.lookups().is_empty());
    assert!(!cache.path().join("4.0.30319.0").exists());
}

#[test]
fn test_architecture_mismatch_opens_no_session()
{
    let (_repo, provider) = repository(&["clr.dll"]);
    let cache = tempfile::tempdir().unwrap();

    let mut resolver = ArtifactResolver::new(provider.clone(), options(Architecture::X86, cache.path()));
    let result = resolver.resolve(&v4_instance(), &amd64_target(), None);

    match result {
        Err(SosError::ArchitectureMismatch { host, target }) => {
            assert_eq!(host, Architecture::X86);
            assert_eq!(target, Architecture::Amd64);
        }
        other => panic!("Expected ArchitectureMismatch, got {other:?}"),
    }
    assert_eq!(provider.opens(), 0);
    assert!(!cache.path().join("4.0.30319.0").exists());
}

#[test]
fn test_unknown_target_architecture_is_rejected()
{
    let (_repo, provider) = repository(&["clr.dll"]);
    let cache = tempfile::tempdir().unwrap();

    let mut resolver = ArtifactResolver::new(provider.clone(), options(Architecture::Amd64, cache.path()));
    let target = TargetDescriptor::new(Architecture::Unknown("unsupported"), "crash.dmp");

    match resolver.resolve(&v4_instance(), &target, None) {
        Err(SosError::ArchitectureMismatch { host, target }) => {
            assert_eq!(host, Architecture::Amd64);
            assert_eq!(target, Architecture::Unknown("unsupported"));
        }
        other => panic!("Expected ArchitectureMismatch, got {other:?}"),
    }
    assert_eq!(provider.opens(), 0);
}

#[test]
fn test_architecture_gate_precedes_local_match()
{
    let provider = RecordingProvider::default();
    let cache = tempfile::tempdir().unwrap();
    let instance = v4_instance().with_local_match(cache.path().join("mscordacwks.dll"));

    let mut resolver = ArtifactResolver::new(provider, options(Architecture::Amd64, cache.path()));
    let target = TargetDescriptor::new(Architecture::X86, "crash.dmp");
    assert!(matches!(
        resolver.resolve(&instance, &target, None),
        Err(SosError::ArchitectureMismatch { .. })
    ));
}

#[test]
fn test_partial_failure_reports_each_artifact()
{
    let (_repo, provider) = repository(&["clr.dll", "mscordacwks.dll"]);
    let cache = tempfile::tempdir().unwrap();

    let mut resolver = ArtifactResolver::new(provider.clone(), options(Architecture::Amd64, cache.path()));
    let result = resolver.resolve(&v4_instance(), &amd64_target(), None).unwrap();

    assert_eq!(result.status(ArtifactKind::RuntimeLibrary), ArtifactStatus::Retrieved);
    assert_eq!(result.status(ArtifactKind::SymbolProvider), ArtifactStatus::NotFound);
    assert_eq!(result.status(ArtifactKind::DataAccess), ArtifactStatus::Retrieved);
    assert_eq!(result.retrieved_count(), 2);
    assert!(!result.destination.join("SOS.dll").exists());

    // The miss does not stop the DAC lookup
    assert_eq!(provider.lookups().len(), 3);
    assert_eq!((provider.opens(), provider.closes()), (1, 1));
}

#[test]
fn test_total_failure_still_closes_session()
{
    let provider = RecordingProvider::default();
    let cache = tempfile::tempdir().unwrap();

    let mut resolver = ArtifactResolver::new(provider.clone(), options(Architecture::Amd64, cache.path()));
    let result = resolver.resolve(&v4_instance(), &amd64_target(), None).unwrap();

    for kind in ArtifactKind::ALL {
        assert_eq!(result.status(kind), ArtifactStatus::NotFound);
    }
    assert_eq!((provider.opens(), provider.closes()), (1, 1));
}

#[test]
fn test_copy_failure_is_environment_error_and_closes_session()
{
    let cache = tempfile::tempdir().unwrap();
    let provider = RecordingProvider::default().with_file("clr.dll", cache.path().join("vanished").join("clr.dll"));

    let mut resolver = ArtifactResolver::new(provider.clone(), options(Architecture::Amd64, cache.path()));
    let result = resolver.resolve(&v4_instance(), &amd64_target(), None);

    assert!(matches!(result, Err(SosError::Environment { .. })));
    assert_eq!(provider.lookups(), vec!["clr.dll"]);
    assert_eq!((provider.opens(), provider.closes()), (1, 1));
}

#[test]
fn test_unwritable_destination_closes_session()
{
    let (_repo, provider) = repository(&["clr.dll"]);
    let cache = tempfile::tempdir().unwrap();
    let blocker = cache.path().join("not-a-directory");
    fs::write(&blocker, b"file").unwrap();

    let mut resolver = ArtifactResolver::new(provider.clone(), options(Architecture::Amd64, cache.path()));
    let result = resolver.resolve(&v4_instance(), &amd64_target(), Some(&blocker.join("out")));

    assert!(matches!(result, Err(SosError::Environment { .. })));
    assert!(provider.lookups().is_empty());
    assert_eq!((provider.opens(), provider.closes()), (1, 1));
}

#[test]
fn test_session_init_failure()
{
    let provider = RecordingProvider {
        fail_open: true,
        ..RecordingProvider::default()
    };
    let cache = tempfile::tempdir().unwrap();

    let mut resolver = ArtifactResolver::new(provider.clone(), options(Architecture::Amd64, cache.path()));
    let result = resolver.resolve(&v4_instance(), &amd64_target(), None);

    assert!(matches!(result, Err(SosError::Environment { .. })));
    assert_eq!((provider.opens(), provider.closes()), (0, 0));
}

#[test]
fn test_resolving_twice_is_idempotent()
{
    let (_repo, provider) = repository(&["clr.dll", SOS_V4_AMD64, "mscordacwks.dll"]);
    let cache = tempfile::tempdir().unwrap();
    let mut resolver = ArtifactResolver::new(provider.clone(), options(Architecture::Amd64, cache.path()));

    let first = resolver.resolve(&v4_instance(), &amd64_target(), None).unwrap();
    let first_sos = fs::read(first.destination.join("SOS.dll")).unwrap();
    let second = resolver.resolve(&v4_instance(), &amd64_target(), None).unwrap();

    assert_eq!(first, second);
    assert_eq!(fs::read(second.destination.join("SOS.dll")).unwrap(), first_sos);
    assert_eq!(fs::read_dir(&second.destination).unwrap().count(), 3);
    assert_eq!((provider.opens(), provider.closes()), (2, 2));
}

#[test]
fn test_symbol_store_provider_end_to_end()
{
    let store = tempfile::tempdir().unwrap();
    let dac = v4_instance().dac;
    for name in ["clr.dll", SOS_V4_AMD64, "mscordacwks.dll"] {
        let path = store.path().join(dac.renamed(name).store_path());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, name).unwrap();
    }

    let cache = tempfile::tempdir().unwrap();
    let symbol_path = SymbolPath::parse(&format!("srv*{}", store.path().display()));
    let mut resolver = ArtifactResolver::new(
        SymbolStoreProvider::new(symbol_path),
        options(Architecture::Amd64, cache.path()),
    );
    let result = resolver.resolve(&v4_instance(), &amd64_target(), None).unwrap();

    assert_eq!(result.retrieved_count(), 3);
    assert_eq!(fs::read_to_string(result.destination.join("SOS.dll")).unwrap(), SOS_V4_AMD64);
}
