//! Safe wrapper over the dbghelp symbol handler.

use std::ffi::{OsStr, OsString};
use std::io;
use std::os::windows::ffi::{OsStrExt, OsStringExt};
use std::path::PathBuf;
use std::ptr;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info};
use winapi::shared::minwindef::FALSE;
use winapi::um::dbghelp::{SymCleanup, SymFindFileInPathW, SymInitializeW, SSRVOPT_DWORD};
use winapi::um::processthreadsapi::GetCurrentProcess;
use winapi::um::winnt::{HANDLE, PVOID};

use crate::error::{SosError, SosResult};
use crate::symbols::{SymbolPath, SymbolProvider, SymbolSession};
use crate::types::ArtifactDescriptor;

/// Size in UTF-16 units of the buffer receiving a found file path (at least `MAX_PATH`)
const FOUND_FILE_CAPACITY: usize = 2048;

/// Set while a session owns the process-global symbol handler.
static SESSION_OPEN: AtomicBool = AtomicBool::new(false);

fn to_wide(value: &OsStr) -> Vec<u16>
{
    value.encode_wide().chain(std::iter::once(0)).collect()
}

/// [`SymbolProvider`] backed by `dbghelp.dll`
///
/// Uses the given symbol path; an empty path lets dbghelp fall back to
/// `_NT_SYMBOL_PATH`.
#[derive(Debug, Clone)]
pub struct DbgHelpProvider
{
    path: SymbolPath,
}

impl DbgHelpProvider
{
    #[must_use]
    pub fn new(path: SymbolPath) -> Self
    {
        Self { path }
    }
}

impl SymbolProvider for DbgHelpProvider
{
    type Session = DbgHelpSession;

    fn open_session(&mut self) -> SosResult<Self::Session>
    {
        if SESSION_OPEN.swap(true, Ordering::AcqRel) {
            return Err(SosError::environment(
                "Initializing dbghelp.dll symbol support",
                io::Error::new(io::ErrorKind::ResourceBusy, "a symbol session is already open"),
            ));
        }

        let search_path = (!self.path.is_empty()).then(|| to_wide(OsStr::new(&self.path.to_string())));
        let search_path_ptr = search_path.as_ref().map_or(ptr::null(), |wide| wide.as_ptr());

        // SAFETY: GetCurrentProcess returns a pseudo-handle that is always valid,
        // and the search path is either null or a NUL-terminated UTF-16 buffer that
        // outlives the call.
        let (process, ok) = unsafe {
            let process = GetCurrentProcess();
            (process, SymInitializeW(process, search_path_ptr, FALSE))
        };

        if ok == FALSE {
            let err = io::Error::last_os_error();
            SESSION_OPEN.store(false, Ordering::Release);
            return Err(SosError::environment("Initializing dbghelp.dll symbol support", err));
        }

        info!("Initialized dbghelp symbol support with path '{}'", self.path);
        Ok(DbgHelpSession { process, open: true })
    }
}

/// An initialized dbghelp symbol handler
pub struct DbgHelpSession
{
    process: HANDLE,
    open: bool,
}

impl SymbolSession for DbgHelpSession
{
    fn find_file(&mut self, artifact: &ArtifactDescriptor) -> Option<PathBuf>
    {
        if !self.open {
            return None;
        }

        let file_name = to_wide(OsStr::new(&artifact.file_name));
        let mut found = vec![0u16; FOUND_FILE_CAPACITY];

        debug!("SymFindFileInPathW {artifact}");
        // SAFETY: the handle was initialized by SymInitializeW and not yet cleaned up,
        // `file_name` is NUL-terminated, and `found` has the capacity dbghelp expects
        // (at least MAX_PATH). With SSRVOPT_DWORD the id is passed by value.
        let ok = unsafe {
            SymFindFileInPathW(
                self.process,
                ptr::null(),
                file_name.as_ptr(),
                artifact.time_stamp as usize as PVOID,
                artifact.file_size,
                0,
                SSRVOPT_DWORD,
                found.as_mut_ptr(),
                None,
                ptr::null_mut(),
            )
        };

        if ok == FALSE {
            debug!("Not found: {artifact} ({})", io::Error::last_os_error());
            return None;
        }

        let len = found.iter().position(|unit| *unit == 0).unwrap_or(found.len());
        Some(PathBuf::from(OsString::from_wide(&found[..len])))
    }

    fn close(&mut self) -> SosResult<()>
    {
        if !self.open {
            return Ok(());
        }
        self.open = false;
        SESSION_OPEN.store(false, Ordering::Release);

        // SAFETY: the handle was initialized by SymInitializeW in open_session.
        let ok = unsafe { SymCleanup(self.process) };
        if ok == FALSE {
            return Err(SosError::environment(
                "Cleaning up dbghelp.dll symbol support",
                io::Error::last_os_error(),
            ));
        }
        debug!("Cleaned up dbghelp symbol support");
        Ok(())
    }
}
