//! RAII guard that closes a symbol session when dropped.

use std::path::PathBuf;

use tracing::warn;

use super::SymbolSession;
use crate::error::SosResult;
use crate::types::ArtifactDescriptor;

/// RAII guard that owns a symbol session and closes it when dropped.
///
/// This guard ensures that the session is released even if an error occurs
/// half-way through a resolution. Call [`SessionGuard::finish`] on the happy
/// path to observe close errors; dropping the guard closes on a best-effort
/// basis instead.
pub struct SessionGuard<S: SymbolSession>
{
    session: S,
    active: bool,
}

impl<S: SymbolSession> SessionGuard<S>
{
    pub fn new(session: S) -> Self
    {
        Self { session, active: true }
    }

    /// Look up an artifact through the guarded session.
    pub fn find_file(&mut self, artifact: &ArtifactDescriptor) -> Option<PathBuf>
    {
        self.session.find_file(artifact)
    }

    /// Manually close the session before the guard is dropped.
    ///
    /// After calling this method, dropping the guard is a no-op.
    ///
    /// ## Errors
    ///
    /// Propagates the session's close error.
    pub fn finish(mut self) -> SosResult<()>
    {
        self.active = false;
        self.session.close()
    }
}

impl<S: SymbolSession> Drop for SessionGuard<S>
{
    fn drop(&mut self)
    {
        if self.active {
            self.active = false;
            // Best effort close - errors are only logged
            if let Err(err) = self.session.close() {
                warn!("Failed to close symbol session: {err}");
            }
        }
    }
}

#[cfg(test)]
mod tests
{
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    struct CountingSession
    {
        closes: Rc<Cell<u32>>,
    }

    impl SymbolSession for CountingSession
    {
        fn find_file(&mut self, _artifact: &ArtifactDescriptor) -> Option<PathBuf>
        {
            None
        }

        fn close(&mut self) -> SosResult<()>
        {
            self.closes.set(self.closes.get() + 1);
            Ok(())
        }
    }

    #[test]
    fn test_drop_closes_once()
    {
        let closes = Rc::new(Cell::new(0));
        {
            let _guard = SessionGuard::new(CountingSession { closes: closes.clone() });
        }
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn test_finish_closes_once()
    {
        let closes = Rc::new(Cell::new(0));
        let guard = SessionGuard::new(CountingSession { closes: closes.clone() });
        guard.finish().unwrap();
        assert_eq!(closes.get(), 1);
    }
}
