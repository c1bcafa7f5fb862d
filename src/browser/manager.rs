//! Browser session lifecycle.
//!
//! The manager owns opening and closing the one live session of a run:
//! validate the driver executable, map capability flags to launch arguments,
//! start the backend, and tear it down best-effort when the run ends.

use log::{info, warn};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use super::backend::Browser;
use super::types::{SessionError, SessionResult};
use super::webdriver::WebDriverBrowser;
use crate::capability::{BrowserFamily, CapabilityFlag};
use crate::locator::ResolvedLocator;

/// Opens and closes browser sessions
#[derive(Debug, Clone)]
pub struct SessionManager {
    /// Local port the spawned driver listens on
    pub driver_port: u16,
}

impl SessionManager {
    pub fn new(driver_port: u16) -> Self {
        Self { driver_port }
    }

    /// Open a browser session.
    ///
    /// Fails with [`SessionError::UnsupportedBrowser`] for an unknown family
    /// name and [`SessionError::Configuration`] when `driver_path` is not an
    /// existing file. Both abort the run before any step executes. Flags the
    /// family does not know are dropped without error.
    pub fn open(
        &self,
        family_name: &str,
        driver_path: &Path,
        flags: &BTreeSet<CapabilityFlag>,
    ) -> SessionResult<BrowserSession> {
        let family: BrowserFamily = family_name
            .parse()
            .map_err(|_| SessionError::UnsupportedBrowser(family_name.to_string()))?;

        if !driver_path.is_file() {
            return Err(SessionError::Configuration(format!(
                "Invalid {} driver location: {}",
                family,
                driver_path.display()
            )));
        }

        let launch_args = family.launch_arguments(flags);
        info!(
            "Starting {} browser with WebDriver at: {}",
            family,
            driver_path.display()
        );
        let backend = WebDriverBrowser::launch(family, driver_path, &launch_args, self.driver_port)?;
        Ok(BrowserSession::new(Box::new(backend)))
    }

    /// Close a session. Best-effort: errors are logged, never escalated.
    pub fn close(&self, session: &mut BrowserSession) {
        session.close();
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_DRIVER_PORT)
    }
}

/// One live handle to a controlled browser.
///
/// Exclusively owned by the runner for the duration of a run. Closing is
/// idempotent and also happens on `Drop` as a guaranteed-cleanup backstop.
pub struct BrowserSession {
    backend: Option<Box<dyn Browser>>,
}

impl BrowserSession {
    /// Wrap an already-constructed backend (tests use this with `MockBrowser`)
    pub fn new(backend: Box<dyn Browser>) -> Self {
        Self {
            backend: Some(backend),
        }
    }

    fn backend(&mut self) -> SessionResult<&mut Box<dyn Browser>> {
        self.backend
            .as_mut()
            .ok_or_else(|| SessionError::Driver("session is closed".to_string()))
    }

    pub fn navigate(&mut self, url: &str) -> SessionResult<()> {
        self.backend()?.navigate(url)
    }

    pub fn click(&mut self, locator: &ResolvedLocator) -> SessionResult<()> {
        self.backend()?.click(locator)
    }

    pub fn input_text(&mut self, locator: &ResolvedLocator, text: &str) -> SessionResult<()> {
        self.backend()?.input_text(locator, text)
    }

    pub fn execute_script(&mut self, code: &str) -> SessionResult<()> {
        self.backend()?.execute_script(code)
    }

    pub fn screenshot_png(&mut self) -> SessionResult<Vec<u8>> {
        self.backend()?.screenshot_png()
    }

    pub fn maximize_window(&mut self) -> SessionResult<()> {
        self.backend()?.maximize_window()
    }

    /// Tear down the underlying handle. Swallows backend errors; calling on
    /// an already-closed session is a no-op.
    pub fn close(&mut self) {
        if let Some(mut backend) = self.backend.take() {
            if let Err(e) = backend.quit() {
                warn!("Error during session teardown: {}", e);
            }
        }
    }

    pub fn is_open(&self) -> bool {
        self.backend.is_some()
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.close();
    }
}

// Manual impl: the boxed backend is not Debug
impl fmt::Debug for BrowserSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrowserSession")
            .field("is_open", &self.is_open())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::backend::MockBrowser;

    #[test]
    fn test_open_rejects_unsupported_browser() {
        let manager = SessionManager::default();
        let err = manager
            .open("netscape", Path::new("/bin/true"), &BTreeSet::new())
            .unwrap_err();
        assert!(matches!(err, SessionError::UnsupportedBrowser(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_open_rejects_missing_driver() {
        let manager = SessionManager::default();
        let err = manager
            .open(
                "chrome",
                Path::new("/definitely/not/a/driver"),
                &BTreeSet::new(),
            )
            .unwrap_err();
        assert!(matches!(err, SessionError::Configuration(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_close_is_idempotent() {
        let mock = MockBrowser::new();
        let state = mock.state();
        let mut session = BrowserSession::new(Box::new(mock));

        session.close();
        session.close();
        assert!(!session.is_open());
        assert_eq!(state.lock().unwrap().quits, 1);
    }

    #[test]
    fn test_drop_closes_session() {
        let mock = MockBrowser::new();
        let state = mock.state();
        {
            let _session = BrowserSession::new(Box::new(mock));
        }
        assert_eq!(state.lock().unwrap().quits, 1);
    }

    #[test]
    fn test_debug_reflects_open_state() {
        let mut session = BrowserSession::new(Box::new(MockBrowser::new()));
        assert_eq!(format!("{:?}", session), "BrowserSession { is_open: true }");
        session.close();
        assert_eq!(format!("{:?}", session), "BrowserSession { is_open: false }");
    }

    #[test]
    fn test_calls_after_close_fail() {
        let mut session = BrowserSession::new(Box::new(MockBrowser::new()));
        session.close();
        assert!(matches!(
            session.navigate("https://example.com"),
            Err(SessionError::Driver(_))
        ));
    }
}
