//! Browser backend abstraction.
//!
//! The engine drives browsers through the [`Browser`] trait:
//! - `WebDriverBrowser` for real sessions over the WebDriver protocol
//! - `MockBrowser` for tests with a programmable page model
//!
//! All calls are synchronous and blocking; exactly one session is active per
//! run, so the trait needs no internal locking.

use image::RgbImage;
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex};

use super::types::{SessionError, SessionResult};
use crate::locator::ResolvedLocator;

/// Trait for browser backends
pub trait Browser: Send {
    /// Load a URL
    fn navigate(&mut self, url: &str) -> SessionResult<()>;

    /// Find exactly one element matching the locator and click it
    fn click(&mut self, locator: &ResolvedLocator) -> SessionResult<()>;

    /// Find the first element matching the locator and send text to it
    fn input_text(&mut self, locator: &ResolvedLocator, text: &str) -> SessionResult<()>;

    /// Run code in the browser's script context
    fn execute_script(&mut self, code: &str) -> SessionResult<()>;

    /// Capture a PNG screenshot of the current viewport
    fn screenshot_png(&mut self) -> SessionResult<Vec<u8>>;

    /// Maximize the browser window
    fn maximize_window(&mut self) -> SessionResult<()>;

    /// Tear down the underlying driver handle. Best-effort; called once.
    fn quit(&mut self) -> SessionResult<()>;

    /// Backend identifier for logs (e.g. "webdriver", "mock")
    fn backend_name(&self) -> &str;
}

/// Shared observable state of a [`MockBrowser`]
#[derive(Debug, Default)]
pub struct MockState {
    /// Element locators the fake page knows, with match counts
    pub elements: HashMap<String, usize>,
    /// URLs navigated to, in order
    pub visited: Vec<String>,
    /// Locators clicked, in order
    pub clicked: Vec<String>,
    /// (locator, text) pairs sent, in order
    pub typed: Vec<(String, String)>,
    /// Scripts executed in the page context, in order
    pub scripts: Vec<String>,
    /// Number of maximize calls
    pub maximized: usize,
    /// Number of quit calls
    pub quits: usize,
    /// Actions forced to fail, by action name
    pub failing: Vec<String>,
    /// PNG bytes returned by screenshots
    pub screenshot: Vec<u8>,
}

/// A programmable fake browser for tests.
///
/// Clones share state, so a test can keep one handle for assertions while the
/// session owns another.
#[derive(Debug, Clone)]
pub struct MockBrowser {
    state: Arc<Mutex<MockState>>,
}

impl MockBrowser {
    pub fn new() -> Self {
        let mut state = MockState::default();
        state.screenshot = encode_png(&solid_image(64, 48, [40, 40, 40]));
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Register an element the fake page can find, matching once
    pub fn with_element(self, locator: &ResolvedLocator) -> Self {
        self.add_element(locator, 1);
        self
    }

    /// Register an element with an explicit match count
    pub fn add_element(&self, locator: &ResolvedLocator, count: usize) {
        self.lock().elements.insert(locator.to_string(), count);
    }

    /// Force every call of the named action to fail with a driver error
    pub fn fail_action(&self, action: &str) {
        self.lock().failing.push(action.to_string());
    }

    /// Replace the image returned by screenshots
    pub fn set_screenshot(&self, img: &RgbImage) {
        self.lock().screenshot = encode_png(img);
    }

    /// Handle for assertions on the shared state
    pub fn state(&self) -> Arc<Mutex<MockState>> {
        Arc::clone(&self.state)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_failing(&self, action: &str) -> SessionResult<()> {
        if self.lock().failing.iter().any(|a| a == action) {
            return Err(SessionError::Driver(format!("forced failure: {}", action)));
        }
        Ok(())
    }

    fn find_one(&self, locator: &ResolvedLocator) -> SessionResult<String> {
        let key = locator.to_string();
        let count = self.lock().elements.get(&key).copied().unwrap_or(0);
        match count {
            0 => Err(SessionError::ElementNotFound(key)),
            1 => Ok(key),
            n => Err(SessionError::AmbiguousMatch(key, n)),
        }
    }

    fn find_first(&self, locator: &ResolvedLocator) -> SessionResult<String> {
        let key = locator.to_string();
        match self.lock().elements.get(&key).copied().unwrap_or(0) {
            0 => Err(SessionError::ElementNotFound(key)),
            _ => Ok(key),
        }
    }
}

impl Default for MockBrowser {
    fn default() -> Self {
        Self::new()
    }
}

impl Browser for MockBrowser {
    fn navigate(&mut self, url: &str) -> SessionResult<()> {
        self.check_failing("navigate")?;
        self.lock().visited.push(url.to_string());
        Ok(())
    }

    fn click(&mut self, locator: &ResolvedLocator) -> SessionResult<()> {
        self.check_failing("click")?;
        let key = self.find_one(locator)?;
        self.lock().clicked.push(key);
        Ok(())
    }

    fn input_text(&mut self, locator: &ResolvedLocator, text: &str) -> SessionResult<()> {
        self.check_failing("input_text")?;
        let key = self.find_first(locator)?;
        self.lock().typed.push((key, text.to_string()));
        Ok(())
    }

    fn execute_script(&mut self, code: &str) -> SessionResult<()> {
        self.check_failing("execute_script")?;
        self.lock().scripts.push(code.to_string());
        Ok(())
    }

    fn screenshot_png(&mut self) -> SessionResult<Vec<u8>> {
        self.check_failing("screenshot")?;
        Ok(self.lock().screenshot.clone())
    }

    fn maximize_window(&mut self) -> SessionResult<()> {
        self.check_failing("maximize")?;
        self.lock().maximized += 1;
        Ok(())
    }

    fn quit(&mut self) -> SessionResult<()> {
        self.lock().quits += 1;
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "mock"
    }
}

/// Build a solid-color RGB image (test fixture helper)
pub fn solid_image(width: u32, height: u32, color: [u8; 3]) -> RgbImage {
    RgbImage::from_pixel(width, height, image::Rgb(color))
}

fn encode_png(img: &RgbImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    // Encoding a valid in-memory RGB image into a Vec cannot fail
    img.write_to(&mut Cursor::new(&mut bytes), image::ImageOutputFormat::Png)
        .expect("PNG encoding of an in-memory image");
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::LocatorStrategy;

    #[test]
    fn test_mock_finds_registered_element() {
        let locator = LocatorStrategy::Id.predicate("submit");
        let mut browser = MockBrowser::new().with_element(&locator);
        assert!(browser.click(&locator).is_ok());
        assert_eq!(browser.state().lock().unwrap().clicked, vec!["id:submit"]);
    }

    #[test]
    fn test_mock_element_not_found() {
        let locator = LocatorStrategy::Id.predicate("missing");
        let mut browser = MockBrowser::new();
        match browser.click(&locator) {
            Err(SessionError::ElementNotFound(key)) => assert_eq!(key, "id:missing"),
            other => panic!("expected ElementNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_mock_ambiguous_match() {
        let locator = LocatorStrategy::ClassName.predicate("row");
        let browser = MockBrowser::new();
        browser.add_element(&locator, 3);
        let mut session_side = browser.clone();
        match session_side.click(&locator) {
            Err(SessionError::AmbiguousMatch(_, 3)) => {}
            other => panic!("expected AmbiguousMatch, got {:?}", other),
        }
    }

    #[test]
    fn test_mock_input_text_takes_first_of_many() {
        let locator = LocatorStrategy::ClassName.predicate("field");
        let browser = MockBrowser::new();
        browser.add_element(&locator, 3);
        let mut session_side = browser.clone();
        assert!(session_side.input_text(&locator, "alice").is_ok());
        assert_eq!(
            browser.state().lock().unwrap().typed,
            vec![("css:.field".to_string(), "alice".to_string())]
        );
    }

    #[test]
    fn test_mock_screenshot_is_png() {
        let mut browser = MockBrowser::new();
        let bytes = browser.screenshot_png().unwrap();
        let img = image::load_from_memory(&bytes).unwrap();
        assert_eq!(img.to_rgb8().dimensions(), (64, 48));
    }

    #[test]
    fn test_mock_forced_failure() {
        let mut browser = MockBrowser::new();
        browser.fail_action("navigate");
        assert!(matches!(
            browser.navigate("https://example.com"),
            Err(SessionError::Driver(_))
        ));
    }
}
