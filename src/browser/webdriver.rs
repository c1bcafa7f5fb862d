//! WebDriver-backed browser backend.
//!
//! Spawns the vendor driver executable (chromedriver/msedgedriver) on a local
//! port, connects a fantoccini client to it, and exposes the engine's
//! synchronous [`Browser`] interface by driving the async client through a
//! dedicated runtime. The driver process is owned for the session lifetime
//! and killed on teardown.

use fantoccini::{Client, ClientBuilder, Locator};
use log::{debug, info, warn};
use serde_json::json;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::time::Duration;
use tokio::runtime::Runtime;

use super::backend::Browser;
use super::types::{SessionError, SessionResult};
use crate::capability::BrowserFamily;
use crate::locator::ResolvedLocator;

/// How many times to poll the driver endpoint before giving up
const CONNECT_ATTEMPTS: u32 = 20;

/// Delay between connection attempts
const CONNECT_RETRY_DELAY: Duration = Duration::from_millis(250);

/// A live browser session over the WebDriver protocol
pub struct WebDriverBrowser {
    runtime: Runtime,
    client: Option<Client>,
    driver: Child,
}

impl WebDriverBrowser {
    /// Spawn the driver executable and open one browser session on it.
    ///
    /// `launch_args` are the family-specific arguments already mapped from
    /// capability flags.
    pub fn launch(
        family: BrowserFamily,
        driver_path: &Path,
        launch_args: &[String],
        port: u16,
    ) -> SessionResult<Self> {
        let mut driver = Command::new(driver_path)
            .arg(format!("--port={}", port))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                SessionError::Launch(format!(
                    "failed to start driver {}: {}",
                    driver_path.display(),
                    e
                ))
            })?;

        let runtime = Runtime::new()
            .map_err(|e| SessionError::Launch(format!("failed to build runtime: {}", e)))?;

        let endpoint = format!("http://localhost:{}", port);
        let capabilities = build_capabilities(family, launch_args);
        debug!("Connecting to {} with args {:?}", endpoint, launch_args);

        let connected = runtime.block_on(connect_with_retry(&endpoint, &capabilities));
        let client = match connected {
            Ok(client) => client,
            Err(err) => {
                let _ = driver.kill();
                let _ = driver.wait();
                return Err(err);
            }
        };

        info!("WebDriver session established on {}", endpoint);
        Ok(Self {
            runtime,
            client: Some(client),
            driver,
        })
    }

    fn client(&self) -> SessionResult<&Client> {
        self.client
            .as_ref()
            .ok_or_else(|| SessionError::Driver("session handle already gone".to_string()))
    }

    /// Find exactly one element; zero or many matches are errors
    fn find_exactly_one(
        &self,
        locator: &ResolvedLocator,
    ) -> SessionResult<fantoccini::elements::Element> {
        let client = self.client()?;
        let mut elements = self
            .runtime
            .block_on(client.find_all(as_fantoccini(locator)))
            .map_err(|e| SessionError::Driver(e.to_string()))?;
        match elements.len() {
            0 => Err(SessionError::ElementNotFound(locator.to_string())),
            1 => Ok(elements.remove(0)),
            n => Err(SessionError::AmbiguousMatch(locator.to_string(), n)),
        }
    }

    /// Find the first element matching the locator
    fn find_first(&self, locator: &ResolvedLocator) -> SessionResult<fantoccini::elements::Element> {
        let client = self.client()?;
        let mut elements = self
            .runtime
            .block_on(client.find_all(as_fantoccini(locator)))
            .map_err(|e| SessionError::Driver(e.to_string()))?;
        if elements.is_empty() {
            return Err(SessionError::ElementNotFound(locator.to_string()));
        }
        Ok(elements.remove(0))
    }
}

impl Browser for WebDriverBrowser {
    fn navigate(&mut self, url: &str) -> SessionResult<()> {
        let client = self.client()?;
        self.runtime
            .block_on(client.goto(url))
            .map_err(|e| SessionError::Driver(e.to_string()))
    }

    fn click(&mut self, locator: &ResolvedLocator) -> SessionResult<()> {
        let element = self.find_exactly_one(locator)?;
        self.runtime
            .block_on(element.click())
            .map_err(|e| SessionError::Driver(e.to_string()))
    }

    fn input_text(&mut self, locator: &ResolvedLocator, text: &str) -> SessionResult<()> {
        let element = self.find_first(locator)?;
        self.runtime
            .block_on(element.send_keys(text))
            .map_err(|e| SessionError::Driver(e.to_string()))
    }

    fn execute_script(&mut self, code: &str) -> SessionResult<()> {
        let client = self.client()?;
        self.runtime
            .block_on(client.execute(code, vec![]))
            .map(|_| ())
            .map_err(|e| SessionError::Driver(e.to_string()))
    }

    fn screenshot_png(&mut self) -> SessionResult<Vec<u8>> {
        let client = self.client()?;
        self.runtime
            .block_on(client.screenshot())
            .map_err(|e| SessionError::Driver(e.to_string()))
    }

    fn maximize_window(&mut self) -> SessionResult<()> {
        let client = self.client()?;
        self.runtime
            .block_on(client.maximize_window())
            .map_err(|e| SessionError::Driver(e.to_string()))
    }

    fn quit(&mut self) -> SessionResult<()> {
        if let Some(client) = self.client.take() {
            if let Err(e) = self.runtime.block_on(client.close()) {
                warn!("Error closing WebDriver session: {}", e);
            }
        }
        if let Err(e) = self.driver.kill() {
            debug!("Driver process already gone: {}", e);
        }
        let _ = self.driver.wait();
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "webdriver"
    }
}

impl Drop for WebDriverBrowser {
    fn drop(&mut self) {
        // Teardown backstop; quit() is idempotent once the client is taken
        let _ = self.quit();
    }
}

/// Build the W3C capabilities object with the family's vendor options
fn build_capabilities(
    family: BrowserFamily,
    launch_args: &[String],
) -> serde_json::Map<String, serde_json::Value> {
    let mut capabilities = serde_json::Map::new();
    capabilities.insert("browserName".to_string(), json!(family.browser_name()));
    capabilities.insert(
        family.options_key().to_string(),
        json!({ "args": launch_args }),
    );
    capabilities
}

/// Poll the freshly spawned driver until it accepts a session
async fn connect_with_retry(
    endpoint: &str,
    capabilities: &serde_json::Map<String, serde_json::Value>,
) -> SessionResult<Client> {
    let mut last_error = String::new();
    for attempt in 0..CONNECT_ATTEMPTS {
        match ClientBuilder::native()
            .capabilities(capabilities.clone())
            .connect(endpoint)
            .await
        {
            Ok(client) => return Ok(client),
            Err(e) => {
                last_error = e.to_string();
                debug!("Connect attempt {} failed: {}", attempt + 1, last_error);
                tokio::time::sleep(CONNECT_RETRY_DELAY).await;
            }
        }
    }
    Err(SessionError::Launch(format!(
        "could not reach WebDriver at {} after {} attempts: {}",
        endpoint, CONNECT_ATTEMPTS, last_error
    )))
}

/// Translate a resolved locator into the wire form
fn as_fantoccini(locator: &ResolvedLocator) -> Locator<'_> {
    match locator {
        ResolvedLocator::Css(v) => Locator::Css(v),
        ResolvedLocator::Id(v) => Locator::Id(v),
        ResolvedLocator::XPath(v) => Locator::XPath(v),
        ResolvedLocator::LinkText(v) => Locator::LinkText(v),
    }
}
