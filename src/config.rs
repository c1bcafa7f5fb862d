//! Configuration with environment variable support.
//!
//! Centralized defaults for the CLI: browser family, per-family driver
//! locations, screenshot directory, driver port. The engine itself never
//! reads settings; runners receive already-resolved parameters.
//!
//! # Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `WEB_REPLAY_BROWSER` | Default browser family | `Chrome` |
//! | `WEB_REPLAY_CHROMEDRIVER` | Chrome driver executable | `chromedriver` |
//! | `WEB_REPLAY_EDGEDRIVER` | Edge driver executable | `msedgedriver` |
//! | `WEB_REPLAY_SCREENSHOT_DIR` | Screenshot save directory | unset (cwd) |
//! | `WEB_REPLAY_DRIVER_PORT` | Local port for the spawned driver | `9515` |

use std::env;
use std::sync::OnceLock;

/// Default browser family
pub const DEFAULT_BROWSER: &str = "Chrome";

/// Default Chrome driver executable
pub const DEFAULT_CHROMEDRIVER: &str = "chromedriver";

/// Default Edge driver executable
pub const DEFAULT_EDGEDRIVER: &str = "msedgedriver";

/// Default local driver port
pub const DEFAULT_DRIVER_PORT: u16 = 9515;

/// Environment variable for the default browser family
pub const ENV_BROWSER: &str = "WEB_REPLAY_BROWSER";

/// Environment variable for the Chrome driver location
pub const ENV_CHROMEDRIVER: &str = "WEB_REPLAY_CHROMEDRIVER";

/// Environment variable for the Edge driver location
pub const ENV_EDGEDRIVER: &str = "WEB_REPLAY_EDGEDRIVER";

/// Environment variable for the screenshot save directory
pub const ENV_SCREENSHOT_DIR: &str = "WEB_REPLAY_SCREENSHOT_DIR";

/// Environment variable for the driver port
pub const ENV_DRIVER_PORT: &str = "WEB_REPLAY_DRIVER_PORT";

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Get the global configuration (initialized from environment on first access)
pub fn get() -> &'static Config {
    CONFIG.get_or_init(Config::from_env)
}

/// Centralized settings for the CLI
#[derive(Debug, Clone)]
pub struct Config {
    /// Default browser family name
    pub browser: String,
    /// Chrome driver executable location
    pub chromedriver: String,
    /// Edge driver executable location
    pub edgedriver: String,
    /// Screenshot save directory, if configured
    pub screenshot_dir: Option<String>,
    /// Local port for the spawned driver
    pub driver_port: u16,
}

impl Config {
    /// Create configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            browser: env::var(ENV_BROWSER).unwrap_or_else(|_| DEFAULT_BROWSER.to_string()),
            chromedriver: env::var(ENV_CHROMEDRIVER)
                .unwrap_or_else(|_| DEFAULT_CHROMEDRIVER.to_string()),
            edgedriver: env::var(ENV_EDGEDRIVER)
                .unwrap_or_else(|_| DEFAULT_EDGEDRIVER.to_string()),
            screenshot_dir: env::var(ENV_SCREENSHOT_DIR).ok(),
            driver_port: env::var(ENV_DRIVER_PORT)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_DRIVER_PORT),
        }
    }

    /// Create configuration with all defaults (ignoring environment)
    pub fn defaults() -> Self {
        Self {
            browser: DEFAULT_BROWSER.to_string(),
            chromedriver: DEFAULT_CHROMEDRIVER.to_string(),
            edgedriver: DEFAULT_EDGEDRIVER.to_string(),
            screenshot_dir: None,
            driver_port: DEFAULT_DRIVER_PORT,
        }
    }

    /// The driver executable configured for a family name, if the name is known
    pub fn driver_for(&self, family: &str) -> Option<&str> {
        match family.to_lowercase().as_str() {
            "chrome" | "chromium" => Some(&self.chromedriver),
            "edge" | "msedge" => Some(&self.edgedriver),
            _ => None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::defaults();
        assert_eq!(config.browser, DEFAULT_BROWSER);
        assert_eq!(config.driver_port, DEFAULT_DRIVER_PORT);
        assert!(config.screenshot_dir.is_none());
    }

    #[test]
    fn test_driver_for_family() {
        let config = Config::defaults();
        assert_eq!(config.driver_for("Chrome"), Some(DEFAULT_CHROMEDRIVER));
        assert_eq!(config.driver_for("edge"), Some(DEFAULT_EDGEDRIVER));
        assert_eq!(config.driver_for("safari"), None);
    }
}
