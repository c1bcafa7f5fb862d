//! Browser families and capability flags.
//!
//! A capability flag is a named launch toggle ("Headless Mode", "Disable GPU",
//! ...). Each browser family maps a flag to its own driver argument; flags a
//! family does not know are silently dropped for that family.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Supported browser families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BrowserFamily {
    Chrome,
    Edge,
}

impl BrowserFamily {
    /// Display name used in reports and logs
    pub fn name(&self) -> &'static str {
        match self {
            BrowserFamily::Chrome => "Chrome",
            BrowserFamily::Edge => "Edge",
        }
    }

    /// The vendor-specific capabilities key carrying launch arguments
    pub fn options_key(&self) -> &'static str {
        match self {
            BrowserFamily::Chrome => "goog:chromeOptions",
            BrowserFamily::Edge => "ms:edgeOptions",
        }
    }

    /// Browser name field of the WebDriver capabilities object
    pub fn browser_name(&self) -> &'static str {
        match self {
            BrowserFamily::Chrome => "chrome",
            BrowserFamily::Edge => "MicrosoftEdge",
        }
    }

    /// Map one flag to this family's driver argument, if the family knows it
    pub fn driver_argument(&self, flag: &CapabilityFlag) -> Option<&'static str> {
        match self {
            BrowserFamily::Chrome => chrome_argument(flag.label()),
            BrowserFamily::Edge => edge_argument(flag.label()),
        }
    }

    /// Build the launch argument list for a set of enabled flags.
    ///
    /// Flags unknown to this family are dropped without error.
    pub fn launch_arguments(&self, flags: &BTreeSet<CapabilityFlag>) -> Vec<String> {
        flags
            .iter()
            .filter_map(|flag| self.driver_argument(flag))
            .map(|arg| arg.to_string())
            .collect()
    }
}

impl fmt::Display for BrowserFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BrowserFamily {
    type Err = String;

    /// Parse a family name, case-insensitive
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "chrome" | "chromium" => Ok(BrowserFamily::Chrome),
            "edge" | "msedge" => Ok(BrowserFamily::Edge),
            other => Err(format!("Unsupported browser type: {}", other)),
        }
    }
}

/// A named browser-launch toggle
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CapabilityFlag(String);

impl CapabilityFlag {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn label(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CapabilityFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CapabilityFlag {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}

/// Chrome flag table
fn chrome_argument(label: &str) -> Option<&'static str> {
    match label {
        "Headless Mode" => Some("--headless"),
        "Disable GPU" => Some("--disable-gpu"),
        "Incognito Mode" => Some("--incognito"),
        "Disable Popup Blocking" => Some("--disable-popup-blocking"),
        "Disable Infobars" => Some("--disable-infobars"),
        "Disable Extensions" => Some("--disable-extensions"),
        "Disable Dev Shm Usage" => Some("--disable-dev-shm-usage"),
        "Ignore Certificate Errors" => Some("--ignore-certificate-errors"),
        "Custom User Agent" => Some("--user-agent"),
        "Disable JavaScript" => Some("--disable-javascript"),
        "Disable Images" => Some("--blink-settings=imagesEnabled=false"),
        "Enable Network Throttling" => Some("--enable-network-throttling"),
        "Enable Performance Logging" => Some("--enable-performance-logging"),
        "Enable GPU Hardware Acceleration" => Some("--enable-gpu-rasterization"),
        "Remote Debugging Port" => Some("--remote-debugging-port"),
        "Proxy Settings" => Some("--proxy-server"),
        "Enable Automation" => Some("--enable-automation"),
        "No Sandbox" => Some("--no-sandbox"),
        "Disable Web Security" => Some("--disable-web-security"),
        "Enable Experimental Features" => Some("--enable-experimental-web-platform-features"),
        "Disable Password Manager" => Some("--disable-password-manager-reauthentication"),
        "Disable Autofill" => Some("--disable-autofill-keyboard-accessory-view"),
        "Disable Filesystem API" => Some("--disable-filesystem"),
        "Disable Geolocation" => Some("--disable-geolocation"),
        _ => None,
    }
}

/// Edge flag table
fn edge_argument(label: &str) -> Option<&'static str> {
    match label {
        "Headless Mode" => Some("headless"),
        "Disable GPU" => Some("disable-gpu"),
        "InPrivate Mode" => Some("InPrivate"),
        "Disable Popup Blocking" => Some("disable-popup-blocking"),
        "Disable Extensions" => Some("disable-extensions"),
        "Ignore Certificate Errors" => Some("ignore-certificate-errors"),
        "Custom User Agent" => Some("user-agent"),
        "Disable JavaScript" => Some("disable-javascript"),
        "Disable Images" => Some("disable-images"),
        "Enable Network Throttling" => Some("enable-network-throttling"),
        "Enable Performance Logging" => Some("enable-performance-logging"),
        "Enable GPU Hardware Acceleration" => Some("enable-gpu-rasterization"),
        "Remote Debugging Port" => Some("remote-debugging-port"),
        "Proxy Settings" => Some("proxy-server"),
        "Enable Automation" => Some("enable-automation"),
        "No Sandbox" => Some("no-sandbox"),
        "Disable Web Security" => Some("disable-web-security"),
        "Enable Experimental Features" => Some("enable-experimental-web-platform-features"),
        "Disable Password Manager" => Some("disable-password-manager"),
        "Disable Autofill" => Some("disable-autofill"),
        "Disable Filesystem API" => Some("disable-filesystem"),
        "Disable Geolocation" => Some("disable-geolocation"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(labels: &[&str]) -> BTreeSet<CapabilityFlag> {
        labels.iter().map(|l| CapabilityFlag::new(*l)).collect()
    }

    #[test]
    fn test_family_from_str() {
        assert_eq!("chrome".parse::<BrowserFamily>(), Ok(BrowserFamily::Chrome));
        assert_eq!("Edge".parse::<BrowserFamily>(), Ok(BrowserFamily::Edge));
        assert!("safari".parse::<BrowserFamily>().is_err());
    }

    #[test]
    fn test_launch_arguments_mapping() {
        let args = BrowserFamily::Chrome
            .launch_arguments(&flags(&["Headless Mode", "Disable GPU"]));
        assert_eq!(args, vec!["--disable-gpu".to_string(), "--headless".to_string()]);
    }

    #[test]
    fn test_unknown_flags_dropped_silently() {
        let args = BrowserFamily::Chrome
            .launch_arguments(&flags(&["Headless Mode", "Warp Drive"]));
        assert_eq!(args, vec!["--headless".to_string()]);

        // InPrivate is Edge-only; Chrome drops it
        assert!(BrowserFamily::Chrome
            .launch_arguments(&flags(&["InPrivate Mode"]))
            .is_empty());
        assert_eq!(
            BrowserFamily::Edge.launch_arguments(&flags(&["InPrivate Mode"])),
            vec!["InPrivate".to_string()]
        );
    }
}
