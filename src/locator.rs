//! Locator strategy resolution.
//!
//! Maps the strategy names used in script files (e.g. "XPath", "CSS Selector")
//! to concrete find-by predicates the browser backend understands. Pure lookup,
//! no side effects.

use std::fmt;

/// The fixed set of supported locator strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocatorStrategy {
    XPath,
    CssSelector,
    Id,
    Name,
    ClassName,
    TagName,
    LinkText,
    PartialLinkText,
}

/// All strategies, in the order they are presented to users
pub const ALL_STRATEGIES: [LocatorStrategy; 8] = [
    LocatorStrategy::XPath,
    LocatorStrategy::CssSelector,
    LocatorStrategy::Id,
    LocatorStrategy::Name,
    LocatorStrategy::ClassName,
    LocatorStrategy::TagName,
    LocatorStrategy::LinkText,
    LocatorStrategy::PartialLinkText,
];

/// Resolve a strategy name to a [`LocatorStrategy`].
///
/// Names match the strings stored in script files. Anything outside the fixed
/// set fails with [`LocatorError::UnknownStrategy`].
pub fn resolve(name: &str) -> Result<LocatorStrategy, LocatorError> {
    match name {
        "XPath" => Ok(LocatorStrategy::XPath),
        "CSS Selector" => Ok(LocatorStrategy::CssSelector),
        "ID" => Ok(LocatorStrategy::Id),
        "Name" => Ok(LocatorStrategy::Name),
        "Class Name" => Ok(LocatorStrategy::ClassName),
        "Tag Name" => Ok(LocatorStrategy::TagName),
        "Link Text" => Ok(LocatorStrategy::LinkText),
        "Partial Link Text" => Ok(LocatorStrategy::PartialLinkText),
        other => Err(LocatorError::UnknownStrategy(other.to_string())),
    }
}

impl LocatorStrategy {
    /// The name this strategy carries in script files
    pub fn name(&self) -> &'static str {
        match self {
            LocatorStrategy::XPath => "XPath",
            LocatorStrategy::CssSelector => "CSS Selector",
            LocatorStrategy::Id => "ID",
            LocatorStrategy::Name => "Name",
            LocatorStrategy::ClassName => "Class Name",
            LocatorStrategy::TagName => "Tag Name",
            LocatorStrategy::LinkText => "Link Text",
            LocatorStrategy::PartialLinkText => "Partial Link Text",
        }
    }

    /// Build the concrete predicate for a locator value.
    ///
    /// The WebDriver protocol exposes CSS, XPath, id and link-text lookups
    /// natively; the remaining strategies compile to an equivalent CSS or
    /// XPath form. Each strategy yields a distinct predicate shape.
    pub fn predicate(&self, value: &str) -> ResolvedLocator {
        match self {
            LocatorStrategy::XPath => ResolvedLocator::XPath(value.to_string()),
            LocatorStrategy::CssSelector => ResolvedLocator::Css(value.to_string()),
            LocatorStrategy::Id => ResolvedLocator::Id(value.to_string()),
            LocatorStrategy::Name => ResolvedLocator::Css(format!("[name=\"{}\"]", value)),
            LocatorStrategy::ClassName => ResolvedLocator::Css(format!(".{}", value)),
            LocatorStrategy::TagName => ResolvedLocator::XPath(format!("//{}", value)),
            LocatorStrategy::LinkText => ResolvedLocator::LinkText(value.to_string()),
            LocatorStrategy::PartialLinkText => ResolvedLocator::XPath(format!(
                "//a[contains(normalize-space(.), '{}')]",
                value
            )),
        }
    }
}

/// A strategy applied to a value: the concrete find-by predicate passed to
/// the browser backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedLocator {
    Css(String),
    Id(String),
    XPath(String),
    LinkText(String),
}

impl fmt::Display for ResolvedLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedLocator::Css(v) => write!(f, "css:{}", v),
            ResolvedLocator::Id(v) => write!(f, "id:{}", v),
            ResolvedLocator::XPath(v) => write!(f, "xpath:{}", v),
            ResolvedLocator::LinkText(v) => write!(f, "link-text:{}", v),
        }
    }
}

/// Error type for locator resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocatorError {
    /// The strategy name is not one of the fixed supported set
    UnknownStrategy(String),
}

impl fmt::Display for LocatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocatorError::UnknownStrategy(name) => {
                write!(f, "Unknown locator strategy: {}", name)
            }
        }
    }
}

impl std::error::Error for LocatorError {}
