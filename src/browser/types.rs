// Core types for the browser session layer

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Error types for session operations.
///
/// `Configuration` and `UnsupportedBrowser` are fatal and surface to the
/// caller before any step runs. Everything else is step-local: the executor
/// converts it into a `Failed` step result and continues.
#[derive(Debug)]
pub enum SessionError {
    /// Invalid driver executable path
    Configuration(String),

    /// The requested browser family is not supported
    UnsupportedBrowser(String),

    /// The driver process could not be started or connected to
    Launch(String),

    /// The driver rejected or failed a command
    Driver(String),

    /// No element matched the locator
    ElementNotFound(String),

    /// More than one element matched a locator that requires exactly one
    AmbiguousMatch(String, usize),

    /// I/O error
    Io(std::io::Error),
}

impl SessionError {
    /// Whether this error aborts the run before any step executes
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SessionError::Configuration(_)
                | SessionError::UnsupportedBrowser(_)
                | SessionError::Launch(_)
        )
    }
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            SessionError::UnsupportedBrowser(name) => {
                write!(f, "Unsupported browser type: {}", name)
            }
            SessionError::Launch(msg) => write!(f, "Launch error: {}", msg),
            SessionError::Driver(msg) => write!(f, "Driver error: {}", msg),
            SessionError::ElementNotFound(locator) => {
                write!(f, "element not found: {}", locator)
            }
            SessionError::AmbiguousMatch(locator, count) => {
                write!(f, "locator matched {} elements, expected one: {}", count, locator)
            }
            SessionError::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SessionError {
    fn from(err: std::io::Error) -> Self {
        SessionError::Io(err)
    }
}
