pub mod backend;
pub mod manager;
pub mod types;
pub mod webdriver;

pub use backend::{Browser, MockBrowser, MockState};
pub use manager::{BrowserSession, SessionManager};
pub use types::{SessionError, SessionResult};
pub use webdriver::WebDriverBrowser;
