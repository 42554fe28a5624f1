pub mod auth;
pub mod browser_setup;
pub mod config;
pub mod error;
pub mod extract;
pub mod nav;
pub mod parse;
pub mod session;
pub mod site;
pub mod tools;

pub use browser_setup::{BrowserHandle, launch_browser};
pub use config::{ServerConfig, WaitConfig};
pub use error::{OdaError, OdaResult};
pub use session::{PageContext, Session};
pub use tools::GroceryServer;
