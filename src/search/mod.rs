//! Image search module
//!
//! Two interchangeable strategies behind one orchestrator: a headless-browser
//! scraper and an HTTP pattern-extraction fallback, both producing the same
//! hit shape.

pub mod browser;
mod fallback;
mod hit;
mod orchestrator;

pub use browser::{BrowserSearcher, ChromiumSession, SearchSession, SessionFactory};
pub use fallback::HttpImageSearch;
pub use hit::{ImageHit, Status};
pub use orchestrator::{ImageSearch, Strategy};
