//! Activity Detector
//!
//! Detects whether a user is active or idle from host interaction events,
//! window focus/blur and page visibility changes. A single two-state
//! machine with one idle timer, driven by injected event sources so it runs
//! against any host that can deliver named events.
//!
//! ```no_run
//! use std::sync::Arc;
//! use activity_detector::source::local::{LocalEventSource, LocalVisibilitySource};
//! use activity_detector::{ActivityDetector, DetectorConfig, State};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), activity_detector::Error> {
//!     let window = Arc::new(LocalEventSource::new());
//!     let document = Arc::new(LocalVisibilitySource::new());
//!     let detector =
//!         ActivityDetector::new(DetectorConfig::default(), window.clone(), document)?;
//!
//!     let _idle = detector.on(State::Idle, || println!("user went idle"));
//!     let _active = detector.on(State::Active, || println!("user is back"));
//!
//!     window.emit("click");
//!     Ok(())
//! }
//! ```

mod config;
mod detector;
mod error;
pub mod source;

pub use config::DetectorConfig;
pub use detector::{ActivityDetector, State, Subscription};
pub use error::Error;
