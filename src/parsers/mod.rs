//! Page-source parsing shared by the pipeline stages.
//!
//! Everything here works on HTML snapshots returned by the browser, so it can
//! be tested without a WebDriver session.

pub mod html;
pub mod text;


pub use html::{Probe, probe_first};
