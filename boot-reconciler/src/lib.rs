//! Boot time reconciliation of the booted OS image with the desired device spec.
//!
//! Start with [`bootstrap::Bootstrap`].

pub mod bootstrap;
pub mod error;
pub mod logging;
pub mod os;
pub mod settings;
pub mod spec;
pub mod status;

pub use bootstrap::{Bootstrap, BootstrapReport, Outcome};
pub use error::BootstrapError;
pub use settings::{Args, Settings};
