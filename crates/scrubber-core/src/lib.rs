pub mod activity;
pub mod clock;
pub mod domain;
pub mod error;
pub mod host;
pub mod memory;
pub mod settings;
pub mod transfer;

pub use error::{Error, Result};
