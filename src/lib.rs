pub mod api;
pub mod cli;
pub mod core;
pub mod currency;
pub mod error;
pub mod report;
pub mod store;

pub use error::{Error, Result};
