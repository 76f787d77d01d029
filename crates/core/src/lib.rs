pub mod config;
pub mod entry;
pub mod error;
pub mod field;

pub use config::Config;
pub use entry::*;
pub use error::*;
pub use field::*;
