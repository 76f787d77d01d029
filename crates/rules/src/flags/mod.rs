//! Flag review lifecycle, re-evaluation merge and JSON persistence.

mod error;
mod file;
mod merge;
mod store;

pub use error::{FlagError, Result};
pub use file::FlagFile;
pub use merge::{MergePolicy, MergeSummary};
pub use store::FlagStore;
