pub mod types;

pub use types::{Revision, SyncPolicy, SyncReport};
