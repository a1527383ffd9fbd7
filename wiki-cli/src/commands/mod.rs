//! CLI subcommand implementations.

pub mod init;
pub mod search;
pub mod serve;

pub use init::init_vault;
pub use search::{search_vault, SearchOptions};
pub use serve::serve;
