pub mod repo_ref;
pub mod tree_fetcher;

pub use repo_ref::RepositoryRef;
pub use tree_fetcher::{ContentEntry, EntryType, TreeFetcher, DEFAULT_MAX_DEPTH};
