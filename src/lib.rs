pub mod core;
pub mod fetch;
pub mod filter;
pub mod output;
pub mod pipeline;
pub mod server;

pub use crate::core::{
    get_config_path, load_config, Config, FileEntry, OutputFormat, PackError, PackOutput,
    TokenCounter, TokenEstimates, TokenEstimator, TokenizerType,
};
pub use fetch::{RepositoryRef, TreeFetcher};
pub use filter::{FilterMode, FilterSpec};
pub use pipeline::{PackRequest, Pipeline, Stage};
