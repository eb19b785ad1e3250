pub mod config;
pub mod error;
pub mod tokenizer;
pub mod types;

pub use config::{get_config_path, load_config, load_config_from, save_config_to, Config};
pub use error::{PackError, Result};
pub use tokenizer::{TokenCounter, TokenEstimator, TokenizerBackend};
pub use types::{FileEntry, OutputFormat, PackOutput, TokenEstimates, TokenizerType};
