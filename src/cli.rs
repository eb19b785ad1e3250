use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use treepack::core::{Config, OutputFormat};
use treepack::pipeline::PackRequest;

#[derive(Debug, Clone, ValueEnum)]
pub enum CliOutputFormat {
    Tree,
    Files,
    Both,
}

impl From<CliOutputFormat> for OutputFormat {
    fn from(format: CliOutputFormat) -> Self {
        match format {
            CliOutputFormat::Tree => OutputFormat::Tree,
            CliOutputFormat::Files => OutputFormat::Files,
            CliOutputFormat::Both => OutputFormat::Both,
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
pub enum CliTokenizerType {
    Tiktoken,
    #[clap(name = "huggingface")]
    HuggingFace,
}

impl CliTokenizerType {
    fn as_config_value(&self) -> &'static str {
        match self {
            CliTokenizerType::Tiktoken => "tiktoken",
            CliTokenizerType::HuggingFace => "huggingface",
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "treepack",
    about = "Pack a remote repository into a single LLM-ready text artifact",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Tokenizer backend used for estimates
    #[arg(long, value_enum, global = true)]
    pub tokenizer: Option<CliTokenizerType>,

    /// Encoding or model name for the tokenizer (e.g. cl100k_base, gpt2)
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Local tokenizer.json for the huggingface backend
    #[arg(long, global = true)]
    pub tokenizer_file: Option<PathBuf>,

    /// Maximum directory nesting to follow
    #[arg(long, global = true)]
    pub max_depth: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the JSON API (POST /fetchRepo)
    Serve {
        #[arg(long)]
        bind: Option<String>,

        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Pack one repository and write the result locally
    ///
    /// Example: treepack fetch https://github.com/owner/repo -e rs,toml
    Fetch {
        /// Repository URL (e.g. https://github.com/owner/repo)
        repo_url: String,

        /// Filter mode for --extensions
        #[arg(short, long, default_value = "whitelist")]
        mode: String,

        /// Comma-separated extensions to keep (whitelist) or drop (blacklist)
        #[arg(short, long, default_value = "")]
        extensions: String,

        #[arg(short, long, value_enum, default_value = "both")]
        output: CliOutputFormat,

        /// Write output to a file
        #[arg(short = 'f', long, num_args = 0..=1, default_missing_value = "TREEPACK.md")]
        file: Option<PathBuf>,

        /// Print output to stdout instead of copying it to the clipboard
        #[arg(short, long)]
        print: bool,

        /// Skip the token summary
        #[arg(long)]
        no_tokens: bool,
    },

    /// Print the config file location
    ConfigPath,
}

impl Cli {
    /// Layers command-line overrides on top of the loaded config.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(tokenizer) = &self.tokenizer {
            config.tokenizer = tokenizer.as_config_value().to_string();
        }
        if let Some(model) = &self.model {
            config.tokenizer_model = model.clone();
        }
        if let Some(path) = &self.tokenizer_file {
            config.tokenizer_file = Some(path.clone());
        }
        if let Some(max_depth) = self.max_depth {
            config.max_depth = max_depth;
        }
        if let Commands::Serve { bind, port } = &self.command {
            if let Some(bind) = bind {
                config.bind_address = bind.clone();
            }
            if let Some(port) = port {
                config.port = *port;
            }
        }
    }
}

pub fn pack_request(repo_url: &str, mode: &str, extensions: &str) -> PackRequest {
    PackRequest {
        repo_url: repo_url.to_string(),
        filter_mode: Some(mode.to_string()),
        filter_extensions: Some(extensions.to_string()),
    }
}
