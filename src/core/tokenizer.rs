use anyhow::{anyhow, Result};
use tiktoken_rs::CoreBPE;
use tokenizers::Tokenizer as HfTokenizer;

use super::config::Config;
use super::types::TokenizerType;

/// Counts tokens in a text blob.
pub trait TokenEstimator: Send + Sync {
    fn estimate(&self, text: &str) -> Result<usize>;
}

pub enum TokenizerBackend {
    Tiktoken(CoreBPE),
    HuggingFace(Box<HfTokenizer>),
}

pub struct TokenCounter {
    backend: TokenizerBackend,
}

impl TokenCounter {
    /// Builds a tiktoken counter from an encoding name (`cl100k_base`, `o200k_base`, ...)
    /// or any model name tiktoken knows about.
    pub fn new(encoding: &str) -> Result<Self> {
        let bpe = match encoding {
            "cl100k_base" => tiktoken_rs::cl100k_base(),
            "o200k_base" => tiktoken_rs::o200k_base(),
            "p50k_base" => tiktoken_rs::p50k_base(),
            "p50k_edit" => tiktoken_rs::p50k_edit(),
            "r50k_base" | "gpt2" => tiktoken_rs::r50k_base(),
            model => tiktoken_rs::get_bpe_from_model(model),
        }
        .map_err(|e| anyhow!("Failed to initialize tiktoken tokenizer '{}': {}", encoding, e))?;

        Ok(Self {
            backend: TokenizerBackend::Tiktoken(bpe),
        })
    }

    pub fn with_hf_tokenizer(model_name: &str) -> Result<Self> {
        let tokenizer = HfTokenizer::from_pretrained(model_name, None).map_err(|e| {
            anyhow!(
                "Failed to load HuggingFace tokenizer '{}': {}",
                model_name,
                e
            )
        })?;

        Ok(Self {
            backend: TokenizerBackend::HuggingFace(Box::new(tokenizer)),
        })
    }

    pub fn from_hf_file(path: &str) -> Result<Self> {
        let tokenizer = HfTokenizer::from_file(path).map_err(|e| {
            anyhow!(
                "Failed to load HuggingFace tokenizer from file '{}': {}",
                path,
                e
            )
        })?;

        Ok(Self {
            backend: TokenizerBackend::HuggingFace(Box::new(tokenizer)),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let kind: TokenizerType = config.tokenizer.parse().map_err(|e| anyhow!("{}", e))?;
        match kind {
            TokenizerType::Tiktoken => Self::new(&config.tokenizer_model),
            TokenizerType::HuggingFace => match &config.tokenizer_file {
                Some(path) => Self::from_hf_file(&path.to_string_lossy()),
                None => Self::with_hf_tokenizer(&config.tokenizer_model),
            },
        }
    }

    pub fn count_tokens(&self, text: &str) -> Result<usize> {
        match &self.backend {
            TokenizerBackend::Tiktoken(bpe) => {
                // tiktoken's encode_with_special_tokens is infallible
                Ok(bpe.encode_with_special_tokens(text).len())
            }
            TokenizerBackend::HuggingFace(tokenizer) => tokenizer
                .encode(text, false)
                .map_err(|e| anyhow!("Failed to encode text with HuggingFace tokenizer: {}", e))
                .map(|encoding| encoding.len()),
        }
    }
}

impl TokenEstimator for TokenCounter {
    fn estimate(&self, text: &str) -> Result<usize> {
        self.count_tokens(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tiktoken_counter() -> Result<()> {
        let counter = TokenCounter::new("cl100k_base")?;
        assert_eq!(counter.count_tokens("Hello, world!")?, 4);
        Ok(())
    }

    #[test]
    fn test_empty_text_has_no_tokens() -> Result<()> {
        let counter = TokenCounter::new("cl100k_base")?;
        assert_eq!(counter.estimate("")?, 0);
        Ok(())
    }

    #[test]
    fn test_counts_are_deterministic() -> Result<()> {
        let counter = TokenCounter::new("cl100k_base")?;
        let text = "├── src\n│   └── lib.rs\n└── Cargo.toml";
        assert_eq!(counter.estimate(text)?, counter.estimate(text)?);
        Ok(())
    }

    #[test]
    fn test_model_name_resolves() -> Result<()> {
        let counter = TokenCounter::new("gpt-4o")?;
        assert!(counter.count_tokens("fn main() {}")? > 0);
        Ok(())
    }

    #[test]
    fn test_unknown_encoding_fails() {
        assert!(TokenCounter::new("no-such-encoding").is_err());
    }

    #[test]
    fn test_from_config_rejects_unknown_backend() {
        let config = Config {
            tokenizer: "sentencepiece".to_string(),
            ..Config::default()
        };
        assert!(TokenCounter::from_config(&config).is_err());
    }

    #[test]
    #[ignore = "downloads the tokenizer from the HuggingFace hub"]
    fn test_hf_counter() -> Result<()> {
        let counter = TokenCounter::with_hf_tokenizer("gpt2")?;
        let count = counter.count_tokens("Hello, world!")?;
        assert!(count > 0);
        Ok(())
    }
}
