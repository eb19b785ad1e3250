use std::str::FromStr;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Tree,
    Files,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenizerType {
    Tiktoken,
    HuggingFace,
}

impl FromStr for TokenizerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tiktoken" => Ok(TokenizerType::Tiktoken),
            "huggingface" | "hf" => Ok(TokenizerType::HuggingFace),
            other => Err(format!("unknown tokenizer '{other}'")),
        }
    }
}

/// A fetched file, keyed by its slash-separated path from the repository root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: String,
    pub content: String,
}

impl FileEntry {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenEstimates {
    pub directory_tokens: usize,
    pub content_tokens: usize,
}

impl TokenEstimates {
    pub fn total(&self) -> usize {
        self.directory_tokens + self.content_tokens
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackOutput {
    pub directory_structure: String,
    pub repo_contents: String,
    pub token_estimates: TokenEstimates,
    #[serde(skip_serializing)]
    pub file_count: usize,
}
