use std::collections::BTreeSet;
use std::str::FromStr;

use crate::core::{FileEntry, PackError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FilterMode {
    #[default]
    Whitelist,
    Blacklist,
}

impl FromStr for FilterMode {
    type Err = PackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "whitelist" => Ok(FilterMode::Whitelist),
            "blacklist" => Ok(FilterMode::Blacklist),
            other => Err(PackError::InvalidInput(format!(
                "Invalid filter mode '{other}', expected 'whitelist' or 'blacklist'."
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    pub mode: FilterMode,
    pub extensions: BTreeSet<String>,
}

impl FilterSpec {
    pub fn new<I, S>(mode: FilterMode, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            mode,
            extensions: extensions
                .into_iter()
                .map(|ext| normalize_extension(ext.as_ref()))
                .collect(),
        }
    }

    /// Parses the request's mode word and comma-separated extension list.
    ///
    /// Blank list items are dropped. A lone `.` survives normalization as the
    /// empty extension, which selects files without one.
    pub fn parse(mode: Option<&str>, extensions: Option<&str>) -> Result<Self, PackError> {
        let mode = match mode {
            Some(mode) => mode.parse()?,
            None => FilterMode::default(),
        };
        let extensions = extensions
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty());
        Ok(Self::new(mode, extensions))
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    pub fn keeps(&self, path: &str) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        let listed = self.extensions.contains(&extension_of(path));
        match self.mode {
            FilterMode::Whitelist => listed,
            FilterMode::Blacklist => !listed,
        }
    }

    pub fn apply(&self, entries: Vec<FileEntry>) -> Vec<FileEntry> {
        if self.is_empty() {
            return entries;
        }
        entries
            .into_iter()
            .filter(|entry| self.keeps(&entry.path))
            .collect()
    }
}

pub fn normalize_extension(raw: &str) -> String {
    raw.trim().trim_start_matches('.').to_lowercase()
}

/// Lowercased extension of the last path segment, or `""` when there is none.
/// Leading dots of dotfiles such as `.gitignore` do not start an extension.
pub fn extension_of(path: &str) -> String {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    let stem_start = file_name.len() - file_name.trim_start_matches('.').len();
    match file_name[stem_start..].rfind('.') {
        Some(dot) => file_name[stem_start + dot + 1..].to_lowercase(),
        None => String::new(),
    }
}
