use url::{ParseError, Url};

use crate::core::PackError;

/// Owner/name pair identifying a hosted repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryRef {
    pub owner: String,
    pub name: String,
    /// Branch, tag or commit taken from a `/tree/<ref>` URL whose ref is the last segment.
    pub reference: Option<String>,
}

impl RepositoryRef {
    /// Parses URLs like `https://github.com/owner/repo`, `github.com/owner/repo.git`,
    /// `https://github.com/owner/repo/tree/main` or the bare identifier `owner/repo`.
    ///
    /// `tree/<a>/<b>` is ambiguous between a slashed branch and a subdirectory, so
    /// no ref is kept for it and the default branch is used.
    pub fn parse(input: &str) -> Result<Self, PackError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(PackError::InvalidInput(
                "Repository URL is required.".to_string(),
            ));
        }

        let url = match Url::parse(input) {
            Ok(url) => url,
            Err(ParseError::RelativeUrlWithoutBase) => Url::parse(&schemeless(input))
                .map_err(|e| invalid_url(input, &e.to_string()))?,
            Err(e) => return Err(invalid_url(input, &e.to_string())),
        };

        let segments: Vec<&str> = url
            .path_segments()
            .map(|segments| segments.filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();

        if segments.len() < 2 {
            return Err(invalid_url(input, "expected /<owner>/<repo>"));
        }

        let owner = segments[0].to_string();
        let name = segments[1].trim_end_matches(".git").to_string();
        if name.is_empty() {
            return Err(invalid_url(input, "repository name is empty"));
        }

        let reference = match &segments[2..] {
            ["tree", reference] => Some(reference.to_string()),
            _ => None,
        };

        Ok(Self {
            owner,
            name,
            reference,
        })
    }

    /// Contents-listing URL for the repository root under `api_base`.
    pub fn contents_url(&self, api_base: &str) -> Result<Url, PackError> {
        let mut url = Url::parse(api_base).map_err(|e| {
            PackError::Internal(format!("invalid API base URL '{api_base}': {e}"))
        })?;

        url.path_segments_mut()
            .map_err(|_| PackError::Internal(format!("API base URL '{api_base}' cannot be a base")))?
            .pop_if_empty()
            .extend(["repos", self.owner.as_str(), self.name.as_str(), "contents"]);

        if let Some(reference) = &self.reference {
            url.query_pairs_mut().append_pair("ref", reference);
        }

        Ok(url)
    }
}

impl std::fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)?;
        if let Some(reference) = &self.reference {
            write!(f, "@{reference}")?;
        }
        Ok(())
    }
}

/// `github.com/o/r` gets a scheme; `o/r` has no host and is read as a path.
fn schemeless(input: &str) -> String {
    let first = input.trim_start_matches('/').split('/').next().unwrap_or_default();
    if first.contains('.') || first.contains(':') || first == "localhost" {
        format!("https://{input}")
    } else {
        format!("https://github.com/{}", input.trim_start_matches('/'))
    }
}

fn invalid_url(input: &str, reason: &str) -> PackError {
    PackError::InvalidInput(format!(
        "Invalid GitHub repository URL '{input}': {reason}."
    ))
}
