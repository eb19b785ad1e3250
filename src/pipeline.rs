use std::fmt;
use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, info, warn};

use crate::core::{
    Config, PackError, PackOutput, Result, TokenCounter, TokenEstimates, TokenEstimator,
};
use crate::fetch::{RepositoryRef, TreeFetcher};
use crate::filter::FilterSpec;
use crate::output::{aggregate_contents, render_tree};

/// Raw request fields as supplied by a caller.
#[derive(Debug, Clone, Default)]
pub struct PackRequest {
    pub repo_url: String,
    pub filter_mode: Option<String>,
    pub filter_extensions: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ParsingInput,
    Fetching,
    Filtering,
    Rendering,
    Estimating,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::ParsingInput => "parsing-input",
            Stage::Fetching => "fetching",
            Stage::Filtering => "filtering",
            Stage::Rendering => "rendering",
            Stage::Estimating => "estimating",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Runs fetch, filter, render and estimate for one request at a time.
///
/// Holds only immutable state, so one instance serves concurrent requests.
pub struct Pipeline {
    api_base_url: String,
    fetcher: TreeFetcher,
    estimator: Arc<dyn TokenEstimator>,
}

impl Pipeline {
    pub fn new(
        api_base_url: impl Into<String>,
        fetcher: TreeFetcher,
        estimator: Arc<dyn TokenEstimator>,
    ) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            fetcher,
            estimator,
        }
    }

    pub fn from_config(config: &Config, token: Option<&str>) -> anyhow::Result<Self> {
        let fetcher = TreeFetcher::new(token, &config.user_agent)
            .context("Failed to build the HTTP client")?
            .with_max_depth(config.max_depth);
        let counter = TokenCounter::from_config(config)?;
        Ok(Self::new(config.api_base_url.clone(), fetcher, Arc::new(counter)))
    }

    pub async fn run(&self, request: &PackRequest) -> Result<PackOutput> {
        let mut stage = Stage::ParsingInput;
        match self.execute(request, &mut stage).await {
            Ok(output) => Ok(output),
            Err(err) => {
                warn!(%stage, repo_url = %request.repo_url, error = %err, "pack request failed");
                Err(err)
            }
        }
    }

    async fn execute(&self, request: &PackRequest, stage: &mut Stage) -> Result<PackOutput> {
        let repo = RepositoryRef::parse(&request.repo_url)?;
        let spec = FilterSpec::parse(
            request.filter_mode.as_deref(),
            request.filter_extensions.as_deref(),
        )?;
        let api_url = repo.contents_url(&self.api_base_url)?;

        advance(stage, Stage::Fetching);
        info!(%repo, "fetching repository");
        let files = self.fetcher.fetch(api_url.as_str()).await?;

        advance(stage, Stage::Filtering);
        let fetched = files.len();
        let files = spec.apply(files);
        debug!(fetched, kept = files.len(), mode = ?spec.mode, "applied extension filter");
        if files.is_empty() {
            return Err(PackError::NotFound);
        }

        advance(stage, Stage::Rendering);
        let directory_structure = render_tree(&files);
        let repo_contents = aggregate_contents(&files);

        advance(stage, Stage::Estimating);
        let estimator = Arc::clone(&self.estimator);
        let (directory_structure, repo_contents, token_estimates) =
            tokio::task::spawn_blocking(move || {
                let estimates =
                    estimate_all(estimator.as_ref(), &directory_structure, &repo_contents);
                (directory_structure, repo_contents, estimates)
            })
            .await
            .map_err(|e| PackError::Internal(format!("token estimation task failed: {e}")))?;
        let token_estimates = token_estimates?;

        advance(stage, Stage::Done);
        info!(
            %repo,
            files = files.len(),
            directory_tokens = token_estimates.directory_tokens,
            content_tokens = token_estimates.content_tokens,
            "repository packed"
        );

        Ok(PackOutput {
            directory_structure,
            repo_contents,
            token_estimates,
            file_count: files.len(),
        })
    }
}

/// Runs on a blocking thread; encoding a large repository is CPU-bound.
fn estimate_all(
    estimator: &dyn TokenEstimator,
    directory_structure: &str,
    repo_contents: &str,
) -> Result<TokenEstimates> {
    let estimate = |text: &str| {
        estimator
            .estimate(text)
            .map_err(|e| PackError::Tokenization(e.to_string()))
    };
    Ok(TokenEstimates {
        directory_tokens: estimate(directory_structure)?,
        content_tokens: estimate(repo_contents)?,
    })
}

fn advance(stage: &mut Stage, next: Stage) {
    debug!(from = %stage, to = %next, "pipeline stage");
    *stage = next;
}
