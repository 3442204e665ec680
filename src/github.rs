use std::{ffi::OsString, process::ExitStatus};

use anyhow::Context;
use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::types::{Forge, PullRequestRecord, QuerySpec};

/// Fields requested from `gh pr list --json`.
pub const PR_JSON_FIELDS: &str = "number,author,reviews,comments,additions,deletions,state";

/// Failure of the external query tool.
#[derive(Debug)]
pub enum FetchError {
    /// The program could not be started at all.
    Spawn {
        program: String,
        source: std::io::Error,
    },
    /// The program ran but exited unsuccessfully.
    Exit { status: ExitStatus, stderr: String },
    /// The program's output was not the expected JSON array.
    Decode(serde_json::Error),
}

impl FetchError {
    /// Exit code of the external tool, when it exited with one.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            FetchError::Exit { status, .. } => status.code(),
            _ => None,
        }
    }
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Spawn { program, source } => {
                write!(f, "failed to run '{program}': {source}")
            }
            FetchError::Exit { status, stderr } if stderr.is_empty() => {
                write!(f, "gh exited with {status}")
            }
            FetchError::Exit { status, stderr } => write!(f, "gh exited with {status}: {stderr}"),
            FetchError::Decode(err) => write!(f, "unexpected JSON from gh: {err}"),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Spawn { source, .. } => Some(source),
            FetchError::Decode(err) => Some(err),
            FetchError::Exit { .. } => None,
        }
    }
}

/// Forge backed by the GitHub CLI.
#[derive(Debug, Clone)]
pub struct GhCli {
    program: OsString,
    leading_args: Vec<OsString>,
}

impl GhCli {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
        }
    }

    /// Arguments placed before the `pr list ...` arguments, e.g. to run
    /// `gh` through a wrapper such as `sh -c SCRIPT`.
    pub fn with_leading_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.leading_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// The `pr list` arguments for `spec`, without the program name.
    pub fn pr_list_args(spec: &QuerySpec) -> Vec<String> {
        vec![
            "pr".to_string(),
            "list".to_string(),
            "-R".to_string(),
            spec.repo.to_string(),
            "-s".to_string(),
            "all".to_string(),
            "-S".to_string(),
            spec.search_query(),
            "-L".to_string(),
            spec.limit.to_string(),
            format!("--json={PR_JSON_FIELDS}"),
        ]
    }

    async fn run(&self, spec: &QuerySpec) -> Result<Vec<u8>, FetchError> {
        let args = Self::pr_list_args(spec);
        debug!(program = ?self.program, ?args, "running gh");

        let output = Command::new(&self.program)
            .args(&self.leading_args)
            .args(&args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| FetchError::Spawn {
                program: self.program.to_string_lossy().into_owned(),
                source,
            })?;

        if !output.status.success() {
            return Err(FetchError::Exit {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output.stdout)
    }
}

/// Decodes the JSON array printed by `gh pr list --json`.
pub fn parse_pr_list(json: &[u8]) -> Result<Vec<PullRequestRecord>, FetchError> {
    serde_json::from_slice(json).map_err(FetchError::Decode)
}

#[async_trait]
impl Forge for GhCli {
    async fn fetch_pull_requests(
        &self,
        spec: &QuerySpec,
    ) -> anyhow::Result<Vec<PullRequestRecord>> {
        let stdout = self
            .run(spec)
            .await
            .with_context(|| format!("Failed to list pull requests for {}", spec.repo))?;

        let prs = parse_pr_list(&stdout)
            .with_context(|| format!("Failed to parse pull requests for {}", spec.repo))?;

        info!(repo = %spec.repo, count = prs.len(), "fetched pull requests");
        Ok(prs)
    }
}
