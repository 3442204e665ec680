use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Default upper bound on the number of pull requests requested from the
/// forge in a single query.
pub const DEFAULT_LIMIT: usize = 10_000;

/// Lifecycle state of a pull request as reported by `gh`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrState {
    Open,
    Merged,
    Closed,
}

/// Verdict carried by a review. Anything outside the four dispositions we
/// count (e.g. `PENDING`) lands in `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewState {
    Commented,
    ChangesRequested,
    Approved,
    Dismissed,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Author {
    pub login: String,
}

impl Author {
    pub fn new(login: impl Into<String>) -> Self {
        Self {
            login: login.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommentRecord {
    pub author: Author,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReviewRecord {
    pub author: Author,
    pub state: ReviewState,
}

/// One element of the array printed by `gh pr list --json ...`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PullRequestRecord {
    pub number: u64,
    pub author: Author,
    pub state: PrState,
    pub additions: u64,
    pub deletions: u64,
    #[serde(default)]
    pub comments: Vec<CommentRecord>,
    #[serde(default)]
    pub reviews: Vec<ReviewRecord>,
}

/// Logins whose activity is ignored entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet(BTreeSet<String>);

impl ExclusionSet {
    /// Parses a comma-separated list of logins. Whitespace around each
    /// login is dropped, as are empty entries.
    pub fn parse(list: &str) -> Self {
        list.split(',')
            .map(str::trim)
            .filter(|login| !login.is_empty())
            .collect()
    }

    pub fn contains(&self, login: &str) -> bool {
        self.0.contains(login)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl<S: Into<String>> FromIterator<S> for ExclusionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoError {
    /// Not of the form `OWNER/REPO`, `HOST/OWNER/REPO` or a project URL.
    Format(String),
    /// A component was empty or contained whitespace.
    InvalidComponent(String),
    Url { input: String, reason: String },
}

impl std::fmt::Display for RepoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepoError::Format(input) => write!(
                f,
                "expected OWNER/REPO, HOST/OWNER/REPO or a project URL, got '{input}'"
            ),
            RepoError::InvalidComponent(component) => {
                write!(f, "invalid repository component '{component}'")
            }
            RepoError::Url { input, reason } => write!(f, "invalid URL '{input}': {reason}"),
        }
    }
}

impl std::error::Error for RepoError {}

/// A project identifier in the form accepted by `gh -R`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Repo {
    host: Option<String>,
    owner: String,
    name: String,
}

impl Repo {
    pub fn new(owner: &str, name: &str) -> Result<Self, RepoError> {
        Self::with_host(None, owner, name)
    }

    pub fn with_host(host: Option<&str>, owner: &str, name: &str) -> Result<Self, RepoError> {
        let valid = |s: &str| !s.is_empty() && !s.chars().any(char::is_whitespace);

        for component in host.into_iter().chain([owner, name]) {
            if !valid(component) {
                return Err(RepoError::InvalidComponent(component.to_string()));
            }
        }

        Ok(Self {
            host: host.map(str::to_string),
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    pub fn parse(input: &str) -> Result<Self, RepoError> {
        let input = input.trim();
        if input.contains("://") {
            return Self::parse_url(input);
        }

        match input.split('/').collect::<Vec<_>>().as_slice() {
            [owner, name] => Self::new(owner, name),
            [host, owner, name] => Self::with_host(Some(*host), owner, name),
            _ => Err(RepoError::Format(input.to_string())),
        }
    }

    /// Accepts `https://HOST/OWNER/REPO` optionally followed by further path
    /// segments such as `/pulls`. `github.com` is left implicit.
    pub fn parse_url(input: &str) -> Result<Self, RepoError> {
        let url = url::Url::parse(input).map_err(|e| RepoError::Url {
            input: input.to_string(),
            reason: e.to_string(),
        })?;

        let host = url
            .host_str()
            .ok_or_else(|| RepoError::Format(input.to_string()))?;

        let segments: Vec<&str> = url
            .path_segments()
            .map(|segments| segments.filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();

        let [owner, name, ..] = segments.as_slice() else {
            return Err(RepoError::Format(input.to_string()));
        };
        let name = name.strip_suffix(".git").unwrap_or(*name);

        let host = (host != "github.com").then_some(host);
        Self::with_host(host, owner, name)
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for Repo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(host) = &self.host {
            write!(f, "{host}/")?;
        }
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Everything needed to run one report. Defaults are resolved before
/// this is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    pub repo: Repo,
    pub excluded: ExclusionSet,
    pub created_from: NaiveDate,
    pub merged_until: NaiveDate,
    pub limit: usize,
}

impl QuerySpec {
    /// Server-side search restricting results to the configured window.
    pub fn search_query(&self) -> String {
        format!(
            "created:>{} merged:<={}",
            self.created_from.format("%Y-%m-%d"),
            self.merged_until.format("%Y-%m-%d")
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LinesOfCode {
    pub added: u64,
    pub deleted: u64,
}

/// Per-login counters. A field stays `None`, and is left out of the JSON
/// output, until something contributes to it.
///
/// Fields are declared in alphabetical order so the serialized object has
/// sorted keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserStats {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changes_requested: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dismissed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loc: Option<LinesOfCode>,
}

fn bump(counter: &mut Option<u64>) {
    *counter.get_or_insert(0) += 1;
}

impl UserStats {
    pub fn add_lines(&mut self, added: u64, deleted: u64) {
        let loc = self.loc.get_or_insert_with(LinesOfCode::default);
        loc.added += added;
        loc.deleted += deleted;
    }

    pub fn record_comment(&mut self) {
        bump(&mut self.comments);
    }

    /// Increments the counter selected by `state`. Returns false, leaving
    /// every counter untouched, for states we don't count.
    pub fn record_review(&mut self, state: ReviewState) -> bool {
        match state {
            ReviewState::Commented => bump(&mut self.comments),
            ReviewState::ChangesRequested => bump(&mut self.changes_requested),
            ReviewState::Approved => bump(&mut self.approved),
            ReviewState::Dismissed => bump(&mut self.dismissed),
            ReviewState::Other => return false,
        }
        true
    }
}

/// Aggregated statistics keyed by login, ordered lexicographically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StatsReport(BTreeMap<String, UserStats>);

impl StatsReport {
    pub fn get(&self, login: &str) -> Option<&UserStats> {
        self.0.get(login)
    }

    /// Returns the entry for `login`, creating an empty one on first use.
    pub fn entry(&mut self, login: &str) -> &mut UserStats {
        self.0.entry(login.to_string()).or_default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A source of pull request records.
#[async_trait]
pub trait Forge {
    async fn fetch_pull_requests(
        &self,
        spec: &QuerySpec,
    ) -> anyhow::Result<Vec<PullRequestRecord>>;
}
