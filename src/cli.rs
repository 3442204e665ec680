use std::{ffi::OsString, path::PathBuf};

use anyhow::Result;
use chrono::{Duration, Local, NaiveDate};
use clap::Parser;
use tracing::warn;

use crate::types::{DEFAULT_LIMIT, ExclusionSet, QuerySpec, Repo};

const BUILD_INFO_HUMAN: &str = env!("BUILD_INFO_HUMAN");

/// How far back the creation window reaches when no start date is given.
pub const DEFAULT_WINDOW_DAYS: i64 = 30;

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| format!("expected YYYY-MM-DD, got '{value}': {e}"))
}

fn parse_repo(value: &str) -> Result<Repo, String> {
    Repo::parse(value).map_err(|e| e.to_string())
}

#[derive(Parser, Debug)]
#[command(
    name = "prstats",
    about = "Per-contributor pull request statistics (lines changed, comments, reviews) for merged PRs, printed as JSON"
)]
#[command(long_version = BUILD_INFO_HUMAN)]
struct CliArgs {
    /// Repository in format 'OWNER/REPO', 'HOST/OWNER/REPO' or a project URL
    #[arg(value_name = "PROJECT", value_parser = parse_repo)]
    pub project: Repo,

    /// Comma-separated logins to leave out of the report (may be empty)
    #[arg(value_name = "EXCLUDED")]
    pub excluded: String,

    /// Only PRs created after this date [default: 30 days ago]
    #[arg(value_name = "CREATED_FROM", value_parser = parse_date)]
    pub created_from: Option<NaiveDate>,

    /// Only PRs merged on or before this date [default: today]
    #[arg(value_name = "MERGED_UNTIL", value_parser = parse_date)]
    pub merged_until: Option<NaiveDate>,

    /// Maximum number of PRs to fetch
    #[arg(short = 'L', long, default_value_t = DEFAULT_LIMIT, value_name = "NUM")]
    pub limit: usize,

    /// Path to the GitHub CLI executable
    #[arg(long = "gh", default_value = "gh", value_name = "PATH")]
    pub gh: PathBuf,
}

impl CliArgs {
    fn into_spec(self, today: NaiveDate) -> Result<QuerySpec> {
        let created_from = self
            .created_from
            .unwrap_or(today - Duration::days(DEFAULT_WINDOW_DAYS));
        let merged_until = self.merged_until.unwrap_or(today);

        if created_from > merged_until {
            warn!(
                %created_from,
                %merged_until,
                "created-from date is after merged-until date; no pull request can match"
            );
        }

        if self.limit == 0 {
            anyhow::bail!("--limit must be greater than zero");
        }

        Ok(QuerySpec {
            repo: self.project,
            excluded: ExclusionSet::parse(&self.excluded),
            created_from,
            merged_until,
            limit: self.limit,
        })
    }
}

/// Resolved command line: what to query and which `gh` to query it with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub spec: QuerySpec,
    pub gh: PathBuf,
}

/// Parses command-line arguments, resolving omitted dates relative to
/// `today`.
pub fn parse_args_at<I, T>(args: I, today: NaiveDate) -> Result<Invocation>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = CliArgs::try_parse_from(args)?;
    let gh = cli.gh.clone();
    let spec = cli.into_spec(today)?;
    Ok(Invocation { spec, gh })
}

/// Parses command-line arguments, resolving omitted dates relative to the
/// local date.
pub fn parse_args<I, T>(args: I) -> Result<Invocation>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    parse_args_at(args, Local::now().date_naive())
}
