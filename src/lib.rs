//! prstats: per-contributor pull request statistics.
//!
//! Lists a repository's pull requests through the GitHub CLI, keeps the
//! merged ones, and totals lines changed, comments and review verdicts per
//! login. Logins can be excluded (typically bots). The result is an ordered
//! report ready to be printed as JSON.

pub mod cli;
pub mod github;
pub mod query;
pub mod stats;
pub mod types;

pub use cli::{Invocation, parse_args, parse_args_at};
pub use github::{FetchError, GhCli};
pub use query::collect_stats;
pub use stats::{Aggregator, aggregate};
pub use types::{
    Author, CommentRecord, DEFAULT_LIMIT, ExclusionSet, Forge, LinesOfCode, PrState,
    PullRequestRecord, QuerySpec, Repo, RepoError, ReviewRecord, ReviewState, StatsReport,
    UserStats,
};
