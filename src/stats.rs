use tracing::debug;

use crate::types::{
    CommentRecord, ExclusionSet, PrState, PullRequestRecord, ReviewRecord, StatsReport,
};

/// Folds merged pull requests into per-login counters, skipping anything
/// authored by an excluded login.
pub struct Aggregator<'a> {
    excluded: &'a ExclusionSet,
    report: StatsReport,
}

impl<'a> Aggregator<'a> {
    pub fn new(excluded: &'a ExclusionSet) -> Self {
        Self {
            excluded,
            report: StatsReport::default(),
        }
    }

    /// Accounts for a single record. Records that were not merged are
    /// ignored; returns whether the record was counted.
    pub fn add(&mut self, pr: &PullRequestRecord) -> bool {
        if pr.state != PrState::Merged {
            debug!(number = pr.number, state = ?pr.state, "skipping unmerged PR");
            return false;
        }

        self.add_lines(pr);
        self.add_comments(&pr.comments);
        self.add_reviews(pr.number, &pr.reviews);
        true
    }

    fn add_lines(&mut self, pr: &PullRequestRecord) {
        let login = &pr.author.login;
        if self.excluded.contains(login) {
            return;
        }
        self.report.entry(login).add_lines(pr.additions, pr.deletions);
    }

    fn add_comments(&mut self, comments: &[CommentRecord]) {
        for comment in comments {
            let login = &comment.author.login;
            if self.excluded.contains(login) {
                continue;
            }
            self.report.entry(login).record_comment();
        }
    }

    fn add_reviews(&mut self, number: u64, reviews: &[ReviewRecord]) {
        for review in reviews {
            let login = &review.author.login;
            if self.excluded.contains(login) {
                continue;
            }
            if !self.report.entry(login).record_review(review.state) {
                debug!(number, login = %login, "ignoring review with uncounted state");
            }
        }
    }

    pub fn finish(self) -> StatsReport {
        self.report
    }
}

/// Aggregates `prs` in order and returns the per-login report.
pub fn aggregate<'a, I>(excluded: &ExclusionSet, prs: I) -> StatsReport
where
    I: IntoIterator<Item = &'a PullRequestRecord>,
{
    let mut aggregator = Aggregator::new(excluded);
    let mut merged = 0usize;
    let mut total = 0usize;

    for pr in prs {
        total += 1;
        if aggregator.add(pr) {
            merged += 1;
        }
    }

    let report = aggregator.finish();
    debug!(total, merged, users = report.len(), "aggregation complete");
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Author, LinesOfCode, ReviewState, UserStats};

    fn pr(
        number: u64,
        author: &str,
        state: PrState,
        additions: u64,
        deletions: u64,
    ) -> PullRequestRecord {
        PullRequestRecord {
            number,
            author: Author::new(author),
            state,
            additions,
            deletions,
            comments: vec![],
            reviews: vec![],
        }
    }

    fn comment(author: &str) -> CommentRecord {
        CommentRecord {
            author: Author::new(author),
        }
    }

    fn review(author: &str, state: ReviewState) -> ReviewRecord {
        ReviewRecord {
            author: Author::new(author),
            state,
        }
    }

    #[test]
    fn test_unmerged_records_contribute_nothing() {
        let mut open = pr(1, "alice", PrState::Open, 10, 2);
        open.comments.push(comment("bob"));
        open.reviews.push(review("carol", ReviewState::Approved));
        let closed = pr(2, "alice", PrState::Closed, 4, 4);

        let report = aggregate(&ExclusionSet::default(), [&open, &closed]);
        assert!(report.is_empty());
    }

    #[test]
    fn test_loc_sums_across_records() {
        let prs = [
            pr(1, "carol", PrState::Merged, 5, 1),
            pr(2, "carol", PrState::Merged, 3, 0),
        ];

        let report = aggregate(&ExclusionSet::default(), &prs);
        assert_eq!(
            report.get("carol").unwrap().loc,
            Some(LinesOfCode {
                added: 8,
                deleted: 1
            })
        );
    }

    #[test]
    fn test_excluded_author_gets_no_entry() {
        let mut merged = pr(1, "bot", PrState::Merged, 100, 50);
        merged.comments.push(comment("bot"));
        merged.reviews.push(review("bot", ReviewState::Approved));
        merged.reviews.push(review("alice", ReviewState::ChangesRequested));

        let excluded = ExclusionSet::parse("bot");
        let report = aggregate(&excluded, [&merged]);

        assert!(report.get("bot").is_none());
        assert_eq!(report.get("alice").unwrap().changes_requested, Some(1));
        assert_eq!(report.len(), 1);
    }

    #[test]
    fn test_review_states_route_exclusively() {
        let mut merged = pr(7, "alice", PrState::Merged, 0, 0);
        merged.reviews = vec![
            review("bob", ReviewState::Commented),
            review("bob", ReviewState::ChangesRequested),
            review("bob", ReviewState::Approved),
            review("bob", ReviewState::Dismissed),
            review("bob", ReviewState::Other),
        ];
        merged.comments.push(comment("bob"));

        let report = aggregate(&ExclusionSet::default(), [&merged]);
        assert_eq!(
            report.get("bob").unwrap(),
            &UserStats {
                approved: Some(1),
                changes_requested: Some(1),
                comments: Some(2),
                dismissed: Some(1),
                loc: None,
            }
        );
    }

    #[test]
    fn test_uncounted_review_still_creates_entry() {
        let mut merged = pr(3, "alice", PrState::Merged, 1, 1);
        merged.reviews.push(review("dave", ReviewState::Other));

        let report = aggregate(&ExclusionSet::default(), [&merged]);
        assert_eq!(report.get("dave"), Some(&UserStats::default()));
    }

    #[test]
    fn test_duplicate_records_are_double_counted() {
        let mut merged = pr(9, "alice", PrState::Merged, 2, 1);
        merged.comments.push(comment("bob"));

        let report = aggregate(&ExclusionSet::default(), [&merged, &merged]);
        assert_eq!(
            report.get("alice").unwrap().loc,
            Some(LinesOfCode {
                added: 4,
                deleted: 2
            })
        );
        assert_eq!(report.get("bob").unwrap().comments, Some(2));
    }

    #[test]
    fn test_order_independent() {
        let mut first = pr(1, "alice", PrState::Merged, 10, 2);
        first.comments.push(comment("bob"));
        let mut second = pr(2, "bob", PrState::Merged, 3, 3);
        second.reviews.push(review("alice", ReviewState::Approved));
        let third = pr(3, "carol", PrState::Open, 99, 99);

        let forward = aggregate(&ExclusionSet::default(), [&first, &second, &third]);
        let backward = aggregate(&ExclusionSet::default(), [&third, &second, &first]);
        assert_eq!(forward, backward);
    }
}
