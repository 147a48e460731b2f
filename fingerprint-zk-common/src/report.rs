use crate::matcher::MatchResult;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Match { score: u32 },
    NoMatch,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Match { score } => write!(f, "MATCH: Same fingerprint (score: {score}/100)"),
            Verdict::NoMatch => write!(f, "NO MATCH: Different fingerprints"),
        }
    }
}

/// Human readable view of a [`MatchResult`]. Presentation only.
#[derive(Debug, Clone, Copy)]
pub struct DecisionReport<'a> {
    result: &'a MatchResult,
}

impl<'a> DecisionReport<'a> {
    pub fn new(result: &'a MatchResult) -> Self {
        Self { result }
    }

    pub fn verdict(&self) -> Verdict {
        if self.result.is_match {
            Verdict::Match {
                score: self.result.final_score,
            }
        } else {
            Verdict::NoMatch
        }
    }

    pub fn diagnostics(&self) -> String {
        let r = self.result;
        format!(
            "Average distance: {:.2}\nGood matches: {}/{}\nFinal score: {}/100\nMatch: {}",
            r.mean_accepted_distance(),
            r.good_match_count,
            r.total_pairs(),
            r.final_score,
            if r.is_match { "YES" } else { "NO" }
        )
    }
}

impl fmt::Display for DecisionReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Diagnostics (not in circuit input):")?;
        writeln!(f, "{}", self.diagnostics())?;
        writeln!(f)?;
        writeln!(f, "=== Final Result ===")?;
        write!(f, "{}", self.verdict())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_match_report() {
        let result = MatchResult::default();
        let report = DecisionReport::new(&result);
        assert_eq!(report.verdict(), Verdict::NoMatch);
        assert_eq!(
            report.diagnostics(),
            "Average distance: 256.00\nGood matches: 0/0\nFinal score: 0/100\nMatch: NO"
        );
    }

    #[test]
    fn match_report_carries_score() {
        let result = MatchResult {
            is_match: true,
            final_score: 73,
            good_match_count: 14,
            ..Default::default()
        };
        let report = DecisionReport::new(&result);
        assert_eq!(report.verdict(), Verdict::Match { score: 73 });
        assert!(report
            .to_string()
            .ends_with("=== Final Result ===\nMATCH: Same fingerprint (score: 73/100)"));
    }
}
