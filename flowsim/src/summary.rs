use std::fmt;

use flowsim_protocol::Outcome;
use flowsim_sampling::{Analysis, OutcomeCounts};

/// A text table of expected and optionally realized outcome counts.
pub struct Summary<'a> {
    analysis: &'a Analysis,
    realized: Option<&'a OutcomeCounts>,
}

impl<'a> Summary<'a> {
    /// Summarizes the analytic rates only.
    pub fn expected(analysis: &'a Analysis) -> Self {
        Self {
            analysis,
            realized: None,
        }
    }

    /// Summarizes the analytic rates next to the outcomes of a simulated batch.
    pub fn with_realized(analysis: &'a Analysis, realized: &'a OutcomeCounts) -> Self {
        Self {
            analysis,
            realized: Some(realized),
        }
    }
}

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.realized.is_some() {
            writeln!(f, "{:<10}{:>22}{:>24}", "", "expected", "realized")?;
            writeln!(
                f,
                "{:<10}{:>8}{:>14}{:>10}{:>14}",
                "outcome", "errors", "transactions", "errors", "transactions"
            )?;
        } else {
            writeln!(f, "{:<10}{:>8}{:>14}", "outcome", "errors", "transactions")?;
        }

        for outcome in Outcome::ALL {
            let expected = self.analysis.counts.get(*outcome);
            write!(
                f,
                "{:<10}{:>8}{:>14}",
                outcome.name(),
                expected.error,
                expected.performance
            )?;
            if let Some(realized) = self.realized {
                let realized = realized.get(*outcome);
                write!(f, "{:>10}{:>14}", realized.error, realized.performance)?;
            }
            writeln!(f)?;
        }

        writeln!(f)?;
        writeln!(f, "filters:")?;
        for filter in &self.analysis.filters {
            writeln!(f, "  {:<24}{:>6.2}", filter.name, filter.retention_rate)?;
        }

        writeln!(
            f,
            "inbound filters retain {:.2}% of events",
            self.analysis.inbound_rate * 100.0
        )
    }
}
