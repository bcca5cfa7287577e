//! Solve-time bookkeeping: one record per outer-loop iteration, plus a
//! human-readable log of the whole run.
//!
//! The shape (an enum of discrete operations with a `Display` impl that
//! uses `console::style` for terminal emphasis) is the same one the
//! simplex-diff solver uses for its own iteration trace.

use std::fmt;

use console::style;

/// What happened during one pass of the outer extraction loop.
#[derive(Debug, Clone, Copy)]
pub struct IterationRecord {
    /// Whether `compute_g` found any viable DP cell at all.
    pub touched: bool,
    /// The `log10(NFA)` of the trajectory chosen this iteration, if any
    /// was accepted (`None` both when the table was empty and when the
    /// best candidate exceeded the threshold).
    pub chosen_log_nfa: Option<f64>,
    /// Number of steps of the accepted trajectory.
    pub trajectory_len: Option<usize>,
}

impl fmt::Display for IterationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.chosen_log_nfa, self.trajectory_len) {
            (Some(lnfa), Some(len)) => write!(
                f,
                "{} trajectory of {} points, {}",
                style("extracted").green(),
                len,
                style(format!("log_NFA = {:.4}", lnfa)).dim()
            ),
            _ if !self.touched => write!(f, "{}", style("DP table empty, stopping").yellow()),
            _ => write!(f, "{}", style("best candidate exceeds threshold, stopping").yellow()),
        }
    }
}

/// The full record of a solve: every iteration in order.
#[derive(Debug, Clone, Default)]
pub struct SolveJournal {
    records: Vec<IterationRecord>,
}

impl SolveJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: IterationRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[IterationRecord] {
        &self.records
    }

    pub fn trajectories_found(&self) -> usize {
        self.records.iter().filter(|r| r.chosen_log_nfa.is_some()).count()
    }
}

impl fmt::Display for SolveJournal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, record) in self.records.iter().enumerate() {
            writeln!(f, "{:>4}: {}", i, record)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_only_accepted_iterations() {
        let mut journal = SolveJournal::new();
        journal.push(IterationRecord { touched: true, chosen_log_nfa: Some(-1.0), trajectory_len: Some(4) });
        journal.push(IterationRecord { touched: true, chosen_log_nfa: None, trajectory_len: None });
        assert_eq!(journal.trajectories_found(), 1);
        assert_eq!(journal.records().len(), 2);
    }
}
