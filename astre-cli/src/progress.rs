//! Progress reporting: ambient only, per spec §5 — never consulted by the
//! solver for its results, only used by the CLI to show that it is alive
//! while the outer loop grinds through a DP fill.
//!
//! Shaped the same way the teacher workspace's own `Progress` type wraps
//! `indicatif::MultiProgress` with a couple of named styles.

use indicatif::{ProgressBar, ProgressStyle};

pub struct Progress {
    spinner: ProgressBar,
}

impl Progress {
    /// Starts a ticking spinner. `solver_name` is folded into the
    /// message so a run with `--solver holes` reads differently from one
    /// with `--solver noholes`.
    pub fn start(solver_name: &str) -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
                .template("{spinner.green} {msg}"),
        );
        spinner.set_message(format!("extracting trajectories ({})", solver_name).as_str());
        spinner.enable_steady_tick(120);
        Self { spinner }
    }

    /// Prints a line above the spinner without disturbing it.
    pub fn println(&self, msg: &str) {
        self.spinner.println(msg);
    }

    pub fn finish(&self, trajectory_count: usize) {
        self.spinner
            .finish_with_message(format!("extracted {} trajectories", trajectory_count).as_str());
    }
}
