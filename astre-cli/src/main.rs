//! The ASTRE command-line front end: reads a `PointsDesc` file, runs the
//! requested solver variant, and writes back a `PointsDesc` carrying a
//! trajectory-id column plus one `traj:<id>:lNFA` header per extracted
//! trajectory (spec §6.3). Ported from `astre_naive.py`'s `__main__`
//! block.

use std::process::ExitCode;

use console::style;
use structopt::StructOpt;

use astre_cli::{CliError, Opts, PointsDesc, Progress, SolverKind};
use astre_solver::{HolesSolver, NoholesSolver};

fn main() -> ExitCode {
    let opts = Opts::from_args();
    match run(opts) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {}", style("error:").red().bold(), err);
            ExitCode::FAILURE
        }
    }
}

fn run(opts: Opts) -> Result<(), CliError> {
    let points = PointsDesc::from_path(&opts.input)?;
    let sequence = points.sequence()?;

    let progress = Progress::start(opts.solver.name());
    let (trajectories, journal) = match opts.solver {
        SolverKind::Noholes => NoholesSolver::new(&sequence).solve(opts.eps)?,
        SolverKind::Holes => HolesSolver::new(&sequence).solve(opts.eps)?,
    };
    progress.finish(trajectories.len());

    for (i, record) in journal.records().iter().enumerate() {
        progress.println(&format!("{:>4}: {}", i, record));
    }

    let mut out = points.with_trajectory_column();
    for (id, trajectory) in trajectories.iter().enumerate() {
        out.stamp_trajectory(id, trajectory);
    }
    out.save(&opts.output)?;

    Ok(())
}
