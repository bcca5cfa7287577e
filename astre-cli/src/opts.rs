//! Command-line configuration (spec §9): the sole configuration surface,
//! matching the teacher workspace's own `structopt::StructOpt` derive.

use std::path::PathBuf;
use std::str::FromStr;

use structopt::StructOpt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverKind {
    Noholes,
    Holes,
}

impl FromStr for SolverKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "noholes" => Ok(SolverKind::Noholes),
            "holes" => Ok(SolverKind::Holes),
            other => Err(format!("unknown solver `{}`, expected `noholes` or `holes`", other)),
        }
    }
}

impl SolverKind {
    pub fn name(&self) -> &'static str {
        match self {
            SolverKind::Noholes => "noholes",
            SolverKind::Holes => "holes",
        }
    }
}

#[derive(Debug, StructOpt)]
#[structopt(name = "astre", about = "ASTRE a-contrario single-trajectory extraction")]
pub struct Opts {
    /// The input PointsDesc file.
    #[structopt(parse(from_os_str))]
    pub input: PathBuf,

    /// The output PointsDesc file; one trajectory-id column and one
    /// `traj:<id>:lNFA` header per extracted trajectory are added.
    #[structopt(parse(from_os_str))]
    pub output: PathBuf,

    /// Maximal log10(NFA) for a trajectory to be considered meaningful.
    #[structopt(short = "e", long = "eps", default_value = "0.0")]
    pub eps: f64,

    /// Which solver variant to run.
    #[structopt(long = "solver", default_value = "noholes")]
    pub solver: SolverKind,
}
