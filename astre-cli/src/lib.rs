//! The ASTRE host collaborator: the `DescFile`/`PointsDesc` text format,
//! CLI configuration, and progress reporting (spec §6, §9, §10). Depends
//! on `astre-solver` for the actual extraction.

pub mod descfile;
pub mod error;
pub mod opts;
pub mod pointsdesc;
pub mod progress;

pub use descfile::DescFile;
pub use error::{CliError, Result};
pub use opts::{Opts, SolverKind};
pub use pointsdesc::PointsDesc;
pub use progress::Progress;
