//! The ASTRE a-contrario single-trajectory extraction engine (spec §4-§6).
//!
//! Two solver variants share the activation mask, NFA scorer and outer
//! loop shape: [`noholes::NoholesSolver`] assumes trajectories occupy
//! consecutive frames, [`holes::HolesSolver`] additionally allows bounded
//! gaps. Both are driven by repeatedly calling `solve`, which runs the
//! whole outer loop (DP fill, minimum-NFA search, backtracking
//! extraction, deactivation) to completion and returns every trajectory
//! it found along with a [`journal::SolveJournal`] of the run.

pub mod holes;
pub mod journal;
pub mod mask;
pub mod nfa;
pub mod noholes;
pub mod trajectory;

pub use holes::HolesSolver;
pub use journal::{IterationRecord, SolveJournal};
pub use mask::ActivationMask;
pub use noholes::NoholesSolver;
pub use trajectory::{Step, StepKind, Trajectory};
