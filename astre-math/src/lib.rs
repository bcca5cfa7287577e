//! Leaf types for the ASTRE trajectory extractor: the discrete-area table,
//! the log-combinatorial precomputations, and the point/frame/sequence
//! data model. No solving logic lives here — see `astre-solver`.

pub mod combinatorics;
pub mod discrete_area;
pub mod error;
pub mod point;

pub use combinatorics::CombinatoricTables;
pub use discrete_area::DiscreteArea;
pub use error::{AstreError, Result};
pub use point::{Coord, Frame, Point, PointSequence};
