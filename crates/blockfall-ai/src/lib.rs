//! CPU player for the blockfall engine.
//!
//! Placements are scored by analysing the board that results from locking a
//! piece ([`BoardAnalysis`]), normalising the raw measurements into
//! [`Features`] and taking a weighted sum ([`WeightSet`]). [`TurnPlanner`]
//! enumerates every placement reachable with the inputs the engine accepts,
//! and [`CpuPlayer`] plays them against a live session at the pace of its
//! [`CpuDifficulty`].

pub use self::{
    board_analysis::*, cpu_player::*, features::*, turn_planner::*, weights::*,
};

mod board_analysis;
mod cpu_player;
mod features;
mod turn_planner;
mod weights;
