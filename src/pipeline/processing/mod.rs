// Cleaning stages, in the order the pipeline runs them

pub mod prune;
pub mod extract;
pub mod coerce;
pub mod normalize;
pub mod quality_gate;
pub mod finalize;
