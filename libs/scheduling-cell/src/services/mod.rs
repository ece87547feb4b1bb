pub mod overlap;
pub mod planner;

pub use overlap::OverlapValidator;
pub use planner::AvailabilityPlanner;
