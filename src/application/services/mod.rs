pub mod decision;
pub mod delivery;
pub mod outbound;
