pub mod decision;
pub mod messaging;
pub mod repositories;
