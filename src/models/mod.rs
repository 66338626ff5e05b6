pub mod activity;
pub mod location;
pub mod plan;
