pub mod health;
pub mod route_plan;
