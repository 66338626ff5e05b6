pub mod clustering_service;
pub mod distance_service;
pub mod route_engine;
pub mod scoring;
