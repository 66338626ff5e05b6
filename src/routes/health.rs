use actix_web::{HttpResponse, Responder};
use serde::Serialize;
use std::env;

#[derive(Serialize)]
struct HealthStatus {
    status: String,
    environment: String,
    version: String,
}

pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(HealthStatus {
        status: "ok".to_string(),
        environment: env::var("RUST_ENV").unwrap_or("development".to_string()),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
