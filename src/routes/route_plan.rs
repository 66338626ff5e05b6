use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;

use crate::models::activity::Activity;
use crate::models::location::GeoLocation;
use crate::services::route_engine::RoutePlanner;

/*
    /api/routes/generate
*/
#[derive(Debug, Deserialize)]
pub struct RoutePlanRequest {
    pub activities: Vec<Activity>,
    #[serde(default)]
    pub locations: Vec<GeoLocation>,
    pub duration_days: u32,
}

/// Stateless, idempotent generation endpoint: same body, same plan.
pub async fn generate(
    body: web::Json<RoutePlanRequest>,
    planner: web::Data<RoutePlanner>,
) -> impl Responder {
    let request = body.into_inner();

    match planner.generate_route_plan(&request.activities, &request.locations, request.duration_days)
    {
        Ok(result) => {
            if !result.unschedulable.is_empty() {
                log::warn!(
                    "{} of {} activities could not be scheduled",
                    result.unschedulable.len(),
                    request.activities.len()
                );
            }
            HttpResponse::Ok().json(result)
        }
        Err(err) => {
            log::error!("Route generation rejected: {}", err);
            HttpResponse::BadRequest().json(json!({ "error": err.to_string() }))
        }
    }
}
