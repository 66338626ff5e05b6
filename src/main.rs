use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;

use routecraft_api::routes;
use routecraft_api::services::route_engine::RoutePlanner;

const HOST: &str = "0.0.0.0";
const PORT: u16 = 8080;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    if cfg!(debug_assertions) {
        dotenv::dotenv().ok();
    }

    let host = std::env::var("HOST").unwrap_or_else(|_| HOST.to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| PORT.to_string())
        .parse()
        .unwrap_or(PORT);

    let planner = RoutePlanner::from_env();
    log::info!("Route planner configured");
    log::info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(Cors::permissive())
            .app_data(web::Data::new(planner.clone()))
            .route("/health", web::get().to(routes::health::health_check))
            .service(web::scope("/api").service(
                web::scope("/routes").route("/generate", web::post().to(routes::route_plan::generate)),
            ))
    })
    .bind((host, port))?
    .run()
    .await
}
