#[macro_use]
extern crate rocket;

use std::fmt::Display;

use rocket::figment::Figment;
use rocket::serde::json::Json;
use rocket::{Build, Request, Rocket};
use serde_json::{json, Value};

mod boot;
mod config;
mod cors;
mod dates;
mod db;
mod error;
mod models;
mod routes;
mod seed;


use config::{AppConfig, Zone};
use db::DbPool;

#[catch(400)]
fn bad_request() -> Json<Value> {
    Json(json!({ "error": "Malformed request" }))
}

#[catch(404)]
fn not_found(req: &Request) -> Json<Value> {
    Json(json!({ "error": format!("No route for {}", req.uri().path()) }))
}

#[catch(422)]
fn unprocessable() -> Json<Value> {
    Json(json!({ "error": "Request body is missing required fields or has invalid values" }))
}

#[catch(500)]
fn server_error() -> Json<Value> {
    Json(json!({ "error": "Internal server error" }))
}

/// Wires state, fairings, routes and catchers onto a Rocket instance.
pub fn app(figment: Figment, pool: DbPool, config: AppConfig, zone: Zone) -> Rocket<Build> {
    rocket::custom(figment)
        .attach(cors::Cors::new(&config.cors_origin))
        .manage(pool)
        .manage(zone)
        .manage(config)
        .mount("/", cors::routes())
        .mount(routes::ARTICLES_BASE, routes::articles::routes())
        .mount(routes::ANALYTICS_BASE, routes::analytics::routes())
        .mount(routes::API_BASE, routes::health::routes())
        .register("/", catchers![bad_request, not_found, unprocessable, server_error])
}

fn fatal(context: &str, err: impl Display) -> ! {
    log::error!("{}: {}", context, err);
    std::process::exit(1)
}

#[launch]
fn rocket() -> _ {
    env_logger::init();

    let figment = rocket::Config::figment();
    let config = AppConfig::from_figment(&figment)
        .unwrap_or_else(|e| fatal("Invalid configuration", e));
    let zone = config
        .tz()
        .map(Zone)
        .unwrap_or_else(|e| fatal("Invalid configuration", e));

    boot::run(&config);

    let pool = db::init_pool(&config.database_path, config.pool_size)
        .unwrap_or_else(|e| fatal("Failed to initialize database pool", e));
    db::run_migrations(&pool).unwrap_or_else(|e| fatal("Failed to run database migrations", e));

    if config.seed_demo_data {
        let plan = seed::SeedPlan::default();
        if let Err(e) = seed::seed_demo_data(&pool, &mut rand::thread_rng(), &plan) {
            log::error!("Demo data generation failed: {}", e);
        }
    }

    log::info!(
        "Serving analytics API at {} (database: {}, timezone: {})",
        routes::API_BASE,
        config.database_path,
        config.timezone
    );

    app(figment, pool, config, zone)
}
