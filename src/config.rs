use chrono_tz::Tz;
use rocket::figment::Figment;
use serde::Deserialize;

/// Service settings, read from `Rocket.toml` / `ROCKET_*` env alongside Rocket's own keys.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database_path: String,
    pub pool_size: u32,
    /// IANA zone used to turn filter dates into day boundaries and to bucket daily views.
    pub timezone: String,
    pub cors_origin: String,
    pub seed_demo_data: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: "data/analytics.db".to_string(),
            pool_size: 10,
            timezone: "UTC".to_string(),
            cors_origin: "http://localhost:5173".to_string(),
            seed_demo_data: false,
        }
    }
}

impl AppConfig {
    pub fn from_figment(figment: &Figment) -> Result<Self, String> {
        let config: AppConfig = figment.extract().map_err(|e| e.to_string())?;
        config.tz()?;
        Ok(config)
    }

    pub fn tz(&self) -> Result<Tz, String> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| format!("unknown timezone '{}': {}", self.timezone, e))
    }
}

/// Resolved timezone, managed as Rocket state so handlers don't reparse it.
#[derive(Debug, Clone, Copy)]
pub struct Zone(pub Tz);
