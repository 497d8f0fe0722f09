pub mod app_state;
pub mod config;
pub mod error;
pub mod gameweek;
pub mod http_client;
pub mod league_api;
pub mod refresh;
pub mod resolver;
pub mod schedule_cache;
pub mod schedule_fetch;
pub mod store;
pub mod telemetry;
