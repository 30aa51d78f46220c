pub mod authentication;
pub mod configuration;
pub mod domain;
pub mod guards;
pub mod persistence;
pub mod routes;
pub mod services;
pub mod startup;
pub mod telemetry;
pub mod utils;
