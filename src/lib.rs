pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod persist;
pub mod rbac;
pub mod routes;
pub mod telemetry;
