pub mod configuration;
pub mod digest;
pub mod domain;
pub mod email_client;
pub mod github_client;
pub mod middleware;
pub mod registry;
pub mod routes;
pub mod startup;
pub mod telemetry;
pub mod utils;
pub mod verification;
