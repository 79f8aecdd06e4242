pub mod configuration;
pub mod console;
pub mod domain;
pub mod sendgrid_client;
pub mod telemetry;
pub mod token_resolver;
pub mod utils;
pub mod workflow;
