pub mod client;
pub mod config;
pub mod entities;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;
