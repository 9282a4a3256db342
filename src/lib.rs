//! Solar Twin: replay historical inverter telemetry and serve short-horizon
//! AC power predictions from a pre-trained model.

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod forecast;
pub mod replay;
pub mod repo;
pub mod state;
pub mod telemetry;
