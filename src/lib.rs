pub mod api;
pub mod config;
pub mod error;
pub mod estimation;
pub mod features;
pub mod geo;
pub mod logging;
pub mod regressor;
pub mod services;
pub mod state;
pub mod training;
pub mod trip;
