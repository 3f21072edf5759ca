//! Leaf health analysis, farming chat and PDF reports for the Kalpataru
//! web app.
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
