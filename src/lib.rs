pub mod calibration;
pub mod cli;
pub mod config;
pub mod edge;
pub mod error;
pub mod fixtures;
pub mod logging;
pub mod market;
pub mod outcome_model;
pub mod predictions;
pub mod simulation;
pub mod store;
