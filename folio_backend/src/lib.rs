pub mod api;
pub mod bootstrap;
pub mod config;
pub mod database;
pub mod error;
pub mod files;
pub mod importer;
pub mod node;
pub mod notes;
pub mod recent;
pub mod remote;
pub mod showcase;
pub mod site;
pub mod telemetry;
pub mod todos;
pub mod utils;
