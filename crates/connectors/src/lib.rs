pub mod config;
pub mod datasource;
pub mod error;
pub mod logging;
pub mod rest;
pub mod sql;
