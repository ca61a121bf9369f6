pub mod datasource;
pub mod executor;
pub mod generator;
pub mod postgres;
