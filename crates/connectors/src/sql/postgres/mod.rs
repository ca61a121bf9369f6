pub mod executor;
pub mod params;
pub mod row;
pub(crate) mod utils;
