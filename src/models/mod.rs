pub mod estimate;
pub mod profile;
pub mod types;
