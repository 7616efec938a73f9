pub mod generator;
pub mod matcher;
pub mod sky;
