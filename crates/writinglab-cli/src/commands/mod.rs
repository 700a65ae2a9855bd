pub mod config;
pub mod rules;
pub mod sessions;
pub mod write;
