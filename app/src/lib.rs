pub mod config;

pub use config::{load_settings, save_settings, CliSettings};
