#![forbid(unsafe_code)]

pub mod applier;
pub mod cli;
pub mod commands;
pub mod config;
pub mod daemon;
pub mod error;
pub mod json_file;
pub mod logging;
pub mod page_range;
pub mod picture;
pub mod scheduler;
pub mod services;
pub mod settings;
pub mod source;
pub mod store;
pub mod updater;
pub mod wake;
