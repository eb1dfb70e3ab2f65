//! Key bindings for reel: configuration, `input.conf` parsing, conflict
//! resolution across binding sources, and per-window key sequence matching.

pub mod config;
pub mod input;

pub use config::Config;
pub use config::ConfigError;
pub use config::ConfigOverrides;
