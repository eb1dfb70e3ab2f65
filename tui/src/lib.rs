//! Terminal front end for the reel key binding engine.

pub mod app;
pub mod cli;
pub mod key_event;
pub mod logging;
pub mod window_input;

pub use app::run_main;
pub use cli::Cli;
pub use key_event::key_name_from_event;
pub use window_input::KeyOutcome;
pub use window_input::WindowKeyInput;
