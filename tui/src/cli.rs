use clap::Parser;
use reel_core::ConfigOverrides;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about = "Try out reel key bindings in the terminal")]
pub struct Cli {
    /// Directory holding `config.toml`, `input.conf` and logs. Defaults to
    /// `$REEL_HOME` or `~/.reel`.
    #[arg(long = "config-home", value_name = "DIR")]
    pub config_home: Option<PathBuf>,

    /// Key bindings file to load instead of the configured one.
    #[arg(long = "conf", short = 'c', value_name = "FILE")]
    pub conf_file: Option<PathBuf>,

    /// Name of the window whose key history is tracked.
    #[arg(long = "window", short = 'w', default_value = "main")]
    pub window: String,

    /// Print every binding with its status and exit.
    #[arg(long = "list", default_value_t = false)]
    pub list: bool,
}

impl Cli {
    pub fn config_overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            reel_home: self.config_home.clone(),
            conf_file: self.conf_file.clone(),
        }
    }
}
