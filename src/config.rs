use crate::cli::{Args, ColorChoice};

/// Settings resolved from the command line and the terminal.
#[derive(Debug, Clone, Copy)]
pub struct AppConfig {
    pub color_enabled: bool,
    pub verbose: bool,
    pub dump_tokens: bool,
}

impl AppConfig {
    pub fn from_args(args: &Args) -> Self {
        let color_enabled = match args.color {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => atty::is(atty::Stream::Stderr) && atty::is(atty::Stream::Stdout),
        };

        AppConfig {
            color_enabled,
            verbose: args.verbose,
            dump_tokens: args.tokens,
        }
    }

    /// Default log filter when `RUST_LOG` is unset.
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "warn"
        }
    }
}
