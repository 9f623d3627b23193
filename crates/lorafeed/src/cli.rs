//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// Headless LoRa field gateway: listens on a radio and forwards sensor
/// readings to an Adafruit IO feed group.
#[derive(Parser, Debug)]
#[command(name = "lorafeed", version, about)]
pub struct Cli {
    /// Configuration file (defaults to the platform config directory)
    #[arg(short, long, env = "LORAFEED_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn verbosity_counts_flags() {
        let cli = Cli::parse_from(["lorafeed", "-vv", "--config", "/tmp/gw.json"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/gw.json")));
        assert!(cli.log_file.is_none());
    }
}
