use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "fcfs-claims")]
#[command(about = "Run a topic-claim scenario: groups race for faculty/topic slots, FCFS")]
pub struct CliConfig {
    /// Scenario TOML (catalog, group roster, submissions)
    #[arg(long, default_value = "./scenario.toml")]
    pub scenario: PathBuf,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}
