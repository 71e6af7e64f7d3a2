use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "ctsentinel", version, about = "CT-driven phishing-domain hunter for Thai financial brands")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to a TargetConfig TOML file (defaults to a bundled demo config).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Monitor the live Certificate Transparency firehose.
    Monitor {
        /// Seconds between printed StatsSnapshot lines.
        #[arg(long, default_value_t = 10)]
        stats_interval: u64,
    },
    /// Generate and resolve every permutation of a brand label.
    Scan {
        target: String,
        /// Escalate the top N registered candidates through layers 2-3.
        #[arg(long, default_value_t = 0)]
        escalate: usize,
    },
    /// Generate permutations for a brand label without resolving them.
    Permutations { target: String },
    /// Cheap substring check of a single fqdn against the configured brands.
    QuickCheck { fqdn: String },
    /// Full three-layer analysis of a single fqdn.
    Analyze {
        fqdn: String,
        #[arg(long)]
        target: Option<String>,
    },
}
