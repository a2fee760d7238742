//! Clap derive structures for the `ash` binary.
//!
//! The shell takes no subcommands: every flag here adjusts how the session
//! connects, and everything else happens at the prompt.

use std::path::PathBuf;

use clap::Parser;

/// ash -- interactive shell for Ansible Automation Platform
#[derive(Debug, Parser)]
#[command(
    name = "ash",
    version,
    about = "Interactive shell for Ansible Automation Platform",
    long_about = "Browse job templates, projects, inventories and jobs of an\n\
        Ansible Automation Platform controller, launch templates with their\n\
        surveys, and follow job output from a context-aware prompt."
)]
pub struct Cli {
    /// Configuration file [default: <data dir>/ash/config.yml]
    #[arg(long, env = "ASH_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Cache database [default: <data dir>/ash/cache.db]
    #[arg(long, value_name = "PATH")]
    pub cache: Option<PathBuf>,

    /// Platform URL (overrides base_url)
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// API token (overrides every configured source)
    #[arg(long, value_name = "TOKEN")]
    pub token: Option<String>,

    /// API prefix, e.g. /api/controller/v2/
    #[arg(long, value_name = "PATH")]
    pub api_path: Option<String>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Verify TLS certificates
    #[arg(long)]
    pub secure: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,
}
