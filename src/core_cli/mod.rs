use clap::Parser;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "ferroftpd", about = "A nano FTP server written in Rust.")]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "")]
    pub config: String,

    /// Override the configured listen port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Override the configured sandbox root directory
    #[arg(short, long)]
    pub root: Option<String>,

    /// Fixed `user/password` account, bypassing the configured validator
    #[arg(short, long)]
    pub user: Option<String>,

    /// Enable verbose mode
    #[arg(short, long)]
    pub verbose: bool,
}
