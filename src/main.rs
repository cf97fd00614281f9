use anyhow::{bail, Result};
use clap::Parser;
use env_logger::{Builder, Env};
use ferroftpd::config::Config;
use ferroftpd::core_auth::SimpleValidator;
use ferroftpd::core_cli::Cli;
use ferroftpd::server::FtpServer;
use std::io::Write;
use std::path::Path;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Cli::parse();

    // Initialize the logger with a custom format
    let default_filter = if args.verbose { "debug" } else { "info" };
    Builder::from_env(Env::default().default_filter_or(default_filter))
        .format(|buf, record| {
            let timestamp = buf.timestamp();
            writeln!(
                buf,
                "[{}] [{}] {}",
                timestamp,
                record.level(),
                record.args()
            )
        })
        .init();

    // Determine the default config path based on the OS
    let default_config_path = if cfg!(target_os = "windows") {
        "C:\\ferroftpd\\etc\\ferroftpd.conf"
    } else {
        "/etc/ferroftpd.conf"
    };

    // Load configuration from the TOML file
    let config_path = if args.config.is_empty() {
        default_config_path
    } else {
        args.config.as_str()
    };
    let mut config = Config::load_from_file(config_path)?;

    // CLI overrides
    if let Some(port) = args.port {
        config.server.listen_port = port;
    }
    if let Some(root) = args.root {
        config.server.chroot_dir = root;
    }

    let validator = if let Some(user_pass) = &args.user {
        let Some((user, pass)) = user_pass.split_once('/') else {
            bail!("--user must be typed as 'user/password'");
        };
        SimpleValidator::from_user_pass(user, pass)
    } else if let Some(passwd_file) = &config.server.passwd_file {
        SimpleValidator::from_passwd_file(passwd_file)?
    } else {
        SimpleValidator::from_root(Path::new(&config.server.chroot_dir))
    };

    // Run the FTP server
    let server = FtpServer::bind(config, validator).await?;
    server.start()?;
    server.run().await
}
