use crate::core_ftpcommand::command::FeatureTag;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize)]
pub struct ServerConfig {
    pub listen_port: u16,
    /// Fixed data port for passive listeners (0 = ephemeral).
    #[serde(default)]
    pub data_port: u16,
    /// Public address reported in PASV replies; defaults to the control
    /// socket's local address.
    pub pasv_address: Option<String>,
    pub chroot_dir: String,
    /// Line convention of ASCII-mode files on disk: "crlf" or "lf".
    pub ascii_line_ending: Option<String>,
    /// Optional `user:bcrypt-hash` passwd file; without it one account per
    /// first-level subdirectory of the chroot is derived.
    pub passwd_file: Option<String>,
    pub upload_buffer_size: Option<usize>, // Optional to allow default value
    pub download_buffer_size: Option<usize>, // Optional to allow default value
}

#[derive(Debug, Deserialize, Serialize)]
pub struct FeatureConfig {
    #[serde(default = "default_true")]
    pub rfc2428: bool,
    #[serde(default = "default_true")]
    pub rfc2640: bool,
    #[serde(default = "default_true")]
    pub rfc3659: bool,
    /// Mnemonics that are administratively disabled.
    #[serde(default)]
    pub blacklist: Vec<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub features: FeatureConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_port: 21,
            data_port: 0,
            pasv_address: None,
            chroot_dir: String::from("/var/ftp"),
            ascii_line_ending: Some(String::from("lf")),
            passwd_file: None,
            upload_buffer_size: Some(256 * 1024), // Default 256 KB
            download_buffer_size: Some(128 * 1024), // Default 128 KB
        }
    }
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            rfc2428: true,
            rfc2640: true,
            rfc3659: true,
            blacklist: Vec::new(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            features: FeatureConfig::default(),
        }
    }
}

impl FeatureConfig {
    /// RFC 2228 (security extensions) has no enable switch: those commands
    /// are always rejected as unsupported.
    pub fn enabled(&self, tag: FeatureTag) -> bool {
        match tag {
            FeatureTag::Rfc2228 => false,
            FeatureTag::Rfc2428 => self.rfc2428,
            FeatureTag::Rfc2640 => self.rfc2640,
            FeatureTag::Rfc3659 => self.rfc3659,
        }
    }
}

impl Config {
    pub fn load_from_file(path: &str) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path))?;
        let mut config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse configuration file: {}", path))?;

        // Set defaults if not specified
        if config.server.upload_buffer_size.is_none() {
            config.server.upload_buffer_size = Some(256 * 1024);
        }
        if config.server.download_buffer_size.is_none() {
            config.server.download_buffer_size = Some(128 * 1024);
        }

        Ok(config)
    }

    pub fn is_blacklisted(&self, mnemonic: &str) -> bool {
        self.features
            .blacklist
            .iter()
            .any(|m| m.eq_ignore_ascii_case(mnemonic))
    }

    /// True when ASCII-mode files on disk use bare LF line endings.
    pub fn ascii_uses_lf(&self) -> bool {
        !matches!(
            self.server.ascii_line_ending.as_deref(),
            Some("crlf") | Some("CRLF")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_config_with_defaults() {
        let config: Config = toml::from_str(
            r#"
            [server]
            listen_port = 2121
            chroot_dir = "/srv/ftp"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.listen_port, 2121);
        assert_eq!(config.server.data_port, 0);
        assert!(config.features.rfc2428);
        assert!(config.features.rfc3659);
        assert!(config.features.blacklist.is_empty());
    }

    #[test]
    fn blacklist_lookup_is_case_insensitive() {
        let config: Config = toml::from_str(
            r#"
            [server]
            listen_port = 21
            chroot_dir = "/srv/ftp"

            [features]
            blacklist = ["site", "MKD"]
            "#,
        )
        .unwrap();
        assert!(config.is_blacklisted("SITE"));
        assert!(config.is_blacklisted("mkd"));
        assert!(!config.is_blacklisted("LIST"));
    }

    #[test]
    fn rfc2228_is_never_enabled() {
        let config = Config::default();
        assert!(!config.features.enabled(FeatureTag::Rfc2228));
        assert!(config.features.enabled(FeatureTag::Rfc2428));
    }
}
