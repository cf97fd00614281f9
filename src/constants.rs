// src/constants.rs

pub const SERVER_NAME: &str = "ferroftpd";
pub const DEFAULT_TRANSFER_BUFFER_SIZE: usize = 8192;
/// Languages the LANG command may negotiate; the first one is the default.
pub const SUPPORTED_LANGUAGES: &[&str] = &["en", "fr"];
