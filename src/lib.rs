pub mod config;
pub mod constants;
pub mod core_auth;
pub mod core_cli;
pub mod core_ftpcommand;
pub mod core_network;
pub mod core_stream;
pub mod core_transfer;
pub mod server;
pub mod session;
