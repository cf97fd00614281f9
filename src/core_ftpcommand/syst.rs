use crate::core_ftpcommand::reply::Reply;
use crate::session::Session;

/// Handles the SYST FTP command.
pub async fn handle_syst_command(session: &mut Session) -> Result<(), std::io::Error> {
    session
        .send(Reply::System(std::env::consts::OS.to_string()))
        .await
}
