use crate::core_ftpcommand::reply::Reply;
use crate::session::Session;

/// Handles the NOOP FTP command.
pub async fn handle_noop_command(session: &mut Session) -> Result<(), std::io::Error> {
    session.send(Reply::CommandOk).await
}
