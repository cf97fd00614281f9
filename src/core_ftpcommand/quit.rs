use crate::core_ftpcommand::reply::Reply;
use crate::session::Session;
use log::info;

/// Handles the QUIT FTP command.
///
/// Only sends the closing reply; the dispatch loop terminates afterwards
/// because of the command's exit flag.
pub async fn handle_quit_command(session: &mut Session) -> Result<(), std::io::Error> {
    info!("Client quitting the session");
    session.send(Reply::ClosingConn).await
}

/// Handles the REIN FTP command: full session reset without closing the
/// control socket.
pub async fn handle_rein_command(session: &mut Session) -> Result<(), std::io::Error> {
    session.clear_settings().await;
    session.send(Reply::ConnectionReset).await
}
