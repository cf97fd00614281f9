use crate::core_ftpcommand::reply::Reply;
use crate::session::Session;
use log::debug;

/// Handles the RNFR (Rename From) FTP command.
///
/// Remembers the rename source for the immediately following RNTO. The
/// pending rename only survives to the very next command: the dispatch
/// loop clears it after anything other than RNFR/RNTO.
pub async fn handle_rnfr_command(session: &mut Session, arg: &str) -> Result<(), std::io::Error> {
    let resolved = session.resolve(arg);

    if resolved.real.is_file() {
        debug!("Rename started from {}", resolved.display);
        session.rename_from = Some(resolved.real);
        session.send(Reply::AwaitingContinuation).await
    } else {
        session.send(Reply::FileNotExists(resolved.display)).await
    }
}
