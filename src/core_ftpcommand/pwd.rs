use crate::core_ftpcommand::reply::Reply;
use crate::session::Session;

/// Handles the PWD (and XPWD) FTP command.
pub async fn handle_pwd_command(session: &mut Session) -> Result<(), std::io::Error> {
    let current = session.current_dir.clone();
    session.send(Reply::CurrentDir(current)).await
}
