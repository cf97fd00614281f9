use crate::core_ftpcommand::reply::Reply;
use crate::core_ftpcommand::is_file_name_valid;
use crate::session::Session;
use tokio::fs;

/// Handles the DELE FTP command.
pub async fn handle_dele_command(session: &mut Session, arg: &str) -> Result<(), std::io::Error> {
    if !is_file_name_valid(arg) {
        return session.send(Reply::IllegalArgument(arg.to_string())).await;
    }

    let resolved = session.resolve(arg);
    if resolved.real.is_file() {
        match fs::remove_file(&resolved.real).await {
            Ok(()) => session.send(Reply::FileRemoved(resolved.display)).await,
            Err(_) => session.send(Reply::FileUnavailable(resolved.display)).await,
        }
    } else {
        session.send(Reply::FileNotExists(resolved.display)).await
    }
}
