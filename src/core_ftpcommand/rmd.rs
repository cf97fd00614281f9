use crate::core_ftpcommand::reply::Reply;
use crate::core_ftpcommand::is_file_name_valid;
use crate::session::Session;
use tokio::fs;

/// Handles the RMD (and XRMD) FTP command.
pub async fn handle_rmd_command(session: &mut Session, arg: &str) -> Result<(), std::io::Error> {
    if !is_file_name_valid(arg) {
        return session.send(Reply::IllegalArgument(arg.to_string())).await;
    }

    let resolved = session.resolve(arg);
    if resolved.real.is_dir() {
        match fs::remove_dir(&resolved.real).await {
            Ok(()) => session.send(Reply::DirectoryRemoved(resolved.display)).await,
            Err(_) => session.send(Reply::FileUnavailable(resolved.display)).await,
        }
    } else {
        session
            .send(Reply::DirectoryNotExists(resolved.display))
            .await
    }
}
