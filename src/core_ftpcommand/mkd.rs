use crate::core_ftpcommand::reply::Reply;
use crate::core_ftpcommand::is_file_name_valid;
use crate::session::Session;
use log::warn;
use tokio::fs;

/// Handles the MKD (and XMKD) FTP command.
///
/// Creates a new directory within the sandbox and reports its virtual
/// path back to the client.
pub async fn handle_mkd_command(session: &mut Session, arg: &str) -> Result<(), std::io::Error> {
    if !is_file_name_valid(arg) {
        return session.send(Reply::IllegalArgument(arg.to_string())).await;
    }

    let resolved = session.resolve(arg);
    match fs::create_dir(&resolved.real).await {
        Ok(()) => session.send(Reply::DirectoryCreated(resolved.display)).await,
        Err(e) => {
            warn!("Failed to create directory {}: {}", resolved.real.display(), e);
            session
                .send(Reply::DirectoryNotCreated(resolved.display))
                .await
        }
    }
}
