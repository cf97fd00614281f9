use crate::core_ftpcommand::reply::Reply;
use crate::session::Session;
use log::info;
use tokio::fs;

/// Handles the RNTO (Rename To) FTP command.
///
/// Requires a pending RNFR; a target that already exists is a fixed error,
/// there is no overwrite option.
pub async fn handle_rnto_command(session: &mut Session, arg: &str) -> Result<(), std::io::Error> {
    let resolved = session.resolve(arg);

    if resolved.real.exists() {
        return session
            .send(Reply::FileAlreadyExists(resolved.display))
            .await;
    }

    let Some(old_path) = session.rename_from.take() else {
        return session.send(Reply::MissingRnfrBeforeRnto).await;
    };

    match fs::rename(&old_path, &resolved.real).await {
        Ok(()) => {
            info!(
                "Renamed {} to {}",
                old_path.display(),
                resolved.real.display()
            );
            session.send(Reply::CommandOk).await
        }
        Err(_) => session.send(Reply::FileUnavailable(resolved.display)).await,
    }
}
