use crate::core_ftpcommand::listing::{collect_dir_entries, format_unix_line};
use crate::core_ftpcommand::reply::Reply;
use crate::session::Session;

/// Handles the STAT FTP command.
///
/// Without an argument it reports either the progress of the running
/// transfer or a plain system status; with an argument it sends the
/// listing over the control channel, data connection untouched.
pub async fn handle_stat_command(session: &mut Session, arg: &str) -> Result<(), std::io::Error> {
    if arg.is_empty() {
        return match &session.transfer {
            Some(handle) if !handle.is_finished() => {
                session
                    .send(Reply::TransferStatus {
                        bytes: handle.bytes_processed(),
                        error: handle.has_error(),
                    })
                    .await
            }
            _ => session.send(Reply::SystemStatus).await,
        };
    }

    let resolved = session.resolve(arg);
    let entries = match collect_dir_entries(&resolved.real) {
        Ok(Some(entries)) => entries,
        _ => return session.send(Reply::FileNotExists(resolved.display)).await,
    };

    session.send(Reply::OpenConnForList).await?;
    for (name, metadata) in &entries {
        session.send_line(&format_unix_line(name, metadata)).await?;
    }
    session.send(Reply::TransferCompleted).await
}
