use crate::core_ftpcommand::reply::Reply;
use crate::session::Session;
use chrono::{DateTime, NaiveDateTime, Utc};
use filetime::{set_file_mtime, FileTime};
use log::{error, info};

/// Handles the MDTM FTP command.
///
/// With one argument it reports the file's modification time as
/// `YYYYMMDDhhmmss`; with two it sets the modification time to the typed
/// timestamp first.
///
/// # Arguments
///
/// * `session` - The session state of this control connection.
/// * `arg` - `<File>` or `<Timestamp> <File>`.
///
/// # Returns
///
/// Result<(), std::io::Error> indicating the success or failure of the operation.
pub async fn handle_mdtm_command(session: &mut Session, arg: &str) -> Result<(), std::io::Error> {
    if arg.is_empty() {
        return session.send(Reply::IllegalArgument(arg.to_string())).await;
    }

    let parts: Vec<&str> = arg.splitn(2, ' ').collect();
    let looks_like_stamp = parts.len() == 2
        && parts[0].len() == 14
        && parts[0].chars().all(|c| c.is_ascii_digit());

    if looks_like_stamp {
        let Ok(stamp) = NaiveDateTime::parse_from_str(parts[0], "%Y%m%d%H%M%S") else {
            return session.send(Reply::IllegalArgument(arg.to_string())).await;
        };
        let resolved = session.resolve(parts[1].trim());
        if !resolved.real.exists() {
            return session.send(Reply::FileNotExists(resolved.display)).await;
        }
        let mtime = FileTime::from_unix_time(stamp.and_utc().timestamp(), 0);
        match set_file_mtime(&resolved.real, mtime) {
            Ok(()) => {
                info!("Modification time of {} set to {}", resolved.display, parts[0]);
                session.send(Reply::ModificationTimeSet).await
            }
            Err(e) => {
                error!(
                    "Failed to set modification time for {}: {}",
                    resolved.real.display(),
                    e
                );
                session.send(Reply::FileUnavailable(resolved.display)).await
            }
        }
    } else {
        let resolved = session.resolve(arg);
        match resolved.real.metadata().and_then(|m| m.modified()) {
            Ok(modified) => {
                let modified: DateTime<Utc> = modified.into();
                session
                    .send(Reply::ModificationTime(
                        modified.format("%Y%m%d%H%M%S").to_string(),
                    ))
                    .await
            }
            Err(_) => session.send(Reply::FileNotExists(resolved.display)).await,
        }
    }
}
