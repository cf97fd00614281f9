use crate::core_ftpcommand::listing::{collect_dir_entries, format_unix_line};
use crate::core_ftpcommand::reply::Reply;
use crate::session::Session;
use log::{error, info};
use tokio::io::AsyncWriteExt;

/// Handles the LIST FTP command.
///
/// Streams Unix-style `ls -l` lines over the data channel; `ls` option
/// arguments are ignored and treated as a listing of the current
/// directory.
pub async fn handle_list_command(session: &mut Session, arg: &str) -> Result<(), std::io::Error> {
    if !session.data.is_open() {
        return session.send(Reply::NoDataConnection).await;
    }

    let target = if arg.starts_with('-') { "" } else { arg };
    let resolved = session.resolve(target);
    let entries = match collect_dir_entries(&resolved.real) {
        Ok(Some(entries)) => entries,
        _ => return session.send(Reply::FileNotExists(resolved.display)).await,
    };

    let lines: Vec<String> = entries
        .iter()
        .map(|(name, metadata)| format_unix_line(name, metadata))
        .collect();
    send_over_data(session, lines).await
}

/// Handles the NLST FTP command: bare entry names, one per line.
pub async fn handle_nlst_command(session: &mut Session, arg: &str) -> Result<(), std::io::Error> {
    if arg.starts_with('-') {
        return session.send(Reply::IllegalArgument(arg.to_string())).await;
    }
    if !session.data.is_open() {
        return session.send(Reply::NoDataConnection).await;
    }

    let resolved = session.resolve(arg);
    let entries = match collect_dir_entries(&resolved.real) {
        Ok(Some(entries)) => entries,
        _ => return session.send(Reply::FileNotExists(resolved.display)).await,
    };

    let lines: Vec<String> = entries.into_iter().map(|(name, _)| name).collect();
    send_over_data(session, lines).await
}

/// Opens the data channel, streams the listing lines and closes it.
pub(crate) async fn send_over_data(
    session: &mut Session,
    lines: Vec<String>,
) -> Result<(), std::io::Error> {
    session.send(Reply::OpenConnForList).await?;

    let mut stream = match session.data.take_stream().await {
        Ok(Some(stream)) => stream,
        Ok(None) | Err(_) => return session.send(Reply::NoDataConnection).await,
    };

    for line in &lines {
        if let Err(e) = stream
            .write_all(format!("{}\r\n", line).as_bytes())
            .await
        {
            error!("Failed to send directory listing: {}", e);
            let _ = stream.shutdown().await;
            return session.send(Reply::AbortDataConnection).await;
        }
    }
    if let Err(e) = stream.shutdown().await {
        error!("Failed to shutdown data stream: {}", e);
    }

    info!("Directory listing sent successfully ({} entries)", lines.len());
    session.send(Reply::TransferCompleted).await
}
