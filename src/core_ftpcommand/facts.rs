use crate::core_ftpcommand::listing::{collect_dir_entries, format_fact_line};
use crate::core_ftpcommand::reply::Reply;
use crate::session::Session;
use log::error;
use tokio::io::AsyncWriteExt;

/// Handles the MLST FTP command.
///
/// Emits the fact line of a single entry over the control channel,
/// wrapped in the 250- / 250 pair.
pub async fn handle_mlst_command(session: &mut Session, arg: &str) -> Result<(), std::io::Error> {
    let resolved = session.resolve(arg);
    let metadata = match resolved.real.metadata() {
        Ok(metadata) => metadata,
        Err(_) => return session.send(Reply::FileNotExists(resolved.display)).await,
    };

    let entry_type = if metadata.is_dir() { "dir" } else { "file" };
    let line = format_fact_line(&resolved.display, &metadata, &session.language, entry_type);

    session.send(Reply::FileFactsBegin).await?;
    session.send_line(&format!(" {}", line)).await?;
    session.send(Reply::FileFactsEnd).await
}

/// Handles the MLSD FTP command.
///
/// Streams one fact line per entry over the data channel, preceded by the
/// `cdir` pseudo-entry and, unless the listing is of the sandbox root, the
/// `pdir` pseudo-entry.
pub async fn handle_mlsd_command(session: &mut Session, arg: &str) -> Result<(), std::io::Error> {
    if !session.data.is_open() {
        return session.send(Reply::NoDataConnection).await;
    }

    let resolved = session.resolve(arg);
    if !resolved.real.is_dir() {
        return session
            .send(Reply::DirectoryNotExists(resolved.display))
            .await;
    }
    let entries = match collect_dir_entries(&resolved.real) {
        Ok(Some(entries)) => entries,
        _ => {
            return session
                .send(Reply::DirectoryNotExists(resolved.display))
                .await
        }
    };

    let dir_metadata = match resolved.real.metadata() {
        Ok(metadata) => metadata,
        Err(_) => {
            return session
                .send(Reply::DirectoryNotExists(resolved.display))
                .await
        }
    };

    let mut lines = Vec::with_capacity(entries.len() + 2);
    lines.push(format_fact_line(".", &dir_metadata, &session.language, "cdir"));
    if resolved.display != "/" {
        lines.push(format_fact_line("..", &dir_metadata, &session.language, "pdir"));
    }
    for (name, metadata) in &entries {
        let entry_type = if metadata.is_dir() { "dir" } else { "file" };
        lines.push(format_fact_line(name, metadata, &session.language, entry_type));
    }

    session.send(Reply::OpenBinConnForList).await?;

    let mut stream = match session.data.take_stream().await {
        Ok(Some(stream)) => stream,
        Ok(None) | Err(_) => return session.send(Reply::NoDataConnection).await,
    };
    for line in &lines {
        if let Err(e) = stream.write_all(format!("{}\r\n", line).as_bytes()).await {
            error!("Failed to send fact listing: {}", e);
            let _ = stream.shutdown().await;
            return session.send(Reply::AbortDataConnection).await;
        }
    }
    if let Err(e) = stream.shutdown().await {
        error!("Failed to shutdown data stream: {}", e);
    }

    session.send(Reply::TransferCompleted).await
}
