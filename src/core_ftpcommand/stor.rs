use crate::core_ftpcommand::is_file_name_valid;
use crate::core_ftpcommand::retr::file_base_name;
use crate::core_ftpcommand::reply::Reply;
use crate::core_transfer::{spawn_transfer, TransferDirection, TransferSpec};
use crate::session::{Session, TransferType};
use log::{error, info};
use rand::Rng;
use std::path::PathBuf;
use tokio::fs::OpenOptions;

/// Handles the STOR, APPE and STOU FTP commands.
///
/// `append` selects APPE semantics; `unique` selects STOU, which
/// synthesizes a fresh file name in the same directory when the typed
/// target already exists.
///
/// # Arguments
///
/// * `session` - The session state of this control connection.
/// * `arg` - The name of the file to be stored.
/// * `append` - Append to an existing file instead of replacing it.
/// * `unique` - Never overwrite: store under a synthesized unique name.
///
/// # Returns
///
/// Result<(), std::io::Error> indicating the success or failure of the operation.
pub async fn handle_stor_command(
    session: &mut Session,
    arg: &str,
    append: bool,
    unique: bool,
) -> Result<(), std::io::Error> {
    if !is_file_name_valid(arg) {
        return session.send(Reply::IllegalArgument(arg.to_string())).await;
    }
    if session.transfer_running() {
        return session.send(Reply::StillRunning).await;
    }
    if session.transfer_type == TransferType::Unknown {
        return session.send(Reply::TransferModeNotSet).await;
    }
    if !session.data.is_open() {
        return session.send(Reply::NoDataConnection).await;
    }

    let resolved = session.resolve(arg);
    let target = if unique && resolved.real.is_file() {
        unique_target(&resolved.real)
    } else {
        resolved.real.clone()
    };

    let file = match OpenOptions::new()
        .write(true)
        .create(true)
        .append(append)
        .truncate(!append)
        .open(&target)
        .await
    {
        Ok(f) => f,
        Err(e) => {
            error!("Failed to create file {}: {}", target.display(), e);
            return session.send(Reply::FileUnavailable(resolved.display)).await;
        }
    };

    let name = file_base_name(&target);
    match session.transfer_type {
        TransferType::Ascii => {
            session
                .send(Reply::OpenAsciiConnForFile(name.clone()))
                .await?
        }
        _ => session.send(Reply::OpenBinConnForFile(name.clone())).await?,
    }

    let stream = match session.data.take_stream().await {
        Ok(Some(stream)) => stream,
        Ok(None) | Err(_) => return session.send(Reply::NoDataConnection).await,
    };

    info!("Start receiving file {}", name);
    let spec = TransferSpec {
        direction: TransferDirection::Store,
        file,
        file_name: name,
        transfer_type: session.transfer_type,
        structure: session.structure,
        ascii_lf_on_disk: session.config.ascii_uses_lf(),
        buffer_size: session
            .config
            .server
            .upload_buffer_size
            .unwrap_or(crate::constants::DEFAULT_TRANSFER_BUFFER_SIZE),
    };
    session.transfer = Some(spawn_transfer(session.writer(), stream, spec));

    Ok(())
}

/// Synthesizes a name next to `path` that does not exist yet.
fn unique_target(path: &std::path::Path) -> PathBuf {
    let mut rng = rand::thread_rng();
    loop {
        let suffix: u32 = rng.gen_range(100_000..1_000_000);
        let candidate = PathBuf::from(format!("{}.{}", path.display(), suffix));
        if !candidate.exists() {
            return candidate;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_target_avoids_the_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("upload.dat");
        std::fs::write(&base, b"taken").unwrap();

        let fresh = unique_target(&base);
        assert_ne!(fresh, base);
        assert!(fresh.to_string_lossy().starts_with(&*base.to_string_lossy()));
        assert!(!fresh.exists());
    }
}
