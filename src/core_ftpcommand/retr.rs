use crate::core_ftpcommand::is_file_name_valid;
use crate::core_ftpcommand::reply::Reply;
use crate::core_transfer::{spawn_transfer, TransferDirection, TransferSpec};
use crate::session::{Session, TransferType};
use log::{error, info};
use tokio::fs::File;

/// Handles the RETR (Retrieve) FTP command.
///
/// Validates the file before touching the data channel, rejects the
/// request while another transfer is still running, then hands the copy
/// to the transfer engine. The engine reports the detailed completion
/// reply asynchronously.
///
/// # Arguments
///
/// * `session` - The session state of this control connection.
/// * `arg` - The name of the file to retrieve.
///
/// # Returns
///
/// Result<(), std::io::Error> indicating the success or failure of the operation.
pub async fn handle_retr_command(session: &mut Session, arg: &str) -> Result<(), std::io::Error> {
    if !is_file_name_valid(arg) {
        return session.send(Reply::IllegalArgument(arg.to_string())).await;
    }

    let resolved = session.resolve(arg);
    if !resolved.real.is_file() {
        return session.send(Reply::FileNotExists(resolved.display)).await;
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

    let file = match File::open(&resolved.real).await {
        Ok(f) => f,
        Err(e) => {
            error!("Could not open {}: {}", resolved.real.display(), e);
            return session.send(Reply::FileNotExists(resolved.display)).await;
        }
    };

    let name = file_base_name(&resolved.real);
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

    info!("Starting file transmission of {}", name);
    let spec = TransferSpec {
        direction: TransferDirection::Retrieve,
        file,
        file_name: name,
        transfer_type: session.transfer_type,
        structure: session.structure,
        ascii_lf_on_disk: session.config.ascii_uses_lf(),
        buffer_size: session
            .config
            .server
            .download_buffer_size
            .unwrap_or(crate::constants::DEFAULT_TRANSFER_BUFFER_SIZE),
    };
    session.transfer = Some(spawn_transfer(session.writer(), stream, spec));

    Ok(())
}

pub(crate) fn file_base_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
