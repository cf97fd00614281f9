use crate::core_ftpcommand::reply::Reply;
use crate::session::Session;
use log::info;

/// Handles the ABOR FTP command.
///
/// Sets the cooperative cancellation flag on the running transfer; the
/// copy task observes it within one buffer of I/O and closes the data
/// connection in its own cleanup path.
pub async fn handle_abor_command(session: &mut Session) -> Result<(), std::io::Error> {
    match &session.transfer {
        Some(handle) if !handle.is_finished() => {
            info!("Aborting the running transfer");
            handle.cancel();
            session.send(Reply::TransferCompleted).await
        }
        _ => session.send(Reply::NoTransferInProgress).await,
    }
}
