use crate::core_ftpcommand::reply::Reply;
use crate::session::{LoginStatus, Session};
use log::{info, warn};

/// Handles the USER FTP command.
///
/// Checks the user principal against the validator and, when it exists,
/// moves the session to the username-entered state and prompts for the
/// password. A USER received while already logged in first performs an
/// implicit re-initialization of the whole session, then re-evaluates.
///
/// # Arguments
///
/// * `session` - The session state of this control connection.
/// * `arg` - The user name provided by the client.
///
/// # Returns
///
/// Result<(), std::io::Error> indicating the success or failure of the operation.
pub async fn handle_user_command(session: &mut Session, arg: &str) -> Result<(), std::io::Error> {
    if arg.is_empty() {
        return session.send(Reply::IllegalArgument(arg.to_string())).await;
    }

    if session.status == LoginStatus::LoggedIn {
        info!("USER received while logged in, reinitializing the session");
        session.clear_settings().await;
    }
    session.login_attempted = true;

    if session.validator.user_exists(arg) {
        info!("Username accepted: {}, awaiting password", arg);
        session.current_user = Some(arg.to_string());
        session.status = LoginStatus::UserNameEntered;
        session.send(Reply::UserNameOk).await
    } else {
        warn!("Unknown user: {}", arg);
        session.send(Reply::NotLoggedIn).await
    }
}
