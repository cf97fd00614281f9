use crate::core_ftpcommand::reply::Reply;
use crate::session::{LoginStatus, Session};
use log::{info, warn};

/// Handles the PASS FTP command.
///
/// On success the session is logged in; on failure it falls back to the
/// not-logged-in state and the welcome banner is resent, forcing the
/// client to start over with USER.
pub async fn handle_pass_command(session: &mut Session, arg: &str) -> Result<(), std::io::Error> {
    if arg.is_empty() {
        return session.send(Reply::IllegalArgument(arg.to_string())).await;
    }

    let user = session.current_user.clone().unwrap_or_default();
    if session.validator.credentials_valid(&user, arg) {
        info!("User {} logged in successfully", user);
        session.status = LoginStatus::LoggedIn;
        session.send(Reply::WelcomeUserLogged).await?;
        session.send(Reply::UserLogged).await
    } else {
        warn!("Wrong credentials for user {}", user);
        session.status = LoginStatus::NotLoggedIn;
        session.current_user = None;
        session.send(Reply::WrongCredentials).await?;
        session.send(Reply::Welcome).await
    }
}
