use crate::core_ftpcommand::reply::Reply;
use crate::session::Session;
use log::debug;

/// Handles the OPTS FTP command.
///
/// The only option the server knows is `UTF8 {ON|OFF}`.
pub async fn handle_opts_command(session: &mut Session, arg: &str) -> Result<(), std::io::Error> {
    let parts: Vec<&str> = arg.split_whitespace().collect();
    match parts.as_slice() {
        [feature, value] if feature.eq_ignore_ascii_case("UTF8") => {
            if value.eq_ignore_ascii_case("ON") {
                session.utf8_enabled = true;
            } else if value.eq_ignore_ascii_case("OFF") {
                session.utf8_enabled = false;
            } else {
                return session.send(Reply::IllegalArgument(arg.to_string())).await;
            }
            debug!("UTF8 mode set to {}", session.utf8_enabled);
            session.send(Reply::CommandOk).await
        }
        _ => session.send(Reply::IllegalArgument(arg.to_string())).await,
    }
}
