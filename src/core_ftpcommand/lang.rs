use crate::constants::SUPPORTED_LANGUAGES;
use crate::core_ftpcommand::reply::Reply;
use crate::session::Session;
use log::debug;

/// Handles the LANG FTP command.
///
/// An empty argument resets to the default language; anything outside the
/// supported set is rejected.
pub async fn handle_lang_command(session: &mut Session, arg: &str) -> Result<(), std::io::Error> {
    if arg.is_empty() {
        session.language = SUPPORTED_LANGUAGES[0].to_string();
        return session.send(Reply::CommandOk).await;
    }

    match SUPPORTED_LANGUAGES
        .iter()
        .find(|tag| tag.eq_ignore_ascii_case(arg))
    {
        Some(tag) => {
            session.language = tag.to_string();
            debug!("Language negotiated: {}", tag);
            session.send(Reply::CommandOk).await
        }
        None => session.send(Reply::UnsupportedArgument(arg.to_string())).await,
    }
}

/// Handles the UTF8 FTP command, accepted only before any login attempt.
pub async fn handle_utf8_command(session: &mut Session, arg: &str) -> Result<(), std::io::Error> {
    match arg.to_ascii_uppercase().as_str() {
        "" | "ON" => {
            session.utf8_enabled = true;
            session.send(Reply::CommandOk).await
        }
        "OFF" => {
            session.utf8_enabled = false;
            session.send(Reply::CommandOk).await
        }
        _ => session.send(Reply::IllegalArgument(arg.to_string())).await,
    }
}
