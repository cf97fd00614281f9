use crate::core_ftpcommand::reply::Reply;
use crate::session::Session;

/// Handles the MODE FTP command.
///
/// Only the stream mode `S` is wired end-to-end; block and compressed
/// transmission are not offered on the wire.
pub async fn handle_mode_command(session: &mut Session, arg: &str) -> Result<(), std::io::Error> {
    match arg.to_ascii_uppercase().as_str() {
        "S" => session.send(Reply::CommandOk).await,
        "B" | "C" => session.send(Reply::UnsupportedArgument(arg.to_string())).await,
        _ => session.send(Reply::IllegalArgument(arg.to_string())).await,
    }
}
