use crate::core_ftpcommand::reply::Reply;
use crate::session::Session;

/// Handles the SIZE (File Size) FTP command.
pub async fn handle_size_command(session: &mut Session, arg: &str) -> Result<(), std::io::Error> {
    let resolved = session.resolve(arg);

    match resolved.real.metadata() {
        Ok(metadata) if metadata.is_file() => session.send(Reply::FileSize(metadata.len())).await,
        _ => session.send(Reply::FileNotExists(resolved.display)).await,
    }
}
