use crate::core_ftpcommand::reply::Reply;
use crate::session::Session;
use log::debug;

/// Handles the CWD (and XCWD) FTP command.
///
/// Resolves the argument against the virtual root; the resulting virtual
/// path can never escape the sandbox, `..` is clamped at `/`.
pub async fn handle_cwd_command(session: &mut Session, arg: &str) -> Result<(), std::io::Error> {
    let resolved = session.resolve(arg);

    if resolved.real.is_dir() {
        session.current_dir = resolved.display.clone();
        session.send(Reply::DirectoryChanged(resolved.display)).await
    } else {
        debug!("Not found: <{}>", resolved.real.display());
        session.send(Reply::FileUnavailable(resolved.display)).await
    }
}

/// Handles the CDUP FTP command as a CWD to the parent directory.
pub async fn handle_cdup_command(session: &mut Session) -> Result<(), std::io::Error> {
    handle_cwd_command(session, "..").await
}
