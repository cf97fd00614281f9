use crate::core_ftpcommand::reply::Reply;
use crate::session::{FileStructure, Session};

/// Handles the STRU FTP command.
///
/// `F` (file) is the default; `R` (record) engages the record codec on
/// subsequent transfers; `P` (page) is not supported.
pub async fn handle_stru_command(session: &mut Session, arg: &str) -> Result<(), std::io::Error> {
    match arg.to_ascii_uppercase().as_str() {
        "F" => {
            session.structure = FileStructure::File;
            session.send(Reply::CommandOk).await
        }
        "R" => {
            session.structure = FileStructure::Record;
            session.send(Reply::CommandOk).await
        }
        "P" => session.send(Reply::UnsupportedArgument(arg.to_string())).await,
        _ => session.send(Reply::IllegalArgument(arg.to_string())).await,
    }
}
