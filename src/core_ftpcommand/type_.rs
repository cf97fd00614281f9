use crate::core_ftpcommand::reply::Reply;
use crate::session::{Session, TransferType};
use regex::Regex;
use std::sync::OnceLock;

fn type_args_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^((A|E|I)(\s+(N|T|C))?|L\s+\d+)$").unwrap())
}

/// Handles the TYPE FTP command.
///
/// `A` (optionally with the `N` subtype) selects ASCII, `I` selects
/// binary, `L 8` is accepted as binary; EBCDIC and the print subtypes are
/// not supported by the server.
pub async fn handle_type_command(session: &mut Session, arg: &str) -> Result<(), std::io::Error> {
    let mode = arg.to_ascii_uppercase();
    if !type_args_regex().is_match(&mode) {
        return session.send(Reply::IllegalArgument(arg.to_string())).await;
    }

    let parts: Vec<&str> = mode.split_whitespace().collect();
    match parts[0] {
        "A" => {
            if parts.len() > 1 && parts[1] != "N" {
                session.send(Reply::UnsupportedArgument(mode.clone())).await
            } else {
                session.transfer_type = TransferType::Ascii;
                session.send(Reply::CommandOk).await
            }
        }
        "I" => {
            session.transfer_type = TransferType::Binary;
            session.send(Reply::CommandOk).await
        }
        "L" => {
            if matches!(parts[1].parse::<u32>(), Ok(8)) {
                session.transfer_type = TransferType::Binary;
                session.send(Reply::CommandOk).await
            } else {
                session.send(Reply::UnsupportedArgument(mode.clone())).await
            }
        }
        _ => session.send(Reply::UnsupportedArgument(mode.clone())).await,
    }
}
