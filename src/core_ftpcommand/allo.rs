use crate::core_ftpcommand::reply::Reply;
use crate::session::Session;
use regex::Regex;
use std::sync::OnceLock;

fn allo_args_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+(\s+R\s+\d+)?$").unwrap())
}

/// Handles the ALLO FTP command.
///
/// Space allocation is not enforced; a well-formed request is recognized
/// and ignored.
pub async fn handle_allo_command(session: &mut Session, arg: &str) -> Result<(), std::io::Error> {
    if arg.is_empty() || !allo_args_regex().is_match(arg) {
        session.send(Reply::IllegalArgument(arg.to_string())).await
    } else {
        session.send(Reply::CommandIgnored).await
    }
}
