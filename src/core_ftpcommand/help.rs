use crate::core_ftpcommand::command::{FtpCommand, COMMANDS};
use crate::core_ftpcommand::reply::Reply;
use crate::session::Session;

/// Handles the HELP FTP command.
///
/// Without an argument it lists every command with its argument syntax,
/// tagging the optional-extension ones; with an argument it describes the
/// typed command.
pub async fn handle_help_command(session: &mut Session, arg: &str) -> Result<(), std::io::Error> {
    if arg.is_empty() {
        session.send(Reply::CommandsStart).await?;
        for spec in COMMANDS {
            let line = if spec.feature.is_some() {
                format!(" {} {} (feature)", spec.mnemonic, spec.args)
            } else {
                format!(" {} {}", spec.mnemonic, spec.args)
            };
            session.send_line(&line).await?;
        }
        session.send(Reply::CommandsEnd).await
    } else {
        match FtpCommand::from_str(arg) {
            Some(command) => {
                let spec = command.spec();
                session
                    .send(Reply::CommandHelp {
                        mnemonic: spec.mnemonic,
                        args: spec.args,
                        description: spec.description,
                    })
                    .await
            }
            None => session.send(Reply::CommandHelpMissing(arg.to_string())).await,
        }
    }
}
