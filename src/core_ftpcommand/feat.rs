use crate::core_ftpcommand::command::COMMANDS;
use crate::core_ftpcommand::reply::Reply;
use crate::session::Session;
use log::info;

/// Handles the FEAT (Feature) FTP command.
///
/// Advertises the feature strings of the extension commands whose RFC set
/// is enabled for this server instance.
pub async fn handle_feat_command(session: &mut Session) -> Result<(), std::io::Error> {
    session.send(Reply::ExtensionsStart).await?;
    for spec in COMMANDS {
        let advertised = match spec.feature {
            Some(tag) => session.config.features.enabled(tag),
            None => false,
        };
        if advertised {
            let line = format!(" {}", spec.command.feature_string());
            session.send_line(&line).await?;
        }
    }
    info!("Responded to FEAT with the enabled extensions");
    session.send(Reply::ExtensionsEnd).await
}
