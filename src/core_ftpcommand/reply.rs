use crate::session::ControlWriter;
use log::debug;
use tokio::io::AsyncWriteExt;

/// Every reply the server emits on the control channel.
///
/// A reply renders as `<3-digit code><SP|-><text>\r\n`; the dash marks the
/// first line of a multi-line group per the FTP continuation convention.
#[derive(Debug, Clone)]
pub enum Reply {
    OpenConnForList,                   // 125
    OpenBinConnForList,                // 150
    OpenBinConnForFile(String),        // 150
    OpenAsciiConnForFile(String),      // 150
    CommandOk,                         // 200
    CommandIgnored,                    // 202
    SystemStatus,                      // 211
    ExtensionsStart,                   // 211-
    ExtensionsEnd,                     // 211
    CommandsStart,                     // 211-
    CommandsEnd,                       // 211
    CommandHelp {
        mnemonic: &'static str,
        args: &'static str,
        description: &'static str,
    },                                 // 211
    CommandHelpMissing(String),        // 211
    TransferStatus { bytes: u64, error: bool }, // 213
    FileSize(u64),                     // 213
    ModificationTime(String),          // 213
    ModificationTimeSet,               // 213
    System(String),                    // 215
    Welcome,                           // 220
    ConnectionReset,                   // 220
    ClosingConn,                       // 221
    NoTransferInProgress,              // 225
    TransferCompleted,                 // 226
    TransferCompletedDetailed {
        bytes: u64,
        speed: f64,
        name: String,
    },                                 // 226
    EnteringPassiveMode {
        ip: [u8; 4],
        port: u16,
    },                                 // 227
    EnteringExtendedPassiveMode(u16),  // 229
    WelcomeUserLogged,                 // 230-
    UserLogged,                        // 230
    FileFactsBegin,                    // 250-
    FileFactsEnd,                      // 250
    DirectoryCreated(String),          // 250
    DirectoryChanged(String),          // 250
    DirectoryRemoved(String),          // 250
    FileRemoved(String),               // 250
    CurrentDir(String),                // 257
    UserNameOk,                        // 331
    AwaitingContinuation,              // 350
    StillRunning,                      // 421
    NoDataConnection,                  // 425
    AbortDataConnection,               // 426
    UnknownCommand,                    // 500
    UnsupportedCommand,                // 500
    IgnoredCommand,                    // 500
    DisabledByEpsvAll,                 // 500
    IllegalArgument(String),           // 501
    MissingRnfrBeforeRnto,             // 503
    UnsupportedArgument(String),       // 504
    TransferModeNotSet,                // 504
    NotLoggedIn,                       // 530
    WrongCredentials,                  // 530
    FileUnavailable(String),           // 550
    FileNotExists(String),             // 550
    DirectoryNotExists(String),        // 550
    FileAlreadyExists(String),         // 550
    DirectoryNotCreated(String),       // 550
}

impl Reply {
    pub fn code(&self) -> u16 {
        use Reply::*;
        match self {
            OpenConnForList => 125,
            OpenBinConnForList | OpenBinConnForFile(_) | OpenAsciiConnForFile(_) => 150,
            CommandOk => 200,
            CommandIgnored => 202,
            SystemStatus | ExtensionsStart | ExtensionsEnd | CommandsStart | CommandsEnd
            | CommandHelp { .. } | CommandHelpMissing(_) => 211,
            TransferStatus { .. } | FileSize(_) | ModificationTime(_) | ModificationTimeSet => 213,
            System(_) => 215,
            Welcome | ConnectionReset => 220,
            ClosingConn => 221,
            NoTransferInProgress => 225,
            TransferCompleted | TransferCompletedDetailed { .. } => 226,
            EnteringPassiveMode { .. } => 227,
            EnteringExtendedPassiveMode(_) => 229,
            WelcomeUserLogged | UserLogged => 230,
            FileFactsBegin | FileFactsEnd | DirectoryCreated(_) | DirectoryChanged(_)
            | DirectoryRemoved(_) | FileRemoved(_) => 250,
            CurrentDir(_) => 257,
            UserNameOk => 331,
            AwaitingContinuation => 350,
            StillRunning => 421,
            NoDataConnection => 425,
            AbortDataConnection => 426,
            UnknownCommand | UnsupportedCommand | IgnoredCommand | DisabledByEpsvAll => 500,
            IllegalArgument(_) => 501,
            MissingRnfrBeforeRnto => 503,
            UnsupportedArgument(_) | TransferModeNotSet => 504,
            NotLoggedIn | WrongCredentials => 530,
            FileUnavailable(_) | FileNotExists(_) | DirectoryNotExists(_)
            | FileAlreadyExists(_) | DirectoryNotCreated(_) => 550,
        }
    }

    fn is_continued(&self) -> bool {
        matches!(
            self,
            Reply::ExtensionsStart
                | Reply::CommandsStart
                | Reply::WelcomeUserLogged
                | Reply::FileFactsBegin
        )
    }

    fn text(&self) -> String {
        use Reply::*;
        match self {
            OpenConnForList => "Opening ASCII mode data connection for file list.".into(),
            OpenBinConnForList => "Opening binary mode data connection for file list.".into(),
            OpenBinConnForFile(name) => {
                format!("Opening binary mode data connection for file {}", name)
            }
            OpenAsciiConnForFile(name) => {
                format!("Opening ASCII mode data connection for file {}", name)
            }
            CommandOk => "Command OK".into(),
            CommandIgnored => "Command recognized but ignored.".into(),
            SystemStatus => "System status OK".into(),
            ExtensionsStart => "Extensions supported:".into(),
            ExtensionsEnd | CommandsEnd => "END".into(),
            CommandsStart => "Commands supported:".into(),
            CommandHelp {
                mnemonic,
                args,
                description,
            } => format!("Command: {} {} - {}", mnemonic, args, description),
            CommandHelpMissing(name) => format!("Command {} is not supported", name),
            TransferStatus { bytes, error } => format!(
                "File transfer status: transferring {} bytes, error bit is {}",
                bytes, error
            ),
            FileSize(size) => format!("{}", size),
            ModificationTime(stamp) => stamp.clone(),
            ModificationTimeSet => "Modification time set.".into(),
            System(os) => os.clone(),
            Welcome => format!("Welcome to the {} FTP-Server", crate::constants::SERVER_NAME),
            ConnectionReset => "Connection reset. Type 'USER' or 'ACCT' command to connect".into(),
            ClosingConn => "Closing connection".into(),
            NoTransferInProgress => "No any transfer in progress, command ignored".into(),
            TransferCompleted => "Transfer completed".into(),
            TransferCompletedDetailed { bytes, speed, name } => format!(
                "Transfer completed, {} bytes transmitted, avg speed is {:.3} bytes/sec, file name is \"{}\"",
                bytes, speed, name
            ),
            EnteringPassiveMode { ip, port } => format!(
                "Entering Passive Mode ({},{},{},{},{},{})",
                ip[0],
                ip[1],
                ip[2],
                ip[3],
                port / 256,
                port % 256
            ),
            EnteringExtendedPassiveMode(port) => {
                format!("Entering Extended Passive Mode (|||{}|)", port)
            }
            WelcomeUserLogged => "Welcome to server".into(),
            UserLogged => "User logged in successfully".into(),
            FileFactsBegin => "File descriptor".into(),
            FileFactsEnd => "File descriptor end".into(),
            DirectoryCreated(name) => format!("Directory {} successfully created", name),
            DirectoryChanged(name) => {
                format!("The current directory has been changed to {}", name)
            }
            DirectoryRemoved(name) => format!("Directory {} successfully removed", name),
            FileRemoved(name) => format!("File {} successfully removed", name),
            CurrentDir(name) => format!("\"{}\"", name),
            UserNameOk => "User name okay, need password".into(),
            AwaitingContinuation => "Requested file action pending further information.".into(),
            StillRunning => "Service is still running and can't process new request.".into(),
            NoDataConnection => "No data connection was established".into(),
            AbortDataConnection => "Transfer errors detected, connection closed".into(),
            UnknownCommand => "Unknown command".into(),
            UnsupportedCommand => {
                "Unsupported command (enable the matching rfc feature in the configuration)".into()
            }
            IgnoredCommand => "Command ignored (blacklisted in the configuration)".into(),
            DisabledByEpsvAll => "Command disabled (EPSV ALL is active)".into(),
            IllegalArgument(arg) => format!("Illegal argument [{}]", arg),
            MissingRnfrBeforeRnto => "RNTO command without RNFR preceding".into(),
            UnsupportedArgument(arg) => {
                format!("Argument [{}] is not supported by the server", arg)
            }
            TransferModeNotSet => "Transfer mode is not set yet".into(),
            NotLoggedIn => "Command in wrong context (possibly not logged in)".into(),
            WrongCredentials => "Wrong credentials for user typed".into(),
            FileUnavailable(name) => {
                format!("Requested action not taken. File {} unavailable.", name)
            }
            FileNotExists(name) => format!(
                "Entity {} does not exist, not a file or is not available for current user",
                name
            ),
            DirectoryNotExists(name) => format!(
                "Entity {} does not exist, not a directory or is not available for current user",
                name
            ),
            FileAlreadyExists(name) => format!("File {} already exist", name),
            DirectoryNotCreated(name) => format!("Failed to create new directory {}", name),
        }
    }

    pub fn render(&self) -> String {
        let separator = if self.is_continued() { '-' } else { ' ' };
        format!("{}{}{}\r\n", self.code(), separator, self.text())
    }
}

/// Writes one reply under the session write lock.
pub async fn send_reply(writer: &ControlWriter, reply: &Reply) -> Result<(), std::io::Error> {
    let rendered = reply.render();
    debug!("Answer: {}", rendered.trim_end());
    let mut writer = writer.lock().await;
    writer.write_all(rendered.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

/// Writes a bare continuation line (no reply code) of a multi-line reply.
pub async fn send_continuation(writer: &ControlWriter, line: &str) -> Result<(), std::io::Error> {
    let mut writer = writer.lock().await;
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\r\n").await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_line_replies_use_a_space() {
        assert_eq!(Reply::CommandOk.render(), "200 Command OK\r\n");
        assert_eq!(
            Reply::UserNameOk.render(),
            "331 User name okay, need password\r\n"
        );
    }

    #[test]
    fn continued_replies_use_a_dash() {
        assert_eq!(
            Reply::WelcomeUserLogged.render(),
            "230-Welcome to server\r\n"
        );
        assert_eq!(Reply::ExtensionsStart.render(), "211-Extensions supported:\r\n");
        assert_eq!(Reply::ExtensionsEnd.render(), "211 END\r\n");
    }

    #[test]
    fn passive_reply_encodes_address_tuple() {
        let reply = Reply::EnteringPassiveMode {
            ip: [127, 0, 0, 1],
            port: 4242,
        };
        assert_eq!(
            reply.render(),
            "227 Entering Passive Mode (127,0,0,1,16,146)\r\n"
        );
    }

    #[test]
    fn extended_passive_reply_carries_only_the_port() {
        assert_eq!(
            Reply::EnteringExtendedPassiveMode(50000).render(),
            "229 Entering Extended Passive Mode (|||50000|)\r\n"
        );
    }

    #[test]
    fn error_family_codes_match_the_protocol() {
        assert_eq!(Reply::UnknownCommand.code(), 500);
        assert_eq!(Reply::UnsupportedCommand.code(), 500);
        assert_eq!(Reply::IgnoredCommand.code(), 500);
        assert_eq!(Reply::NotLoggedIn.code(), 530);
        assert_eq!(Reply::MissingRnfrBeforeRnto.code(), 503);
        assert_eq!(Reply::FileNotExists(String::new()).code(), 550);
        assert_eq!(Reply::StillRunning.code(), 421);
    }
}
