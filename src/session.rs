use crate::config::Config;
use crate::constants::SUPPORTED_LANGUAGES;
use crate::core_auth::SimpleValidator;
use crate::core_ftpcommand as cmds;
use crate::core_ftpcommand::command::{CommandContext, FtpCommand};
use crate::core_ftpcommand::reply::{send_continuation, send_reply, Reply};
use crate::core_network::{pasv, port, DataConnection};
use crate::core_transfer::TransferHandle;
use log::{debug, error};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::Mutex;

/// The control-channel write half, behind the per-session write lock so a
/// background transfer-completion reply can never interleave mid-line with
/// a foreground command reply.
pub type ControlWriter = Arc<Mutex<OwnedWriteHalf>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginStatus {
    NotLoggedIn,
    UserNameEntered,
    LoggedIn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferType {
    Ascii,
    Binary,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStructure {
    File,
    Record,
}

/// A client-supplied path resolved against the sandbox.
pub struct ResolvedPath {
    /// Slash-rooted virtual form, as reported back to the client.
    pub display: String,
    /// Host path under the sandbox root.
    pub real: PathBuf,
}

/// Per-connection session state; one owner, the task running the command
/// loop. Only the transfer engine's counters are touched concurrently.
pub struct Session {
    pub config: Arc<Config>,
    pub validator: Arc<SimpleValidator>,
    pub root: PathBuf,
    writer: ControlWriter,
    pub local_addr: SocketAddr,

    pub status: LoginStatus,
    pub current_user: Option<String>,
    pub login_attempted: bool,
    pub current_dir: String,
    pub transfer_type: TransferType,
    pub structure: FileStructure,
    pub rename_from: Option<PathBuf>,
    pub data: DataConnection,
    pub transfer: Option<TransferHandle>,
    pub language: String,
    pub utf8_enabled: bool,
    pub epsv_all: bool,
}

impl Session {
    pub fn new(
        config: Arc<Config>,
        validator: Arc<SimpleValidator>,
        root: PathBuf,
        writer: ControlWriter,
        local_addr: SocketAddr,
    ) -> Self {
        Self {
            config,
            validator,
            root,
            writer,
            local_addr,
            status: LoginStatus::NotLoggedIn,
            current_user: None,
            login_attempted: false,
            current_dir: String::from("/"),
            transfer_type: TransferType::Unknown,
            structure: FileStructure::File,
            rename_from: None,
            data: DataConnection::new(),
            transfer: None,
            language: SUPPORTED_LANGUAGES[0].to_string(),
            utf8_enabled: false,
            epsv_all: false,
        }
    }

    /// Runs the command loop until the client disconnects or quits.
    pub async fn run(mut self, read_half: OwnedReadHalf) {
        debug!("FTP session started, current working directory is </>");
        if let Err(e) = self.send(Reply::Welcome).await {
            error!("Could not greet client: {}", e);
            return;
        }

        let mut reader = BufReader::new(read_half);
        let mut line = String::new();
        loop {
            line.clear();
            match reader.read_line(&mut line).await {
                Ok(0) => {
                    debug!("Client disconnected");
                    break;
                }
                Ok(_) => {
                    let trimmed = line.trim_end_matches(['\r', '\n']);
                    match self.execute(trimmed).await {
                        Ok(true) => {}
                        Ok(false) => break,
                        Err(e) => {
                            error!("Control socket error: {}", e);
                            break;
                        }
                    }
                }
                Err(e) => {
                    error!("Control socket error: {}", e);
                    break;
                }
            }
        }

        self.teardown().await;
        debug!("FTP session ended");
    }

    /// Dispatches one command line; returns false when the session ends.
    async fn execute(&mut self, line: &str) -> Result<bool, std::io::Error> {
        let (mnemonic, args) = match line.find(' ') {
            Some(blank) => (&line[..blank], line[blank + 1..].trim()),
            None => (line, ""),
        };
        debug!("Command: {}, args: <{}>", mnemonic, args);

        let Some(cmd) = FtpCommand::from_str(mnemonic.trim()) else {
            self.send(Reply::UnknownCommand).await?;
            return Ok(true);
        };
        let spec = cmd.spec();

        if let Some(tag) = spec.feature {
            if !self.config.features.enabled(tag) {
                self.send(Reply::UnsupportedCommand).await?;
                return Ok(true);
            }
        }
        if self.config.is_blacklisted(spec.mnemonic) {
            self.send(Reply::IgnoredCommand).await?;
            return Ok(true);
        }
        if !context_allows(self.status, self.login_attempted, spec.context) {
            self.send(Reply::NotLoggedIn).await?;
            return Ok(true);
        }

        use FtpCommand::*;
        match cmd {
            ABOR => cmds::abor::handle_abor_command(self).await?,
            ACCT | SMNT | SITE | REST | TVFS => self.send(Reply::CommandIgnored).await?,
            ALLO => cmds::allo::handle_allo_command(self, args).await?,
            APPE => cmds::stor::handle_stor_command(self, args, true, false).await?,
            CDUP => cmds::cwd::handle_cdup_command(self).await?,
            CWD | XCWD => cmds::cwd::handle_cwd_command(self, args).await?,
            DELE => cmds::dele::handle_dele_command(self, args).await?,
            EPRT => port::handle_eprt_command(self, args).await?,
            EPSV => pasv::handle_epsv_command(self, args).await?,
            FEAT => cmds::feat::handle_feat_command(self).await?,
            HELP => cmds::help::handle_help_command(self, args).await?,
            LANG => cmds::lang::handle_lang_command(self, args).await?,
            LIST => cmds::list::handle_list_command(self, args).await?,
            MDTM => cmds::mdtm::handle_mdtm_command(self, args).await?,
            MKD | XMKD => cmds::mkd::handle_mkd_command(self, args).await?,
            MLSD => cmds::facts::handle_mlsd_command(self, args).await?,
            MLST => cmds::facts::handle_mlst_command(self, args).await?,
            MODE => cmds::mode::handle_mode_command(self, args).await?,
            NLST => cmds::list::handle_nlst_command(self, args).await?,
            NOOP => cmds::noop::handle_noop_command(self).await?,
            OPTS => cmds::opts::handle_opts_command(self, args).await?,
            PASS => cmds::pass::handle_pass_command(self, args).await?,
            PASV => pasv::handle_pasv_command(self, args).await?,
            PORT => port::handle_port_command(self, args).await?,
            PWD | XPWD => cmds::pwd::handle_pwd_command(self).await?,
            QUIT => cmds::quit::handle_quit_command(self).await?,
            REIN => cmds::quit::handle_rein_command(self).await?,
            RETR => cmds::retr::handle_retr_command(self, args).await?,
            RMD | XRMD => cmds::rmd::handle_rmd_command(self, args).await?,
            RNFR => cmds::rnfr::handle_rnfr_command(self, args).await?,
            RNTO => cmds::rnto::handle_rnto_command(self, args).await?,
            SIZE => cmds::size::handle_size_command(self, args).await?,
            STAT => cmds::stat::handle_stat_command(self, args).await?,
            STOR => cmds::stor::handle_stor_command(self, args, false, false).await?,
            STOU => cmds::stor::handle_stor_command(self, args, false, true).await?,
            STRU => cmds::stru::handle_stru_command(self, args).await?,
            SYST => cmds::syst::handle_syst_command(self).await?,
            TYPE => cmds::type_::handle_type_command(self, args).await?,
            USER => cmds::user::handle_user_command(self, args).await?,
            UTF8 => cmds::lang::handle_utf8_command(self, args).await?,
            AUTH | ADAT | PROT | PBSZ | CCC | XCCC | MIC | XMIC | CONF | ENC | XENC => {
                self.send(Reply::UnsupportedCommand).await?
            }
        }

        // The pending rename only survives to the very next command.
        if cmd != RNFR {
            self.rename_from = None;
        }
        Ok(!spec.exit)
    }

    pub async fn send(&self, reply: Reply) -> Result<(), std::io::Error> {
        send_reply(&self.writer, &reply).await
    }

    /// Sends a bare continuation line of a multi-line reply.
    pub async fn send_line(&self, line: &str) -> Result<(), std::io::Error> {
        send_continuation(&self.writer, line).await
    }

    /// A clone of the control write half for the transfer engine.
    pub fn writer(&self) -> ControlWriter {
        Arc::clone(&self.writer)
    }

    pub fn transfer_running(&self) -> bool {
        self.transfer
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Resolves a client path against the sandbox root.
    pub fn resolve(&self, arg: &str) -> ResolvedPath {
        let display = normalize_virtual_path(&self.current_dir, arg);
        let real = if display == "/" {
            self.root.clone()
        } else {
            self.root.join(display.trim_start_matches('/'))
        };
        ResolvedPath { display, real }
    }

    /// Resets all per-session state, cancelling any running transfer and
    /// closing the data connection (REIN, and the implicit reset of a USER
    /// while logged in).
    pub async fn clear_settings(&mut self) {
        if let Some(handle) = self.transfer.take() {
            if !handle.is_finished() {
                handle.cancel();
            }
        }
        self.data.close().await;
        self.status = LoginStatus::NotLoggedIn;
        self.current_user = None;
        self.login_attempted = false;
        self.current_dir = String::from("/");
        self.transfer_type = TransferType::Unknown;
        self.structure = FileStructure::File;
        self.rename_from = None;
        self.language = SUPPORTED_LANGUAGES[0].to_string();
        self.utf8_enabled = false;
        self.epsv_all = false;
    }

    async fn teardown(&mut self) {
        if let Some(handle) = self.transfer.take() {
            if !handle.is_finished() {
                handle.cancel();
            }
        }
        self.data.close().await;
    }
}

/// Whether a command's required context matches the session state.
pub(crate) fn context_allows(
    status: LoginStatus,
    login_attempted: bool,
    context: CommandContext,
) -> bool {
    match context {
        CommandContext::Any => true,
        CommandContext::NotLoggedIn => status == LoginStatus::NotLoggedIn,
        CommandContext::UserNameEntered => status == LoginStatus::UserNameEntered,
        CommandContext::LoggedIn => status == LoginStatus::LoggedIn,
        CommandContext::BeforeLogin => status == LoginStatus::NotLoggedIn && !login_attempted,
    }
}

/// Normalizes a client path against the current virtual directory.
///
/// Absolute arguments resolve from the virtual root, `.` stays put, `..`
/// ascends but is clamped at `/`; the result always uses forward slashes,
/// whatever the host separator is.
pub fn normalize_virtual_path(current: &str, arg: &str) -> String {
    let combined = if arg.is_empty() {
        current.to_string()
    } else if arg.starts_with('/') {
        arg.to_string()
    } else {
        format!("{}/{}", current, arg)
    };

    let mut parts: Vec<&str> = Vec::new();
    for component in combined.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            name => parts.push(name),
        }
    }
    if parts.is_empty() {
        String::from("/")
    } else {
        format!("/{}", parts.join("/"))
    }
}
