/// Login context a command demands before its handler may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandContext {
    /// Accepted in every session state.
    Any,
    NotLoggedIn,
    UserNameEntered,
    LoggedIn,
    /// Accepted only before any login attempt was made.
    BeforeLogin,
}

/// Optional-extension tag a command belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureTag {
    /// Security extensions (AUTH and friends) - never enabled.
    Rfc2228,
    /// Extended addressing (EPSV/EPRT).
    Rfc2428,
    /// Internationalization (LANG/UTF8).
    Rfc2640,
    /// File facts (MLST/MLSD/SIZE/MDTM/TVFS).
    Rfc3659,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FtpCommand {
    USER,
    PASS,
    ACCT,
    CWD,
    XCWD,
    CDUP,
    SMNT,
    QUIT,
    REIN,
    PORT,
    PASV,
    TYPE,
    STRU,
    MODE,
    RETR,
    STOR,
    STOU,
    APPE,
    ALLO,
    REST,
    RNFR,
    RNTO,
    ABOR,
    DELE,
    RMD,
    XRMD,
    MKD,
    XMKD,
    PWD,
    XPWD,
    LIST,
    NLST,
    SITE,
    SYST,
    STAT,
    HELP,
    NOOP,
    AUTH,
    ADAT,
    PROT,
    PBSZ,
    CCC,
    XCCC,
    MIC,
    XMIC,
    CONF,
    ENC,
    XENC,
    FEAT,
    OPTS,
    EPSV,
    EPRT,
    LANG,
    MDTM,
    TVFS,
    MLST,
    MLSD,
    SIZE,
    UTF8,
}

/// Immutable metadata describing one command mnemonic.
pub struct CommandSpec {
    pub command: FtpCommand,
    pub mnemonic: &'static str,
    pub context: CommandContext,
    pub feature: Option<FeatureTag>,
    /// The session loop terminates after this command's handler ran.
    pub exit: bool,
    pub args: &'static str,
    pub description: &'static str,
    /// Advertised by FEAT; empty means "advertise the mnemonic itself".
    pub feature_string: &'static str,
}

use CommandContext::{Any, BeforeLogin, LoggedIn, UserNameEntered};
use FeatureTag::{Rfc2228, Rfc2428, Rfc2640, Rfc3659};

macro_rules! spec {
    ($cmd:ident, $ctx:expr, $feat:expr, $exit:expr, $args:expr, $descr:expr) => {
        spec!($cmd, $ctx, $feat, $exit, $args, $descr, "")
    };
    ($cmd:ident, $ctx:expr, $feat:expr, $exit:expr, $args:expr, $descr:expr, $fstr:expr) => {
        CommandSpec {
            command: FtpCommand::$cmd,
            mnemonic: stringify!($cmd),
            context: $ctx,
            feature: $feat,
            exit: $exit,
            args: $args,
            description: $descr,
            feature_string: $fstr,
        }
    };
}

#[rustfmt::skip]
pub static COMMANDS: &[CommandSpec] = &[
    spec!(USER, Any,             None,          false, "<UserName>", "Type user name to logon"),
    spec!(PASS, UserNameEntered, None,          false, "<Password>", "Type password to logon"),
    spec!(ACCT, Any,             None,          false, "<Info>", "Account information"),
    spec!(CWD,  LoggedIn,        None,          false, "<NewDirectory>", "Change working directory"),
    spec!(XCWD, LoggedIn,        None,          false, "<NewDirectory>", "Change working directory"),
    spec!(CDUP, LoggedIn,        None,          false, "", "Change current directory to it's parent"),
    spec!(SMNT, LoggedIn,        None,          false, "<PathName>", "Mount file system to current session"),
    spec!(QUIT, Any,             None,          true,  "", "Close connection and quit"),
    spec!(REIN, Any,             None,          false, "", "Reset and reinitialize connection"),
    spec!(PORT, LoggedIn,        None,          false, "<ip0>,<ip1>,<ip2>,<ip3>,<portHi>,<portLo>", "Enter active mode"),
    spec!(PASV, LoggedIn,        None,          false, "", "Enter passive mode"),
    spec!(TYPE, LoggedIn,        None,          false, "{{A|E} [{N|T|A}] | I | L <byteSize>}", "Set transmission content type"),
    spec!(STRU, LoggedIn,        None,          false, "{F|R|P}", "Define structure of the file to transfer"),
    spec!(MODE, LoggedIn,        None,          false, "{S|B|C}", "Set transmission mode"),
    spec!(RETR, LoggedIn,        None,          false, "<File2Read>", "Read file content"),
    spec!(STOR, LoggedIn,        None,          false, "<File2Write>", "Write file content"),
    spec!(STOU, LoggedIn,        None,          false, "<File2Write>", "Write file content with typed or unique name"),
    spec!(APPE, LoggedIn,        None,          false, "<File2Append>", "Append file content"),
    spec!(ALLO, LoggedIn,        None,          false, "<Space> [R <Space>]", "Try to allocate space for file to store"),
    spec!(REST, LoggedIn,        None,          false, "<Marker>", "Restore transfer to typed marker"),
    spec!(RNFR, LoggedIn,        None,          false, "<File2Rename>", "Begin to rename file"),
    spec!(RNTO, LoggedIn,        None,          false, "<RenamedFileName>", "End to rename file"),
    spec!(ABOR, LoggedIn,        None,          false, "", "Cancel file transfer"),
    spec!(DELE, LoggedIn,        None,          false, "<File2Remove>", "Remove file typed"),
    spec!(RMD,  LoggedIn,        None,          false, "<Directory2Remove>", "Remove directory typed"),
    spec!(XRMD, LoggedIn,        None,          false, "<Directory2Remove>", "Remove directory typed"),
    spec!(MKD,  LoggedIn,        None,          false, "<NewDirectory>", "Create new directory on the server"),
    spec!(XMKD, LoggedIn,        None,          false, "<NewDirectory>", "Create new directory on the server"),
    spec!(PWD,  LoggedIn,        None,          false, "", "Print current working directory name"),
    spec!(XPWD, LoggedIn,        None,          false, "", "Print current working directory name"),
    spec!(LIST, LoggedIn,        None,          false, "[<Directory>]", "List current or typed directory content in Unix 'ls' format"),
    spec!(NLST, LoggedIn,        None,          false, "[<Directory>]", "List names from current or typed directory"),
    spec!(SITE, LoggedIn,        None,          false, "<Command> [<parameters>]", "Execute command in the server"),
    spec!(SYST, Any,             None,          false, "", "Print OS name"),
    spec!(STAT, Any,             None,          false, "[<File>]", "Get status of the server, transmission or file/directory"),
    spec!(HELP, Any,             None,          false, "[<CommandAbbr>]", "Print either command list or typed command description"),
    spec!(NOOP, Any,             None,          false, "", "No operation. Usually used as 'ping'"),
    spec!(AUTH, Any,             Some(Rfc2228), false, "<base64-content>", "Authentication/security mechanism"),
    spec!(ADAT, Any,             Some(Rfc2228), false, "<base64-content>", "Authentication/security data"),
    spec!(PROT, Any,             Some(Rfc2228), false, "<base64-content>", "Channel protection level"),
    spec!(PBSZ, Any,             Some(Rfc2228), false, "<base64-content>", "Protection buffer size"),
    spec!(CCC,  Any,             Some(Rfc2228), false, "<base64-content>", "Clear command channel"),
    spec!(XCCC, Any,             Some(Rfc2228), false, "<base64-content>", "Clear command channel"),
    spec!(MIC,  Any,             Some(Rfc2228), false, "<base64-content>", "Integrity protection command"),
    spec!(XMIC, Any,             Some(Rfc2228), false, "<base64-content>", "Integrity protection command"),
    spec!(CONF, Any,             Some(Rfc2228), false, "<base64-content>", "Confidentiality protection command"),
    spec!(ENC,  Any,             Some(Rfc2228), false, "<base64-content>", "Privacy protection command"),
    spec!(XENC, Any,             Some(Rfc2228), false, "<base64-content>", "Privacy protection command"),
    spec!(FEAT, Any,             None,          false, "", "Get list of features for the given FTP server"),
    spec!(OPTS, Any,             None,          false, "<Feature> [<Value>]", "Set options for features on the given FTP server"),
    spec!(EPSV, LoggedIn,        Some(Rfc2428), false, "[ALL]", "Enter passive mode (possibly IPv6 available)"),
    spec!(EPRT, LoggedIn,        Some(Rfc2428), false, "|{1|2}|{<ipv4>|<ipv6>}|<port>|", "Enter active mode (possibly IPv6 available)"),
    spec!(LANG, LoggedIn,        Some(Rfc2640), false, "[<LanguageTag>]", "Language settings", "LANG EN*;FR"),
    spec!(MDTM, LoggedIn,        Some(Rfc3659), false, "[<Timestamp>] <File>", "Get or set file modification time"),
    spec!(TVFS, LoggedIn,        Some(Rfc3659), false, "", "Trivial virtual file store"),
    spec!(MLST, LoggedIn,        Some(Rfc3659), false, "[<File>]", "Describe file properties"),
    spec!(MLSD, LoggedIn,        Some(Rfc3659), false, "[<Dir>]", "Describe directory properties"),
    spec!(SIZE, LoggedIn,        Some(Rfc3659), false, "[<File>]", "Get file size"),
    spec!(UTF8, BeforeLogin,     Some(Rfc2640), false, "", "Set UTF8 modes"),
];

impl FtpCommand {
    pub fn from_str(cmd: &str) -> Option<FtpCommand> {
        let upper = cmd.to_ascii_uppercase();
        COMMANDS
            .iter()
            .find(|spec| spec.mnemonic == upper)
            .map(|spec| spec.command)
    }

    pub fn spec(&self) -> &'static CommandSpec {
        COMMANDS
            .iter()
            .find(|spec| spec.command == *self)
            .expect("every command has a table entry")
    }

    pub fn mnemonic(&self) -> &'static str {
        self.spec().mnemonic
    }

    pub fn feature_string(&self) -> &'static str {
        let spec = self.spec();
        if spec.feature_string.is_empty() {
            spec.mnemonic
        } else {
            spec.feature_string
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(FtpCommand::from_str("user"), Some(FtpCommand::USER));
        assert_eq!(FtpCommand::from_str("Pasv"), Some(FtpCommand::PASV));
        assert_eq!(FtpCommand::from_str("NOSUCH"), None);
    }

    #[test]
    fn every_variant_resolves_back_to_its_spec() {
        for spec in COMMANDS {
            assert_eq!(FtpCommand::from_str(spec.mnemonic), Some(spec.command));
            assert_eq!(spec.command.mnemonic(), spec.mnemonic);
        }
    }

    #[test]
    fn feature_tags_cover_the_extension_sets() {
        assert_eq!(FtpCommand::AUTH.spec().feature, Some(FeatureTag::Rfc2228));
        assert_eq!(FtpCommand::EPSV.spec().feature, Some(FeatureTag::Rfc2428));
        assert_eq!(FtpCommand::LANG.spec().feature, Some(FeatureTag::Rfc2640));
        assert_eq!(FtpCommand::MLSD.spec().feature, Some(FeatureTag::Rfc3659));
        assert_eq!(FtpCommand::LIST.spec().feature, None);
    }

    #[test]
    fn quit_is_the_only_exit_command() {
        for spec in COMMANDS {
            assert_eq!(spec.exit, spec.command == FtpCommand::QUIT);
        }
    }

    #[test]
    fn lang_advertises_the_language_list() {
        assert_eq!(FtpCommand::LANG.feature_string(), "LANG EN*;FR");
        assert_eq!(FtpCommand::MLST.feature_string(), "MLST");
    }
}
