use crate::core_ftpcommand::reply::Reply;
use crate::session::Session;
use log::{error, info};
use regex::Regex;
use std::net::IpAddr;
use std::sync::OnceLock;

fn port_args_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{1,3},\d{1,3},\d{1,3},\d{1,3},\d{1,3},\d{1,3}$").unwrap())
}

fn eprt_args_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\|(1|2)\|.*\|\d{1,5}\|$").unwrap())
}

/// Parses the `h1,h2,h3,h4,p1,p2` tuple of a PORT argument.
pub fn parse_port_args(arg: &str) -> Option<(IpAddr, u16)> {
    if !port_args_regex().is_match(arg) {
        return None;
    }
    let content: Vec<u8> = arg
        .split(',')
        .map(|part| part.trim().parse::<u8>())
        .collect::<Result<_, _>>()
        .ok()?;
    let ip = IpAddr::from([content[0], content[1], content[2], content[3]]);
    let port = u16::from(content[4]) << 8 | u16::from(content[5]);
    Some((ip, port))
}

/// Parses the `|proto|address|port|` tuple of an EPRT argument.
pub fn parse_eprt_args(arg: &str) -> Option<(IpAddr, u16)> {
    if !eprt_args_regex().is_match(arg) {
        return None;
    }
    let parts: Vec<&str> = arg.split('|').collect();
    let ip: IpAddr = parts[2].parse().ok()?;
    let port: u16 = parts[3].parse().ok()?;
    match (parts[1], ip) {
        ("1", IpAddr::V4(_)) | ("2", IpAddr::V6(_)) => Some((ip, port)),
        _ => None,
    }
}

/// Handles the PORT (Active Mode) FTP command.
pub async fn handle_port_command(session: &mut Session, arg: &str) -> Result<(), std::io::Error> {
    let Some((ip, port)) = parse_port_args(arg) else {
        return session.send(Reply::IllegalArgument(arg.to_string())).await;
    };
    open_active(session, ip, port, arg).await
}

/// Handles the EPRT (RFC 2428 active mode) FTP command.
pub async fn handle_eprt_command(session: &mut Session, arg: &str) -> Result<(), std::io::Error> {
    let Some((ip, port)) = parse_eprt_args(arg) else {
        return session.send(Reply::IllegalArgument(arg.to_string())).await;
    };
    open_active(session, ip, port, arg).await
}

async fn open_active(
    session: &mut Session,
    ip: IpAddr,
    port: u16,
    arg: &str,
) -> Result<(), std::io::Error> {
    if session.epsv_all {
        return session.send(Reply::DisabledByEpsvAll).await;
    }
    info!("Opening active data connection to {}:{} ({})", ip, port, arg);
    match session.data.open_active(ip, port).await {
        Ok(()) => session.send(Reply::CommandOk).await,
        Err(e) => {
            error!("Failed to connect to client {}:{}: {}", ip, port, e);
            session.send(Reply::NoDataConnection).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_port_tuple() {
        let (ip, port) = parse_port_args("192,168,0,1,16,146").unwrap();
        assert_eq!(ip, IpAddr::from([192, 168, 0, 1]));
        assert_eq!(port, 16 * 256 + 146);
    }

    #[test]
    fn rejects_malformed_port_tuples() {
        assert!(parse_port_args("").is_none());
        assert!(parse_port_args("1,2,3,4,5").is_none());
        assert!(parse_port_args("256,0,0,1,0,80").is_none());
        assert!(parse_port_args("a,b,c,d,e,f").is_none());
    }

    #[test]
    fn parses_eprt_v4_and_v6_tuples() {
        let (ip, port) = parse_eprt_args("|1|192.168.0.1|12345|").unwrap();
        assert_eq!(ip, IpAddr::from([192, 168, 0, 1]));
        assert_eq!(port, 12345);

        let (ip, port) = parse_eprt_args("|2|::1|2121|").unwrap();
        assert!(ip.is_loopback());
        assert_eq!(port, 2121);
    }

    #[test]
    fn rejects_eprt_protocol_address_mismatch() {
        assert!(parse_eprt_args("|2|192.168.0.1|12345|").is_none());
        assert!(parse_eprt_args("|1|::1|12345|").is_none());
        assert!(parse_eprt_args("|3|::1|12345|").is_none());
        assert!(parse_eprt_args("not-an-eprt-arg").is_none());
    }
}
