use crate::core_ftpcommand::reply::Reply;
use crate::session::Session;
use log::{debug, error};
use std::net::IpAddr;

/// Handles the PASV FTP command.
///
/// Binds the passive listener (on the configured fixed data port, or an
/// ephemeral one) and reports the address the client should dial. The
/// accept itself is deferred until the next data operation.
pub async fn handle_pasv_command(session: &mut Session, _arg: &str) -> Result<(), std::io::Error> {
    if session.epsv_all {
        return session.send(Reply::DisabledByEpsvAll).await;
    }

    let data_port = session.config.server.data_port;
    let addr = match session.data.open_passive(&session.local_addr, data_port).await {
        Ok(addr) => addr,
        Err(e) => {
            error!("Could not create data connection (port {}): {}", data_port, e);
            return session.send(Reply::NoDataConnection).await;
        }
    };

    let report_ip = reported_ip(session);
    let IpAddr::V4(v4) = report_ip else {
        // PASV has no encoding for IPv6; the client must use EPSV.
        error!("PASV requested on a non-IPv4 control connection");
        session.data.close().await;
        return session.send(Reply::NoDataConnection).await;
    };

    debug!("PASV listener set up on IP: {}, Port: {}", v4, addr.port());
    session
        .send(Reply::EnteringPassiveMode {
            ip: v4.octets(),
            port: addr.port(),
        })
        .await
}

/// Handles the EPSV (RFC 2428 passive mode) FTP command.
///
/// `EPSV ALL` irreversibly (for this session) disables PORT/PASV/EPRT.
pub async fn handle_epsv_command(session: &mut Session, arg: &str) -> Result<(), std::io::Error> {
    if arg.eq_ignore_ascii_case("ALL") {
        session.epsv_all = true;
        debug!("EPSV ALL accepted, address renegotiation disabled");
        return session.send(Reply::CommandOk).await;
    }
    if !arg.is_empty() {
        return session.send(Reply::IllegalArgument(arg.to_string())).await;
    }

    let data_port = session.config.server.data_port;
    match session.data.open_passive(&session.local_addr, data_port).await {
        Ok(addr) => {
            session
                .send(Reply::EnteringExtendedPassiveMode(addr.port()))
                .await
        }
        Err(e) => {
            error!("Could not create data connection (port {}): {}", data_port, e);
            session.send(Reply::NoDataConnection).await
        }
    }
}

fn reported_ip(session: &Session) -> IpAddr {
    session
        .config
        .server
        .pasv_address
        .as_deref()
        .and_then(|addr| addr.parse().ok())
        .unwrap_or_else(|| session.local_addr.ip())
}
