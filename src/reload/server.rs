//! Live-reload WebSocket listener.
//!
//! A plain thread accepts TCP connections and hands each one to the
//! ReloadActor, which does the handshake and owns the client from then on.

use std::io::ErrorKind;
use std::net::{TcpListener, TcpStream};
use std::time::Duration;

use anyhow::{Result, bail};
use tokio::sync::mpsc;

use crate::actor::messages::ReloadMsg;

/// Ports tried, starting at the configured one.
const PORT_ATTEMPTS: u16 = 10;

const ACCEPT_POLL: Duration = Duration::from_millis(100);

/// Bind and start accepting. Returns the bound port, which differs from
/// `port` when that one is taken.
pub fn start_ws_server(port: u16, reload_tx: mpsc::Sender<ReloadMsg>) -> Result<u16> {
    let listener = bind_from(port, PORT_ATTEMPTS)?;
    let bound = listener.local_addr()?.port();
    if bound != port {
        crate::log!("reload"; "port {} taken, listening on {}", port, bound);
    }

    listener.set_nonblocking(true)?;
    std::thread::spawn(move || accept_loop(&listener, &reload_tx));
    Ok(bound)
}

/// Runs until the ReloadActor drops its receiver.
fn accept_loop(listener: &TcpListener, reload_tx: &mpsc::Sender<ReloadMsg>) {
    while !reload_tx.is_closed() {
        match listener.accept() {
            Ok((stream, peer)) => {
                crate::debug!("reload"; "browser connected from {}", peer);
                if hand_over(stream, reload_tx).is_err() {
                    return;
                }
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => std::thread::sleep(ACCEPT_POLL),
            Err(e) => {
                crate::log!("reload"; "accept failed: {}", e);
                std::thread::sleep(ACCEPT_POLL);
            }
        }
    }
}

fn hand_over(stream: TcpStream, reload_tx: &mpsc::Sender<ReloadMsg>) -> Result<(), ()> {
    // tungstenite's blocking handshake needs a blocking socket
    stream.set_nonblocking(false).ok();
    reload_tx.blocking_send(ReloadMsg::AddClient(stream)).map_err(drop)
}

fn bind_from(port: u16, attempts: u16) -> Result<TcpListener> {
    let mut last = None;
    for candidate in (0..attempts).map(|i| port.saturating_add(i)) {
        match TcpListener::bind(("127.0.0.1", candidate)) {
            Ok(listener) => return Ok(listener),
            Err(e) => last = Some(e),
        }
    }
    match last {
        Some(e) => bail!("no free reload port in {}..{}: {}", port, port.saturating_add(attempts), e),
        None => bail!("no reload port to try"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_taken_port_skipped() {
        let taken = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = taken.local_addr().unwrap().port();

        let listener = bind_from(port, 3).unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), port);
    }
}
