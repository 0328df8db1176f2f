//! Live-reload channel.
//!
//! Browsers connect over a WebSocket and receive a `"reload"` message every
//! time a [`Reload`] handle is notified. The client side of this is the
//! script injected by the development server.

use std::net::{TcpListener, TcpStream};
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;

use tungstenite::WebSocket;

use crate::Reload;

/// Connections kept open at once, the oldest ones are closed first.
const MAX_CLIENTS: usize = 10;

type Clients = Arc<Mutex<Vec<WebSocket<TcpStream>>>>;

pub(crate) fn start() -> std::io::Result<(Reload, u16)> {
    let (tcp, port) = reserve_port()?;
    let clients = Clients::default();
    let (reload, rx) = Reload::channel();

    let _thread_i = new_thread_ws_incoming(tcp, clients.clone());
    let _thread_o = new_thread_ws_reload(clients, rx);

    tracing::info!(port, "live-reload listening");
    Ok((reload, port))
}

fn reserve_port() -> std::io::Result<(TcpListener, u16)> {
    let listener = match TcpListener::bind("127.0.0.1:1337") {
        Ok(sock) => sock,
        Err(_) => TcpListener::bind("127.0.0.1:0")?,
    };

    let addr = listener.local_addr()?;
    let port = addr.port();
    Ok((listener, port))
}

fn new_thread_ws_incoming(server: TcpListener, clients: Clients) -> JoinHandle<()> {
    std::thread::spawn(move || {
        for stream in server.incoming() {
            let socket = match stream.map(tungstenite::accept) {
                Ok(Ok(socket)) => socket,
                Ok(Err(e)) => {
                    tracing::debug!("websocket handshake failed: {e}");
                    continue;
                }
                Err(e) => {
                    tracing::debug!("incoming connection failed: {e}");
                    continue;
                }
            };

            clients
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(socket);
        }
    })
}

fn new_thread_ws_reload(clients: Clients, rx: Receiver<()>) -> JoinHandle<()> {
    std::thread::spawn(move || {
        while rx.recv().is_ok() {
            // Coalesce notifications that piled up while broadcasting.
            while rx.try_recv().is_ok() {}

            let mut clients = clients.lock().unwrap_or_else(PoisonError::into_inner);
            broadcast(&mut clients);
        }
    })
}

fn broadcast(clients: &mut Vec<WebSocket<TcpStream>>) {
    let mut broken = vec![];

    for (i, socket) in clients.iter_mut().enumerate() {
        match socket.send("reload".into()) {
            Ok(_) => {}
            Err(tungstenite::error::Error::Io(e)) => {
                if e.kind() == std::io::ErrorKind::BrokenPipe {
                    broken.push(i);
                }
            }
            Err(tungstenite::error::Error::ConnectionClosed | tungstenite::error::Error::AlreadyClosed) => {
                broken.push(i);
            }
            Err(e) => {
                tracing::error!("Error: {e:?}");
            }
        }
    }

    for i in broken.into_iter().rev() {
        clients.remove(i);
    }

    let len = clients.len();
    if len > MAX_CLIENTS {
        for mut socket in clients.drain(0..len - MAX_CLIENTS) {
            socket.close(None).ok();
        }
    }
}
