// Copyright 2022 Zinc Labs Inc. and Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::net::{Ipv6Addr, SocketAddr};
use std::sync::Arc;

use bytes::Bytes;
use socket2::{Domain, Protocol, Socket, Type};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::unix::pipe;
use tokio::net::{TcpListener, TcpStream, UdpSocket, UnixListener, UnixStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::common::json;
use crate::infra::config::CONFIG;
use crate::infra::errors::Error;
use crate::meta::alerts::Entry;
use crate::meta::protocol::{Request, Response};
use crate::service::{alerts, notifications};

pub mod session;

const RECV_BUFFER_SIZE: usize = 1024;

pub enum SessionEvent {
    Data { id: u64, bytes: Bytes },
    Closed { id: u64 },
}

/// One connected stream session. The write half and the per-session
/// authentication flag live here, owned by the dispatcher; the read half
/// runs in a detached task that feeds [`SessionEvent`]s back.
pub struct StreamClient {
    pub id: u64,
    pub addr: SocketAddr,
    pub authenticated: bool,
    writer: OwnedWriteHalf,
    reader: JoinHandle<()>,
}

impl StreamClient {
    pub async fn send(&mut self, response: &Response) -> crate::infra::errors::Result<()> {
        let payload = json::to_vec(response)?;
        self.send_raw(&payload).await
    }

    pub async fn send_raw(&mut self, bytes: &[u8]) -> crate::infra::errors::Result<()> {
        self.writer.write_all(bytes).await.map_err(|_| Error::PeerGone)
    }

    /// Peer address for logs, with IPv4-mapped IPv6 shown as plain IPv4.
    pub fn display_ip(&self) -> String {
        display_ip(&self.addr)
    }
}

pub(crate) fn display_ip(addr: &SocketAddr) -> String {
    match addr.ip() {
        std::net::IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => v4.to_string(),
            None => v6.to_string(),
        },
        ip => ip.to_string(),
    }
}

/// The server core: one cooperative task multiplexing the stream listener,
/// the datagram socket, the emergency unix socket, the alert FIFO, and the
/// per-client reader events. Every request handler and every store write
/// runs on this task, so responses keep request order per session and the
/// store has a single writer.
pub struct Dispatcher {
    tcp: TcpListener,
    udp: Arc<UdpSocket>,
    emergency: UnixListener,
    fifo: pipe::Receiver,
    clients: Vec<StreamClient>,
    udp_peers: Vec<SocketAddr>,
    events_tx: mpsc::Sender<SessionEvent>,
    events_rx: mpsc::Receiver<SessionEvent>,
    shutdown: CancellationToken,
    next_client_id: u64,
}

enum Ready {
    Accepted(std::io::Result<(TcpStream, SocketAddr)>),
    Datagram(std::io::Result<(usize, SocketAddr)>),
    Emergency(std::io::Result<UnixStream>),
    Fifo(std::io::Result<usize>),
    Session(Option<SessionEvent>),
    Interrupt,
    Cancelled,
}

impl Dispatcher {
    pub async fn bind(
        tcp_port: u16,
        udp_port: u16,
        shutdown: CancellationToken,
    ) -> Result<Dispatcher, anyhow::Error> {
        let tcp = dual_stack_tcp(tcp_port, CONFIG.net.backlog)?;
        let udp = Arc::new(dual_stack_udp(udp_port)?);
        let emergency = bind_emergency_socket(&CONFIG.emergency.socket_path)?;
        let fifo = open_alert_fifo(&CONFIG.alert.fifo_path)?;
        let (events_tx, events_rx) = mpsc::channel(64);
        log::info!("TCP listener on port {}", tcp.local_addr()?.port());
        log::info!("UDP listener on port {}", udp.local_addr()?.port());
        Ok(Dispatcher {
            tcp,
            udp,
            emergency,
            fifo,
            clients: Vec::new(),
            udp_peers: Vec::new(),
            events_tx,
            events_rx,
            shutdown,
            next_client_id: 1,
        })
    }

    /// Bound listener addresses, mainly for tests binding port 0.
    pub fn local_addrs(&self) -> Result<(SocketAddr, SocketAddr), anyhow::Error> {
        Ok((self.tcp.local_addr()?, self.udp.local_addr()?))
    }

    pub async fn run(mut self) -> Result<(), anyhow::Error> {
        let mut udp_buf = vec![0u8; RECV_BUFFER_SIZE];
        let mut fifo_buf = vec![0u8; RECV_BUFFER_SIZE];
        loop {
            let ready = tokio::select! {
                ret = self.tcp.accept() => Ready::Accepted(ret),
                ret = self.udp.recv_from(&mut udp_buf) => Ready::Datagram(ret),
                ret = self.emergency.accept() => Ready::Emergency(ret.map(|(stream, _)| stream)),
                ret = self.fifo.read(&mut fifo_buf) => Ready::Fifo(ret),
                ev = self.events_rx.recv() => Ready::Session(ev),
                _ = tokio::signal::ctrl_c() => Ready::Interrupt,
                _ = self.shutdown.cancelled() => Ready::Cancelled,
            };
            match ready {
                Ready::Accepted(Ok((stream, addr))) => self.register_client(stream, addr),
                Ready::Accepted(Err(e)) => log::error!("Error accepting connection: {e}"),
                Ready::Datagram(Ok((len, peer))) => {
                    let bytes = udp_buf[..len].to_vec();
                    self.handle_datagram(&bytes, peer).await;
                }
                Ready::Datagram(Err(e)) => log::error!("Error receiving datagram: {e}"),
                Ready::Emergency(Ok(stream)) => self.handle_emergency(stream).await,
                Ready::Emergency(Err(e)) => {
                    log::error!("Error accepting emergency connection: {e}")
                }
                Ready::Fifo(Ok(len)) if len > 0 => {
                    let line = String::from_utf8_lossy(&fifo_buf[..len]).to_string();
                    self.handle_alert(&line).await;
                }
                // writer side closed; the read-write descriptor stays usable
                Ready::Fifo(Ok(_)) => {}
                Ready::Fifo(Err(e)) => log::error!("Error reading from FIFO: {e}"),
                Ready::Session(Some(SessionEvent::Data { id, bytes })) => {
                    self.handle_stream_data(id, &bytes).await;
                }
                Ready::Session(Some(SessionEvent::Closed { id })) => self.remove_client(id),
                Ready::Session(None) => {}
                Ready::Interrupt => {
                    log::info!("Shutting down server...");
                    self.shutdown.cancel();
                }
                Ready::Cancelled => break,
            }
        }
        for client in &self.clients {
            client.reader.abort();
        }
        Ok(())
    }

    fn register_client(&mut self, stream: TcpStream, addr: SocketAddr) {
        let ip = display_ip(&addr);
        if self.clients.len() >= CONFIG.common.max_tcp_clients {
            // dropping the socket closes the connection
            log::warn!("Rejecting TCP client {ip}: {}", Error::ResourceExhausted);
            return;
        }
        let id = self.next_client_id;
        self.next_client_id += 1;
        let (read_half, writer) = stream.into_split();
        let reader = tokio::spawn(read_loop(id, read_half, self.events_tx.clone()));
        self.clients.push(StreamClient {
            id,
            addr,
            authenticated: false,
            writer,
            reader,
        });
        let family = if ip.contains(':') { "IPv6" } else { "IPv4" };
        log::info!("New TCP {family} client connected from IP: {ip}");
        log::info!("Added TCP client. Total connected: {}", self.clients.len());
    }

    fn remove_client(&mut self, id: u64) {
        if let Some(pos) = self.clients.iter().position(|c| c.id == id) {
            let client = self.clients.remove(pos);
            client.reader.abort();
            log::info!(
                "TCP client disconnected from IP: {}. Total connected: {}",
                display_ip(&client.addr),
                self.clients.len()
            );
        }
    }

    async fn handle_stream_data(&mut self, id: u64, bytes: &[u8]) {
        let request = match json::from_slice::<Request>(bytes) {
            Ok(request) => request,
            Err(e) => {
                log::warn!(
                    "Dropping message from TCP client: {}",
                    Error::Protocol(e.to_string())
                );
                return;
            }
        };
        let Some(pos) = self.clients.iter().position(|c| c.id == id) else {
            return;
        };
        if let Err(e) = session::handle_stream_request(&mut self.clients[pos], request).await {
            match e {
                Error::PeerGone => self.remove_client(id),
                e => log::error!("TCP request failed: {e}"),
            }
        }
    }

    async fn handle_datagram(&mut self, bytes: &[u8], peer: SocketAddr) {
        let value = match json::from_slice::<json::Value>(bytes) {
            Ok(value) => value,
            Err(e) => {
                log::warn!(
                    "Dropping datagram from {peer}: {}",
                    Error::Protocol(e.to_string())
                );
                return;
            }
        };
        // datagrams are processed only when both fields are present
        if value.get("message").is_none() || value.get("hostname").is_none() {
            log::warn!("Dropping datagram from {peer} without message/hostname fields");
            return;
        }
        self.cache_udp_peer(peer);
        let request = match json::from_value::<Request>(value) {
            Ok(request) => request,
            Err(e) => {
                log::warn!(
                    "Dropping datagram from {peer}: {}",
                    Error::Protocol(e.to_string())
                );
                return;
            }
        };
        if let Err(e) = session::handle_datagram_request(self.udp.as_ref(), peer, request).await {
            log::error!("UDP request failed: {e}");
        }
    }

    fn cache_udp_peer(&mut self, peer: SocketAddr) {
        if self.udp_peers.contains(&peer) {
            return;
        }
        if self.udp_peers.len() >= CONFIG.common.max_udp_peers {
            log::warn!("Not caching UDP client {peer}: {}", Error::ResourceExhausted);
            return;
        }
        self.udp_peers.push(peer);
        log::info!("Added UDP client. Total cached: {}", self.udp_peers.len());
    }

    /// One FIFO-ready pass: persist the alert, then push it to every known
    /// peer on both carriers before the next readiness wait.
    async fn handle_alert(&mut self, line: &str) {
        log::info!("{line}");
        self.broadcast_stream(&Response::Alert {
            alert_description: line.to_string(),
        })
        .await;
        self.broadcast_datagram(line.as_bytes()).await;
        log::info!("Sent alert notification to all connected clients");
        match alerts::save(line).await {
            Ok(key) => log::info!("Alert message written to store with key: {key}"),
            Err(e) => log::error!("Error writing alert message to store: {e}"),
        }
        if let Some(entry) = Entry::detect(line) {
            log::info!("Detected alert at entry: {entry}");
        }
    }

    async fn handle_emergency(&mut self, mut stream: UnixStream) {
        let mut buf = vec![0u8; RECV_BUFFER_SIZE];
        match stream.read(&mut buf).await {
            Ok(len) if len > 0 => {
                let message = String::from_utf8_lossy(&buf[..len]).to_string();
                log::info!("{message}");
                match notifications::save(&message).await {
                    Ok(key) => {
                        log::info!("Emergency notification written to store with key: {key}")
                    }
                    Err(e) => log::error!("Error writing emergency notification to store: {e}"),
                }
                self.broadcast_stream(&Response::Disconnect).await;
                self.shutdown.cancel();
            }
            Ok(_) => {}
            Err(e) => log::error!("Error reading emergency notification: {e}"),
        }
    }

    /// Serializes once and pushes to every stream client; a failing client
    /// is logged and skipped, its removal is driven by its reader task.
    async fn broadcast_stream(&mut self, response: &Response) {
        let payload = match json::to_vec(response) {
            Ok(payload) => payload,
            Err(e) => {
                log::error!("Error serializing broadcast: {e}");
                return;
            }
        };
        for client in &mut self.clients {
            if let Err(e) = client.writer.write_all(&payload).await {
                log::warn!(
                    "Broadcast to TCP client {} failed: {e}",
                    display_ip(&client.addr)
                );
            }
        }
    }

    async fn broadcast_datagram(&self, bytes: &[u8]) {
        for peer in &self.udp_peers {
            let _ = self.udp.send_to(bytes, *peer).await;
        }
    }
}

async fn read_loop(id: u64, mut reader: OwnedReadHalf, tx: mpsc::Sender<SessionEvent>) {
    let mut buf = vec![0u8; RECV_BUFFER_SIZE];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) | Err(_) => {
                let _ = tx.send(SessionEvent::Closed { id }).await;
                break;
            }
            Ok(len) => {
                let bytes = Bytes::copy_from_slice(&buf[..len]);
                if tx.send(SessionEvent::Data { id, bytes }).await.is_err() {
                    break;
                }
            }
        }
    }
}

fn dual_stack_tcp(port: u16, backlog: i32) -> std::io::Result<TcpListener> {
    let socket = Socket::new(Domain::IPV6, Type::STREAM, Some(Protocol::TCP))?;
    socket.set_only_v6(false)?;
    socket.set_reuse_address(true)?;
    socket.bind(&SocketAddr::from((Ipv6Addr::UNSPECIFIED, port)).into())?;
    socket.listen(backlog)?;
    socket.set_nonblocking(true)?;
    TcpListener::from_std(socket.into())
}

fn dual_stack_udp(port: u16) -> std::io::Result<UdpSocket> {
    let socket = Socket::new(Domain::IPV6, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_only_v6(false)?;
    socket.bind(&SocketAddr::from((Ipv6Addr::UNSPECIFIED, port)).into())?;
    socket.set_nonblocking(true)?;
    UdpSocket::from_std(socket.into())
}

fn bind_emergency_socket(path: &str) -> std::io::Result<UnixListener> {
    if let Err(e) = std::fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            return Err(e);
        }
    }
    UnixListener::bind(path)
}

/// Opens the read end of the alert FIFO, creating it first when absent.
/// Opened read-write so the descriptor outlives producer churn instead of
/// signalling end-of-file after every writer.
fn open_alert_fifo(path: &str) -> std::io::Result<pipe::Receiver> {
    if let Err(e) = nix::unistd::mkfifo(path, nix::sys::stat::Mode::from_bits_truncate(0o666)) {
        if e != nix::errno::Errno::EEXIST {
            return Err(std::io::Error::from(e));
        }
    }
    pipe::OpenOptions::new().read_write(true).open_receiver(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_ip_unwraps_v4_mapped_addresses() {
        let mapped: SocketAddr = "[::ffff:192.0.2.7]:4242".parse().unwrap();
        assert_eq!(display_ip(&mapped), "192.0.2.7");

        let v6: SocketAddr = "[2001:db8::1]:4242".parse().unwrap();
        assert_eq!(display_ip(&v6), "2001:db8::1");

        let v4: SocketAddr = "192.0.2.9:4242".parse().unwrap();
        assert_eq!(display_ip(&v4), "192.0.2.9");
    }
}
