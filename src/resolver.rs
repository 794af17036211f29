use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::Duration;

use log::{debug, info, warn};

use crate::error::{DnsError, Result};
use crate::structure::{build_query, DnsPacket, QueryParams};

/// Smallest receive buffer a plain UDP DNS response may need.
pub const MIN_RECV_BUFFER: usize = 512;

#[derive(Clone, Debug)]
pub struct ResolverConfig {
    pub server: String,
    pub port: u16,
    pub timeout: Duration,
    pub recv_buffer_size: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            server: "8.8.8.8".to_string(),
            port: 53,
            timeout: Duration::from_secs(5),
            recv_buffer_size: MIN_RECV_BUFFER,
        }
    }
}

/// Single-shot UDP client: one send, one receive, no retries.
pub struct Resolver {
    config: ResolverConfig,
}

impl Resolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    fn server_addr(&self) -> Result<SocketAddr> {
        let target = (self.config.server.as_str(), self.config.port);
        target
            .to_socket_addrs()
            .map_err(|e| DnsError::transport(format!("failed to resolve {}", self.config.server), e))?
            .next()
            .ok_or_else(|| {
                DnsError::transport(
                    format!("no address found for {}", self.config.server),
                    std::io::Error::new(std::io::ErrorKind::NotFound, "empty address list"),
                )
            })
    }

    /// Sends `query` to the configured server and returns the bytes of the reply.
    pub fn exchange(&self, query: &[u8]) -> Result<Vec<u8>> {
        let server = self.server_addr()?;

        let local: SocketAddr = if server.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(local).map_err(|e| DnsError::transport("failed to bind UDP socket", e))?;
        socket
            .connect(server)
            .map_err(|e| DnsError::transport(format!("failed to connect to {server}"), e))?;
        socket
            .set_read_timeout(Some(self.config.timeout))
            .and_then(|_| socket.set_write_timeout(Some(self.config.timeout)))
            .map_err(|e| DnsError::transport("failed to set socket deadline", e))?;

        let sent = socket
            .send(query)
            .map_err(|e| DnsError::transport(format!("failed to send query to {server}"), e))?;
        debug!("sent {sent} bytes to {server}");

        let mut response = vec![0u8; self.config.recv_buffer_size.max(MIN_RECV_BUFFER)];
        let n = socket.recv(&mut response).map_err(|e| {
            let context = match e.kind() {
                std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut => {
                    format!("timed out after {:?} waiting for {server}", self.config.timeout)
                }
                _ => format!("failed to read response from {server}"),
            };
            DnsError::transport(context, e)
        })?;
        debug!("received {n} bytes from {server}");

        response.truncate(n);
        Ok(response)
    }

    /// Builds the query for `domain`, performs the round trip and parses the reply.
    pub fn lookup(&self, domain: &str, params: &QueryParams) -> Result<DnsPacket> {
        let query = build_query(domain, params)?;
        info!(
            "querying {}:{} for {domain} (id {})",
            self.config.server, self.config.port, params.id
        );

        let response = self.exchange(&query)?;
        let packet = DnsPacket::from_bytes(&response)?;

        if packet.header.id != params.id {
            warn!(
                "response id {} does not match query id {}",
                packet.header.id, params.id
            );
        }

        Ok(packet)
    }
}
