use crate::error::MetricsError;
use std::{
    future::Future,
    io,
    net::{Ipv4Addr, Ipv6Addr, SocketAddr},
};
use tokio::{
    net::{UdpSocket, lookup_host},
    sync::OnceCell,
};

/// Default address of the ffwd agent.
pub const FFWD_IP: &str = "127.0.0.1";
/// Default port of the ffwd agent's JSON input.
pub const FFWD_PORT: u16 = 19000;

/// Delivers serialized metric records to the collector.
///
/// Sends are fire-and-forget: an `Ok` only means the payload was handed to
/// the network, never that the collector received it.
pub trait Transport: Send + Sync + 'static {
    /// Sends one payload, suspending the calling task until the write
    /// completes or fails.
    fn send(&self, payload: Vec<u8>) -> impl Future<Output = Result<(), MetricsError>> + Send;
}

/// Sends one UDP datagram per record to the ffwd agent.
///
/// The host is resolved on every send. A local socket is bound per address
/// family on first use and then shared by every send to that family, so a
/// host that moves between IPv4 and IPv6 keeps working.
#[derive(Debug)]
pub struct UdpTransport {
    host: String,
    port: u16,
    v4: OnceCell<UdpSocket>,
    v6: OnceCell<UdpSocket>,
}

impl UdpTransport {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            v4: OnceCell::new(),
            v6: OnceCell::new(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub const fn port(&self) -> u16 {
        self.port
    }

    async fn resolve(&self) -> Result<SocketAddr, MetricsError> {
        lookup_host((self.host.as_str(), self.port))
            .await?
            .next()
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::AddrNotAvailable,
                    format!("{}:{} did not resolve to any address", self.host, self.port),
                )
                .into()
            })
    }

    async fn socket_for(&self, target: SocketAddr) -> Result<&UdpSocket, MetricsError> {
        let cell = if target.is_ipv4() { &self.v4 } else { &self.v6 };
        cell.get_or_try_init(|| bind_local(target)).await
    }
}

async fn bind_local(target: SocketAddr) -> Result<UdpSocket, MetricsError> {
    let local: SocketAddr = if target.is_ipv4() {
        (Ipv4Addr::UNSPECIFIED, 0).into()
    } else {
        (Ipv6Addr::UNSPECIFIED, 0).into()
    };
    let socket = UdpSocket::bind(local).await?;
    log::debug!("bound {} for metrics to {target}", socket.local_addr()?);
    Ok(socket)
}

impl Transport for UdpTransport {
    fn send(&self, payload: Vec<u8>) -> impl Future<Output = Result<(), MetricsError>> + Send {
        async move {
            let target = self.resolve().await?;
            let socket = self.socket_for(target).await?;
            let written = socket.send_to(&payload, target).await?;
            if written < payload.len() {
                return Err(MetricsError::Truncated {
                    written,
                    len: payload.len(),
                });
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delivers_payload_as_single_datagram() {
        let collector = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = collector.local_addr().unwrap().port();
        let transport = UdpTransport::new("127.0.0.1", port);

        transport.send(b"{\"key\":\"a\"}".to_vec()).await.unwrap();

        let mut buf = [0u8; 64];
        let (len, _) = collector.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..len], b"{\"key\":\"a\"}");
    }

    #[tokio::test]
    async fn reuses_socket_across_sends() {
        let collector = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = collector.local_addr().unwrap().port();
        let transport = UdpTransport::new("127.0.0.1", port);

        transport.send(b"1".to_vec()).await.unwrap();
        transport.send(b"2".to_vec()).await.unwrap();

        let mut buf = [0u8; 8];
        let (_, first) = collector.recv_from(&mut buf).await.unwrap();
        let (_, second) = collector.recv_from(&mut buf).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn binds_one_socket_per_address_family() {
        let transport = UdpTransport::new("localhost", FFWD_PORT);
        let v4_target: SocketAddr = (Ipv4Addr::LOCALHOST, FFWD_PORT).into();

        let v4 = transport.socket_for(v4_target).await.unwrap();
        assert!(v4.local_addr().unwrap().is_ipv4());

        // Hosts without IPv6 cannot bind `[::]:0`; that must not disturb IPv4.
        if let Ok(v6) = transport
            .socket_for((Ipv6Addr::LOCALHOST, FFWD_PORT).into())
            .await
        {
            assert!(v6.local_addr().unwrap().is_ipv6());
        }

        let again = transport.socket_for(v4_target).await.unwrap();
        assert_eq!(again.local_addr().unwrap(), v4.local_addr().unwrap());
    }

    #[tokio::test]
    async fn unresolvable_host_is_an_error() {
        let transport = UdpTransport::new("host.invalid", FFWD_PORT);

        assert!(transport.send(b"x".to_vec()).await.is_err());
    }

    #[tokio::test]
    async fn oversized_datagram_is_an_error() {
        let transport = UdpTransport::new("127.0.0.1", FFWD_PORT);

        assert!(matches!(
            transport.send(vec![b'x'; 70_000]).await,
            Err(MetricsError::Io(_))
        ));
    }
}
