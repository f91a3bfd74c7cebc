use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::net::{TcpStream, lookup_host};
use tokio::time::timeout;
use tracing::debug;

use vantage_common::error::TransportError;
use vantage_common::scan::outcome::PortStatus;
use vantage_common::scan::plan::{DetectionFlags, ProbeUnit, ScanMode};

use super::{ProbeReply, Prober, service_name};

/// Port used for target-only (discovery) probes, where reachability is the
/// question and the port is incidental.
const DISCOVERY_PORT: u16 = 443;

const BANNER_READ_TIMEOUT: Duration = Duration::from_millis(500);
const BANNER_MAX_BYTES: usize = 256;

/// A full TCP connect prober.
///
/// Needs no privileges: a completed handshake means `open`, an immediate
/// refusal means `closed`. No response at all is left to the session's
/// timeout, which records the unit as `filtered`.
pub struct TcpConnectProber;

#[async_trait]
impl Prober for TcpConnectProber {
    async fn probe(
        &self,
        unit: &ProbeUnit,
        deadline: Duration,
        detect: &DetectionFlags,
    ) -> Result<ProbeReply, TransportError> {
        let port = unit.port.unwrap_or(DISCOVERY_PORT);
        let addr = resolve(unit.target.as_str(), port, deadline).await?;

        match TcpStream::connect(addr).await {
            Ok(mut stream) => {
                let mut reply = ProbeReply::status(PortStatus::Open);
                if let Some(service) = service_name(port) {
                    reply = reply.with_service(service);
                }
                if detect.service_detection {
                    if let Some(banner) = grab_banner(&mut stream).await {
                        reply = reply.with_banner(banner);
                    }
                }
                Ok(reply)
            }
            Err(e) if e.kind() == std::io::ErrorKind::ConnectionRefused => {
                Ok(ProbeReply::status(PortStatus::Closed))
            }
            Err(e) => Err(TransportError::Io(e.to_string())),
        }
    }

    /// UDP and SYN scans need raw sockets this prober does not have.
    fn supports(&self, mode: ScanMode) -> bool {
        matches!(mode, ScanMode::TcpConnect | ScanMode::Discovery)
    }
}

async fn resolve(host: &str, port: u16, deadline: Duration) -> Result<SocketAddr, TransportError> {
    let lookup = lookup_host((host, port));
    match timeout(deadline, lookup).await {
        Ok(Ok(mut addrs)) => addrs
            .next()
            .ok_or_else(|| TransportError::Resolution(host.to_string())),
        Ok(Err(e)) => {
            debug!("resolution of {host} failed: {e}");
            Err(TransportError::Resolution(host.to_string()))
        }
        Err(_elapsed) => Err(TransportError::Resolution(host.to_string())),
    }
}

/// Reads whatever the service volunteers right after the handshake.
/// Services like SSH, FTP and SMTP greet first; HTTP stays silent, so a
/// short timeout keeps silent services from stalling the worker.
async fn grab_banner(stream: &mut TcpStream) -> Option<String> {
    let mut buf = [0u8; BANNER_MAX_BYTES];
    let read = timeout(BANNER_READ_TIMEOUT, stream.read(&mut buf)).await;
    match read {
        Ok(Ok(n)) if n > 0 => {
            let text = String::from_utf8_lossy(&buf[..n]);
            let line = text.lines().next()?.trim();
            (!line.is_empty()).then(|| line.to_string())
        }
        _ => None,
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;
    use vantage_common::scan::target::Target;

    fn unit(target: &str, port: u16) -> ProbeUnit {
        ProbeUnit {
            target: target.parse::<Target>().unwrap(),
            port: Some(port),
        }
    }

    #[tokio::test]
    async fn refused_port_reports_closed() {
        // Bind and drop a listener to get a port nothing is listening on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let free_port = listener.local_addr().unwrap().port();
        drop(listener);

        let reply = TcpConnectProber
            .probe(
                &unit("127.0.0.1", free_port),
                Duration::from_secs(1),
                &DetectionFlags::default(),
            )
            .await
            .unwrap();

        assert_eq!(reply.status, PortStatus::Closed);
    }

    #[tokio::test]
    async fn open_port_reports_open_with_banner() {
        use tokio::io::AsyncWriteExt;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let _ = socket.write_all(b"SSH-2.0-OpenSSH_8.2p1\r\n").await;
            }
        });

        let reply = TcpConnectProber
            .probe(
                &unit("127.0.0.1", port),
                Duration::from_secs(1),
                &DetectionFlags::default(),
            )
            .await
            .unwrap();

        assert_eq!(reply.status, PortStatus::Open);
        assert_eq!(reply.banner.as_deref(), Some("SSH-2.0-OpenSSH_8.2p1"));
    }

    #[test]
    fn declines_raw_socket_modes() {
        assert!(TcpConnectProber.supports(ScanMode::TcpConnect));
        assert!(TcpConnectProber.supports(ScanMode::Discovery));
        assert!(!TcpConnectProber.supports(ScanMode::Udp));
        assert!(!TcpConnectProber.supports(ScanMode::Syn));
    }

    #[tokio::test]
    async fn unresolvable_host_is_a_transport_error() {
        let err = TcpConnectProber
            .probe(
                &unit("host.invalid", 80),
                Duration::from_secs(1),
                &DetectionFlags::default(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::Resolution(_)));
    }
}
