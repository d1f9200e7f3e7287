use crate::domain::{Authentication, Endpoint};
use crate::probe::{ConnectivityProbe, ProbeError, ProbeOutcome};
use async_trait::async_trait;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Treats a source as available when a TCP connection to its endpoint can be opened.
#[derive(Clone, Debug)]
pub struct TcpConnectProbe {
    timeout: Duration,
}

impl TcpConnectProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl ConnectivityProbe for TcpConnectProbe {
    async fn probe(
        &self,
        endpoint: &Endpoint,
        _authentication: &Authentication,
    ) -> Result<ProbeOutcome, ProbeError> {
        let Some(host) = endpoint.host.as_deref().filter(|host| !host.is_empty()) else {
            return Ok(ProbeOutcome::unavailable(format!(
                "Endpoint id {} has no host",
                endpoint.id
            )));
        };
        let Some(port) = endpoint.effective_port() else {
            return Ok(ProbeOutcome::unavailable(format!(
                "Endpoint id {} has no port",
                endpoint.id
            )));
        };

        let address = format!("{host}:{port}");
        match timeout(self.timeout, TcpStream::connect(address.as_str())).await {
            Ok(Ok(_stream)) => Ok(ProbeOutcome::available()),
            Ok(Err(err)) => Ok(ProbeOutcome::unavailable(format!(
                "Unable to connect to {address}: {err}"
            ))),
            Err(_) => Ok(ProbeOutcome::unavailable(format!(
                "Timed out connecting to {address} after {}ms",
                self.timeout.as_millis()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AvailabilityStatus;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn open_port_is_available() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("local addr").port();

        let mut endpoint = Endpoint::new("5");
        endpoint.host = Some("127.0.0.1".to_string());
        endpoint.port = Some(port);

        let outcome = TcpConnectProbe::new(Duration::from_secs(2))
            .probe(&endpoint, &Authentication::new("9"))
            .await
            .expect("probe runs");
        assert_eq!(outcome.status, AvailabilityStatus::Available);
    }

    #[tokio::test]
    async fn endpoint_without_host_is_unavailable() {
        let outcome = TcpConnectProbe::new(Duration::from_secs(1))
            .probe(&Endpoint::new("5"), &Authentication::new("9"))
            .await
            .expect("probe runs");
        assert_eq!(outcome.status, AvailabilityStatus::Unavailable);
        assert_eq!(
            outcome.error_message.as_deref(),
            Some("Endpoint id 5 has no host")
        );
    }
}
