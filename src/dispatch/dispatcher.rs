//! Single bounded live query.
//!
//! # Responsibilities
//! - Choose the port the descriptor connects to
//! - Resolve the host and open the descriptor's transport
//! - Run the plugin exchange under one deadline
//! - Shape the plugin's status for the requested action

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use tokio::net::lookup_host;
use tokio::time;

use super::{Link, QueryError};
use crate::config::QueryConfig;
use crate::envelope::Shape;
use crate::observability::metrics;
use crate::protocol::{PortRole, ProtocolDescriptor, QueryResult, QueryTarget};
use crate::query::QueryRequest;

/// Executes validated requests against live servers.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    config: QueryConfig,
}

impl Dispatcher {
    pub fn new(config: QueryConfig) -> Self {
        Self { config }
    }

    /// Deadline for one query, never above the configured ceiling.
    ///
    /// The multi feed always uses the configured default; only the single
    /// feed honours a descriptor's own timeout.
    pub fn deadline_for(&self, shape: Shape, descriptor: &ProtocolDescriptor) -> Duration {
        let ceiling = Duration::from_millis(self.config.max_timeout_ms);
        let default = Duration::from_millis(self.config.timeout_ms);
        let deadline = match shape {
            Shape::Multi => default,
            Shape::Single => descriptor.timeout().unwrap_or(default),
        };
        deadline.min(ceiling)
    }

    /// Perform exactly one live query.
    pub async fn dispatch(
        &self,
        shape: Shape,
        request: &QueryRequest,
        descriptor: &ProtocolDescriptor,
    ) -> Result<QueryResult, QueryError> {
        let deadline = self.deadline_for(shape, descriptor);
        let started = Instant::now();

        let outcome = match time::timeout(deadline, self.execute(request, descriptor)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(QueryError::Timeout(deadline)),
        };

        metrics::record_query(descriptor.id(), outcome.is_ok(), started);
        tracing::debug!(
            protocol = %descriptor.id(),
            host = %request.host(),
            port = request.query_port(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            ok = outcome.is_ok(),
            "Query finished"
        );
        outcome
    }

    async fn execute(
        &self,
        request: &QueryRequest,
        descriptor: &ProtocolDescriptor,
    ) -> Result<QueryResult, QueryError> {
        let port = select_port(descriptor.port_role(), request);
        let port = u16::try_from(port).map_err(|_| QueryError::UnusablePort(port))?;
        let peer = resolve(request.host(), port).await?;

        let mut link = Link::open(descriptor.transport(), peer, self.config.max_packet_bytes)
            .await
            .map_err(QueryError::Connect)?;

        let target = QueryTarget {
            host: request.host().to_string(),
            peer,
            client_port: request.client_port(),
            query_port: request.query_port(),
            service_port: request.service_port(),
            action: request.action().cloned(),
        };

        let status = descriptor.plugin().query(&mut link, &target).await?;
        Ok(status.into_result(request.action()))
    }
}

fn select_port(role: PortRole, request: &QueryRequest) -> u32 {
    match role {
        PortRole::Query => request.query_port(),
        PortRole::Client => request.client_port(),
        PortRole::Service => request.service_port().unwrap_or(request.query_port()),
    }
}

/// Resolve a reduced host; IPv6 literals arrive bracketed.
async fn resolve(host: &str, port: u16) -> Result<SocketAddr, QueryError> {
    let bare = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);

    lookup_host((bare, port))
        .await
        .map_err(QueryError::Resolve)?
        .next()
        .ok_or_else(|| QueryError::NoAddress(host.to_string()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use tokio::net::UdpSocket;

    use super::*;
    use crate::protocol::{
        ProtocolError, ProtocolPlugin, ProtocolRegistry, ServerStatus, Transport,
    };
    use crate::query::{MultiParams, SingleParams, Validator};

    /// Echoes the reply datagram back as the host name.
    #[derive(Debug)]
    struct EchoPlugin;

    #[async_trait]
    impl ProtocolPlugin for EchoPlugin {
        fn family(&self) -> &'static str {
            "echo"
        }

        async fn query(
            &self,
            link: &mut Link,
            _target: &QueryTarget,
        ) -> Result<ServerStatus, ProtocolError> {
            link.send(b"status").await?;
            let reply = link.recv().await?;
            let mut status = ServerStatus::default();
            let hostname = String::from_utf8_lossy(&reply).into_owned();
            status.server.insert("hostname".into(), hostname.into());
            Ok(status)
        }
    }

    fn config(timeout_ms: u64) -> QueryConfig {
        QueryConfig {
            timeout_ms,
            max_timeout_ms: 5000,
            max_packet_bytes: 1400,
        }
    }

    fn registry() -> ProtocolRegistry {
        ProtocolRegistry::from_descriptors([
            ProtocolDescriptor::new("echo", "Echo", Arc::new(EchoPlugin), Transport::Udp)
                .with_actions("s"),
            ProtocolDescriptor::new("slow", "Slow", Arc::new(EchoPlugin), Transport::Udp)
                .with_timeout(Duration::from_secs(60)),
            ProtocolDescriptor::new("svc", "Svc", Arc::new(EchoPlugin), Transport::Udp)
                .with_port_role(PortRole::Service),
        ])
        .unwrap()
    }

    fn params(protocol: &str, port: u16) -> MultiParams {
        MultiParams {
            game_type: Some(protocol.into()),
            ip: Some("127.0.0.1".into()),
            c_port: Some(port.to_string()),
            q_port: Some(port.to_string()),
            s_port: None,
        }
    }

    async fn echo_server(reply: &'static [u8]) -> u16 {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = socket.local_addr().unwrap().port();
        tokio::spawn(async move {
            let mut buf = [0u8; 64];
            while let Ok((_, from)) = socket.recv_from(&mut buf).await {
                let _ = socket.send_to(reply, from).await;
            }
        });
        port
    }

    #[test]
    fn test_deadline_is_clamped() {
        let registry = registry();
        let dispatcher = Dispatcher::new(config(250));
        let echo = registry.get("echo").unwrap();
        let slow = registry.get("slow").unwrap();
        assert_eq!(dispatcher.deadline_for(Shape::Single, echo), Duration::from_millis(250));
        assert_eq!(dispatcher.deadline_for(Shape::Single, slow), Duration::from_secs(5));
    }

    #[test]
    fn test_multi_deadline_ignores_descriptor_timeout() {
        let registry = registry();
        let dispatcher = Dispatcher::new(config(250));
        let slow = registry.get("slow").unwrap();
        assert_eq!(dispatcher.deadline_for(Shape::Multi, slow), Duration::from_millis(250));

        let mut capped = config(9000);
        capped.max_timeout_ms = 1000;
        let dispatcher = Dispatcher::new(capped);
        assert_eq!(dispatcher.deadline_for(Shape::Multi, slow), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_multi_dispatch_uses_default_deadline() {
        let registry = registry();
        let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = silent.local_addr().unwrap().port();
        let (request, descriptor) = Validator::new(&registry).multi(&params("slow", port)).unwrap();

        let started = Instant::now();
        let err = Dispatcher::new(config(200))
            .dispatch(Shape::Multi, &request, descriptor)
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::Timeout(d) if d == Duration::from_millis(200)));
        assert!(started.elapsed() < Duration::from_secs(2));
        drop(silent);
    }

    #[tokio::test]
    async fn test_dispatch_success() {
        let registry = registry();
        let port = echo_server(b"Echo Arena").await;
        let (request, descriptor) = Validator::new(&registry).multi(&params("echo", port)).unwrap();

        let result = Dispatcher::new(config(1000))
            .dispatch(Shape::Multi, &request, descriptor)
            .await
            .unwrap();
        assert_eq!(result["hostname"].as_text(), Some("Echo Arena"));
        assert!(result["players"].as_list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_shapes_by_action() {
        let registry = registry();
        let port = echo_server(b"Sectioned").await;
        let request = SingleParams {
            lgsl_type: Some("echo".into()),
            ip: Some("127.0.0.1".into()),
            c_port: Some(port.to_string()),
            q_port: Some(port.to_string()),
            s_port: None,
            request: Some("s".into()),
        };
        let (request, descriptor) = Validator::new(&registry).single(&request).unwrap();

        let result = Dispatcher::new(config(1000))
            .dispatch(Shape::Single, &request, descriptor)
            .await
            .unwrap();
        let section = result["s"].as_map().unwrap();
        assert_eq!(section["hostname"].as_text(), Some("Sectioned"));
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        let registry = registry();
        let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = silent.local_addr().unwrap().port();
        let (request, descriptor) = Validator::new(&registry).multi(&params("echo", port)).unwrap();

        let started = Instant::now();
        let err = Dispatcher::new(config(200))
            .dispatch(Shape::Multi, &request, descriptor)
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::Timeout(d) if d == Duration::from_millis(200)));
        assert!(started.elapsed() < Duration::from_secs(2));
        drop(silent);
    }

    #[tokio::test]
    async fn test_port_above_u16_fails() {
        let registry = registry();
        let mut p = params("echo", 27960);
        p.q_port = Some("70000".into());
        let (request, descriptor) = Validator::new(&registry).multi(&p).unwrap();

        let err = Dispatcher::new(config(200))
            .dispatch(Shape::Multi, &request, descriptor)
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::UnusablePort(70000)));
    }

    #[tokio::test]
    async fn test_service_role_falls_back_to_query_port() {
        let registry = registry();
        let port = echo_server(b"Service").await;
        let (request, descriptor) = Validator::new(&registry).multi(&params("svc", port)).unwrap();

        let result = Dispatcher::new(config(1000))
            .dispatch(Shape::Multi, &request, descriptor)
            .await
            .unwrap();
        assert_eq!(result["hostname"].as_text(), Some("Service"));
    }

    #[tokio::test]
    async fn test_unresolvable_host_fails() {
        let registry = registry();
        let mut p = params("echo", 27960);
        p.ip = Some("no-such-host.invalid".into());
        let (request, descriptor) = Validator::new(&registry).multi(&p).unwrap();

        let err = Dispatcher::new(config(3000))
            .dispatch(Shape::Multi, &request, descriptor)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            QueryError::Resolve(_) | QueryError::NoAddress(_) | QueryError::Timeout(_)
        ));
    }
}
