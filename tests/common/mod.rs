//! Shared utilities for integration testing.
//!
//! Game-server test doubles answer on ephemeral UDP ports; the gateway runs
//! on an ephemeral TCP port and stops when its `Shutdown` is triggered.

#![allow(dead_code)]

use std::net::SocketAddr;

use tokio::net::UdpSocket;

use query_gateway::config::GatewayConfig;
use query_gateway::envelope::PayloadFormat;
use query_gateway::lifecycle::{startup, Shutdown};

/// A running gateway.
pub struct TestGateway {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
}

impl TestGateway {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Config for tests: loopback listener, JSON payloads, short deadline.
pub fn test_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.query.timeout_ms = 500;
    config.query.max_timeout_ms = 1000;
    config.encoding.payload_format = PayloadFormat::Json;
    config
}

/// Start the gateway and return once it accepts connections.
pub async fn start_gateway(config: GatewayConfig) -> TestGateway {
    let ready = startup::prepare(config).await.unwrap();
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    let addr = ready.local_addr;
    tokio::spawn(async move {
        let _ = ready.server.run(ready.listener, rx).await;
    });
    TestGateway { addr, shutdown }
}

/// Quake III double answering `getstatus` with the given host name and players.
pub async fn start_quake3_server(hostname: &str, players: &[(&str, i32)]) -> u16 {
    let mut reply = b"\xFF\xFF\xFF\xFFstatusResponse\n".to_vec();
    reply.extend_from_slice(
        format!(
            "\\sv_hostname\\{hostname}\\mapname\\q3dm17\\sv_maxclients\\16\
             \\g_needpass\\0\\gamename\\baseq3\n"
        )
        .as_bytes(),
    );
    for (name, score) in players {
        reply.extend_from_slice(format!("{score} 50 \"{name}\"\n").as_bytes());
    }
    start_udp_double(move |request| {
        request
            .starts_with(b"\xFF\xFF\xFF\xFFgetstatus")
            .then(|| reply.clone())
    })
    .await
}

/// Source engine double that demands a challenge before every answer.
pub async fn start_source_server(hostname: &'static str) -> u16 {
    const CHALLENGE: [u8; 4] = [0x11, 0x22, 0x33, 0x44];

    start_udp_double(move |request| {
        let body = request.strip_prefix(&[0xFF, 0xFF, 0xFF, 0xFF])?;
        let (&kind, rest) = body.split_first()?;
        let challenged = rest.ends_with(&CHALLENGE);
        let mut reply = vec![0xFF, 0xFF, 0xFF, 0xFF];

        if !challenged {
            reply.push(b'A');
            reply.extend_from_slice(&CHALLENGE);
            return Some(reply);
        }

        match kind {
            b'T' => {
                reply.push(b'I');
                reply.push(17);
                for text in [hostname, "de_dust2", "cstrike", "Counter-Strike: Source"] {
                    reply.extend_from_slice(text.as_bytes());
                    reply.push(0);
                }
                reply.extend_from_slice(&240u16.to_le_bytes());
                reply.extend_from_slice(&[1, 24, 0, b'd', b'l', 0, 1]);
                reply.extend_from_slice(b"1.0.0.0\0");
            }
            b'U' => {
                reply.push(b'D');
                reply.push(1);
                reply.push(0);
                reply.extend_from_slice(b"Gordon\0");
                reply.extend_from_slice(&7i32.to_le_bytes());
                reply.extend_from_slice(&12.5f32.to_le_bytes());
            }
            b'V' => {
                reply.push(b'E');
                reply.extend_from_slice(&1u16.to_le_bytes());
                reply.extend_from_slice(b"mp_friendlyfire\x000\x00");
            }
            _ => return None,
        }
        Some(reply)
    })
    .await
}

/// A UDP socket that reads every datagram and never answers.
pub async fn start_silent_server() -> u16 {
    start_udp_double(|_| None).await
}

async fn start_udp_double<F>(answer: F) -> u16
where
    F: Fn(&[u8]) -> Option<Vec<u8>> + Send + 'static,
{
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let port = socket.local_addr().unwrap().port();
    tokio::spawn(async move {
        let mut buf = [0u8; 1500];
        while let Ok((len, from)) = socket.recv_from(&mut buf).await {
            if let Some(reply) = answer(&buf[..len]) {
                let _ = socket.send_to(&reply, from).await;
            }
        }
    });
    port
}
