//! Quake III test double.
//!
//! Answers every `getstatus` datagram with a fixed `statusResponse`, so the
//! gateway can be exercised without a real game server:
//!
//! ```text
//! cargo run --example mock_quake3 -- --bind 127.0.0.1:27960
//! cargo run --bin query-cli -- multi --game-type quake3 --ip 127.0.0.1 \
//!     --c-port 27960 --q-port 27960
//! ```

use clap::Parser;
use tokio::net::UdpSocket;

const REQUEST: &[u8] = b"\xFF\xFF\xFF\xFFgetstatus";

#[derive(Parser)]
#[command(name = "mock_quake3", about = "Fake Quake III server for local testing")]
struct Args {
    #[arg(long, default_value = "127.0.0.1:27960")]
    bind: String,

    #[arg(long, default_value = "Mock Arena")]
    hostname: String,

    #[arg(long, default_value = "q3dm17")]
    map: String,

    /// Player names to report
    #[arg(long = "player")]
    players: Vec<String>,
}

fn status_response(args: &Args) -> Vec<u8> {
    let mut out = b"\xFF\xFF\xFF\xFFstatusResponse\n".to_vec();
    out.extend_from_slice(
        format!(
            "\\sv_hostname\\{}\\mapname\\{}\\sv_maxclients\\16\\g_needpass\\0\\gamename\\baseq3\n",
            args.hostname, args.map
        )
        .as_bytes(),
    );
    for (i, name) in args.players.iter().enumerate() {
        out.extend_from_slice(format!("{} {} \"{}\"\n", i * 5, 40 + i, name).as_bytes());
    }
    out
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();

    let socket = UdpSocket::bind(&args.bind).await?;
    tracing::info!(address = %socket.local_addr()?, "Mock Quake III server listening");

    let reply = status_response(&args);
    let mut buf = [0u8; 1400];
    loop {
        let (len, from) = socket.recv_from(&mut buf).await?;
        if !buf[..len].starts_with(REQUEST) {
            tracing::debug!(%from, "Ignoring unknown datagram");
            continue;
        }
        tracing::info!(%from, "getstatus");
        socket.send_to(&reply, from).await?;
    }
}
