use clap::{Args, Parser, Subcommand};
use serde_json::Value;

use query_gateway::envelope::{Envelope, Shape};

#[derive(Parser)]
#[command(name = "query-cli")]
#[command(about = "Query a running game-server query gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Target {
    /// Server host or address
    #[arg(long)]
    ip: String,

    /// Client (game) port
    #[arg(long)]
    c_port: u32,

    /// Query port
    #[arg(long)]
    q_port: u32,

    /// Optional service port
    #[arg(long)]
    s_port: Option<u32>,
}

#[derive(Subcommand)]
enum Commands {
    /// Query through the multi-protocol feed
    Multi {
        /// Protocol id, e.g. quake3
        #[arg(long)]
        game_type: String,

        #[command(flatten)]
        target: Target,

        #[arg(long, default_value = "/gameq_feed")]
        path: String,
    },
    /// Query through the single-library feed
    Single {
        /// Protocol id, e.g. source
        #[arg(long)]
        lgsl_type: String,

        /// Action letters, e.g. sep
        #[arg(long, default_value = "sep")]
        request: String,

        #[command(flatten)]
        target: Target,

        #[arg(long, default_value = "/lgsl_feed")]
        path: String,
    },
    /// Check the liveness endpoint
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Multi { game_type, target, path } => {
            let mut params = target_params(&target);
            params.push(("game_type", game_type));
            let res = client.get(format!("{}{}", cli.url, path)).query(&params).send().await?;
            print_envelope(Shape::Multi, res).await?;
        }
        Commands::Single { lgsl_type, request, target, path } => {
            let mut params = target_params(&target);
            params.push(("lgsl_type", lgsl_type));
            params.push(("request", request));
            let res = client.get(format!("{}{}", cli.url, path)).query(&params).send().await?;
            print_envelope(Shape::Single, res).await?;
        }
        Commands::Health => {
            let res = client.get(format!("{}/health", cli.url)).send().await?;
            println!("{} {}", res.status(), res.text().await?);
        }
    }

    Ok(())
}

fn target_params(target: &Target) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("ip", target.ip.clone()),
        ("c_port", target.c_port.to_string()),
        ("q_port", target.q_port.to_string()),
    ];
    if let Some(port) = target.s_port {
        params.push(("s_port", port.to_string()));
    }
    params
}

async fn print_envelope(
    shape: Shape,
    res: reqwest::Response,
) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
        eprintln!("Response: {}", text);
        return Ok(());
    }

    match Envelope::decode(shape, &text) {
        Some(Envelope::Failure) => println!("FAILURE"),
        Some(Envelope::Payload { body, .. }) => match serde_json::from_str::<Value>(&body) {
            Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
            Err(_) => println!("{}", body),
        },
        None => eprintln!("Error: unrecognized response: {}", text),
    }
    Ok(())
}
