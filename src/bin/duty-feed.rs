//! Development duty source.
//!
//! Serves a WebSocket endpoint that streams randomly generated duties to
//! every client that connects, then closes normally.

use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use rand::Rng;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;

use duty_dispatcher::{Category, Duty};

#[derive(Parser, Clone)]
#[command(name = "duty-feed")]
#[command(about = "Stream random duties to connecting dispatchers", long_about = None)]
struct Cli {
    /// Address to listen on.
    #[arg(short, long, default_value = "127.0.0.1:5000")]
    bind: SocketAddr,

    /// Duties per connection (0 = unlimited).
    #[arg(short, long, default_value_t = 100)]
    count: u64,

    /// Delay between duties in milliseconds.
    #[arg(short, long, default_value_t = 1000)]
    interval_ms: u64,

    /// Send only this category (wire name, e.g. PROPOSER). Random otherwise.
    #[arg(long)]
    duty: Option<String>,
}

fn random_duty(fixed: Option<&str>) -> Duty {
    let mut rng = rand::thread_rng();
    let category = match fixed {
        Some(raw) => Category::from(raw),
        None => Category::KNOWN[rng.gen_range(0..Category::KNOWN.len())].clone(),
    };
    Duty::new(
        format!("validator-{}", rng.gen_range(1..=10)),
        category,
        rng.gen_range(1..=1000),
    )
}

async fn serve(stream: TcpStream, peer: SocketAddr, cli: Cli) {
    let mut ws = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            tracing::warn!(peer = %peer, error = %e, "Handshake failed");
            return;
        }
    };
    tracing::info!(peer = %peer, "Dispatcher connected");

    let mut ticker = tokio::time::interval(Duration::from_millis(cli.interval_ms.max(1)));
    let mut sent = 0u64;

    loop {
        if cli.count != 0 && sent >= cli.count {
            break;
        }

        tokio::select! {
            _ = ticker.tick() => {
                let duty = random_duty(cli.duty.as_deref());
                let payload = match serde_json::to_string(&duty) {
                    Ok(payload) => payload,
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to encode duty");
                        break;
                    }
                };
                if let Err(e) = ws.send(Message::Text(payload.into())).await {
                    tracing::warn!(peer = %peer, error = %e, "Send failed");
                    return;
                }
                sent += 1;
                tracing::debug!(peer = %peer, duty = %duty, "Duty sent");
            }
            incoming = ws.next() => match incoming {
                Some(Ok(Message::Close(frame))) => {
                    tracing::info!(peer = %peer, frame = ?frame, sent, "Dispatcher closed connection");
                    return;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!(peer = %peer, error = %e, "Read failed");
                    return;
                }
                None => return,
            },
        }
    }

    tracing::info!(peer = %peer, sent, "Feed finished, closing");
    let _ = ws.close(None).await;
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "duty_feed=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let listener = TcpListener::bind(cli.bind).await?;
    tracing::info!(address = %listener.local_addr()?, "Duty feed listening");

    loop {
        let (stream, peer) = listener.accept().await?;
        tokio::spawn(serve(stream, peer, cli.clone()));
    }
}
