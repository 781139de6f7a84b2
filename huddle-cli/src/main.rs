mod probe_media;

use anyhow::{Result, bail};
use clap::Parser;
use colored::*;
use probe_media::ProbeMedia;
use huddle_client::{
    ClientConfig, ClientEvent, ConnectionStatus, DisconnectReason, IdentityPolicy, LinearBackoff,
    MediaCapability, spawn_ws_client,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Join a huddle room and print what happens in it.
#[derive(Parser, Debug)]
#[command(name = "huddle-probe", version)]
struct Args {
    /// Room to join.
    room: String,

    /// WebSocket URL of the relay.
    #[arg(short, long, default_value = "ws://127.0.0.1:3001/ws")]
    relay: String,

    /// Propose the previous participant id when rejoining.
    #[arg(long)]
    retain_id: bool,

    /// Base reconnect delay in seconds; attempt n waits n times this.
    #[arg(long, default_value_t = 2)]
    backoff_secs: u64,

    /// Reconnect attempts before giving up.
    #[arg(long, default_value_t = 5)]
    attempts: u32,

    /// Leave after this many seconds instead of waiting for Ctrl-C.
    #[arg(long)]
    duration: Option<u64>,

    /// Negotiate real WebRTC links with the other members.
    #[cfg(feature = "webrtc")]
    #[arg(long)]
    media: bool,
}

impl Args {
    fn client_config(&self) -> ClientConfig {
        let identity = if self.retain_id {
            IdentityPolicy::Retain
        } else {
            IdentityPolicy::MintFresh
        };
        ClientConfig::new(self.relay.as_str(), self.room.as_str())
            .with_identity(identity)
            .with_backoff(LinearBackoff::new(
                Duration::from_secs(self.backoff_secs),
                self.attempts,
            ))
    }

    #[cfg(feature = "webrtc")]
    fn capability(&self, config: &ClientConfig) -> Arc<dyn MediaCapability> {
        if self.media {
            return Arc::new(huddle_client::WebRtcCapability::new(
                config.ice_servers.clone(),
            ));
        }
        Arc::new(ProbeMedia)
    }

    #[cfg(not(feature = "webrtc"))]
    fn capability(&self, _config: &ClientConfig) -> Arc<dyn MediaCapability> {
        Arc::new(ProbeMedia)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let args = Args::parse();
    if args.room.trim().is_empty() {
        bail!("room id must not be empty");
    }

    let config = args.client_config();
    println!(
        "{} {} {} {}",
        "Joining".green().bold(),
        config.room_id.as_str().bold(),
        "via".dimmed(),
        config.relay_url
    );

    let mut handle = spawn_ws_client(config.clone(), args.capability(&config));
    let deadline = async {
        match args.duration {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            event = handle.next_event() => match event {
                Some(event) => println!("{}", describe(&event)),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                println!("{}", "Leaving...".yellow());
                break;
            }
            _ = &mut deadline => {
                println!("{}", "Time is up, leaving...".yellow());
                break;
            }
        }
    }

    let status = handle.status();
    handle.leave().await;

    match status {
        ConnectionStatus::Disconnected(DisconnectReason::RetriesExhausted { attempts }) => {
            bail!("relay unreachable after {} attempts", attempts)
        }
        ConnectionStatus::Disconnected(DisconnectReason::RoomFull) => bail!("room is full"),
        ConnectionStatus::Disconnected(DisconnectReason::JoinRejected(reason)) => {
            bail!("relay rejected the join: {}", reason)
        }
        _ => Ok(()),
    }
}

fn describe(event: &ClientEvent) -> String {
    match event {
        ClientEvent::Status(status) => format!("{} {}", "status".blue(), describe_status(status)),
        ClientEvent::RoomInfo {
            room_id,
            participant_count,
        } => format!(
            "{} {} has {} participant(s)",
            "room".cyan(),
            room_id,
            participant_count
        ),
        ClientEvent::Identity(id) => format!("{} {}", "you are".cyan(), id.as_str().bold()),
        ClientEvent::RoomFull => "room is full".red().bold().to_string(),
        ClientEvent::PeerJoined(peer) => format!("{} {}", "+".green().bold(), peer),
        ClientEvent::PeerLeft(peer) => format!("{} {}", "-".red().bold(), peer),
        ClientEvent::LinkEstablished(peer) => format!("{} {}", "linked".green(), peer),
        ClientEvent::LinkFailed { peer, terminal } => {
            let label = if *terminal { "link gave up" } else { "link failed, retrying" };
            format!("{} {}", label.yellow(), peer)
        }
        ClientEvent::RelayError(reason) => format!("{} {}", "relay error".red(), reason),
    }
}

fn describe_status(status: &ConnectionStatus) -> String {
    match status {
        ConnectionStatus::Idle => "idle".to_owned(),
        ConnectionStatus::Connecting { attempt } => format!("connecting (attempt {})", attempt),
        ConnectionStatus::Joining => "joining".to_owned(),
        ConnectionStatus::Connected => "connected".green().to_string(),
        ConnectionStatus::Reconnecting { attempt, delay } => format!(
            "reconnecting in {:?} (attempt {})",
            delay, attempt
        )
        .yellow()
        .to_string(),
        ConnectionStatus::Disconnected(reason) => {
            format!("disconnected: {:?}", reason).red().to_string()
        }
    }
}
