//! Car Booking Agent
//!
//! Serves the car booking actions over JSON-RPC with HTTP Basic
//! authentication. Callers see every action on the capability card; which
//! ones they may invoke depends on their roles.
//!
//! # Usage
//!
//! ```bash
//! # Start server
//! cargo run --bin car-booking-server -- --port 7860
//!
//! # Discover the actions
//! curl http://localhost:7860/.well-known/agent.json
//!
//! # Book a car as a USER
//! curl -u user:password -X POST http://localhost:7860/ \
//!   -H "Content-Type: application/json" \
//!   -d '{"jsonrpc":"2.0","id":1,"method":"bookCar","params":["SUV","Airport","Downtown"]}'
//!
//! # Cancelling needs ADMIN
//! curl -u admin:admin -X POST http://localhost:7860/ \
//!   -H "Content-Type: application/json" \
//!   -d '{"jsonrpc":"2.0","id":2,"method":"cancelCarBooking","params":["B-17"]}'
//! ```

mod agent;

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use a2a_actions::{ActionRegistry, CardConfig, CardSigningKey, DenyPolicy, DispatchConfig};
use a2a_http_server::A2aHttpServer;
use anyhow::{Context, bail};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use clap::Parser;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(long, env = "A2A_PORT", default_value = "7860")]
    port: u16,

    #[arg(long, env = "A2A_BIND", default_value = "127.0.0.1")]
    bind: IpAddr,

    /// Base64 32-byte Ed25519 seed; the card is signed when present
    #[arg(long, env = "A2A_SIGNING_SEED")]
    signing_seed: Option<String>,

    /// Key id written into card signatures
    #[arg(long, env = "A2A_SIGNING_KEY_ID", default_value = "car-booking-card")]
    signing_key_id: String,

    /// Seconds a single action may run before it is abandoned
    #[arg(long, env = "A2A_INVOKE_TIMEOUT", default_value = "30")]
    invoke_timeout: u64,

    /// Answer unauthorized calls as if the action did not exist
    #[arg(long)]
    conceal_denied: bool,
}

fn signing_key(key_id: &str, seed: &str) -> anyhow::Result<CardSigningKey> {
    let bytes = STANDARD
        .decode(seed.trim())
        .context("signing seed is not valid base64")?;
    let Ok(seed) = <[u8; 32]>::try_from(bytes.as_slice()) else {
        bail!("signing seed must decode to 32 bytes, got {}", bytes.len());
    };
    Ok(CardSigningKey::from_seed(key_id, seed))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "car_booking_server=info,a2a_http_server=info,a2a_actions=info".into()
            }),
        )
        .init();

    let registry = Arc::new(ActionRegistry::new());
    agent::register(&registry)?;

    let bind_address = SocketAddr::new(args.bind, args.port);
    let mut card_config = CardConfig::new(agent::AGENT_NAME)
        .description(agent::AGENT_DESCRIPTION)
        .version(env!("CARGO_PKG_VERSION"))
        .url(format!("http://{}/", bind_address))
        .authentication_scheme("Basic");
    if let Some(seed) = &args.signing_seed {
        let key = signing_key(&args.signing_key_id, seed)?;
        info!(key_id = key.key_id(), "Capability card will be signed");
        card_config = card_config.signing_key(key);
    }

    let deny_policy = if args.conceal_denied {
        DenyPolicy::Conceal
    } else {
        DenyPolicy::Reveal
    };
    let dispatch_config = DispatchConfig::default()
        .invoke_timeout(Some(std::time::Duration::from_secs(args.invoke_timeout)))
        .deny_policy(deny_policy);

    let mut builder = A2aHttpServer::builder(registry)
        .bind_address(bind_address)
        .card_config(card_config)
        .dispatch_config(dispatch_config)
        .identity_resolver(agent::demo_users(agent::AGENT_NAME));
    for (path, predicate, body) in agent::content_routes() {
        builder = builder.content_route(path, predicate, body);
    }
    let server = builder.build()?;

    info!("Starting car booking agent on http://{}", bind_address);
    info!("Demo users:");
    info!("  - user/password (USER)");
    info!("  - admin/admin (ADMIN, USER)");

    server.run().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signing_key_from_seed() {
        let seed = STANDARD.encode([3u8; 32]);
        let key = signing_key("k1", &seed).unwrap();
        assert_eq!(key.key_id(), "k1");

        assert!(signing_key("k1", "not base64!").is_err());
        assert!(signing_key("k1", &STANDARD.encode([3u8; 16])).is_err());
    }

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["car-booking-server"]).unwrap();
        assert_eq!(args.port, 7860);
        assert_eq!(args.bind, IpAddr::from([127, 0, 0, 1]));
        assert!(args.signing_seed.is_none());
        assert!(!args.conceal_denied);
    }
}
