use clap::Parser;
use skill_router::config::{Cli, RouterConfig};
use skill_router::model::HookOutput;
use skill_router::router::Router;
use std::io::{self, Read};
use tracing::{debug, warn};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut raw_stdin = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut raw_stdin) {
        warn!("failed to read stdin: {}", e);
        return;
    }
    debug!("received input: {}", raw_stdin);

    let config = RouterConfig::from_env(&cli);
    let router = Router::new(config);

    match router.route(&raw_stdin) {
        Some(system_message) => {
            let output = HookOutput { system_message };
            match serde_json::to_string(&output) {
                Ok(json) => println!("{json}"),
                Err(e) => warn!("failed to serialize output: {}", e),
            }
        }
        None => debug!("no skill selected, emitting nothing"),
    }

    // Exit 0 unconditionally: the hook contract never blocks the caller,
    // so a routing failure is indistinguishable from a clean no-match.
    std::process::exit(0);
}
