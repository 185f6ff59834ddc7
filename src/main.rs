//! rodcall CLI
//!
//! Entry point for the `rodcall` command-line tool.

use clap::{Parser, Subcommand};
use rodcall::config::EffectiveConfig;
use rodcall::transport::{HttpTransport, RemoteService, TransportError};
use rodcall::{demo, keygen, logging, Dispatcher, RCall};
use std::io::Read;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "rodcall")]
#[command(about = "Stateless remote-object RPC", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the demo service over HTTP
    Serve {
        /// Path to a TOML config file
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Listen address (overrides server.bind)
        #[arg(long)]
        bind: Option<String>,

        /// Base64 signing secret (overrides server.secret)
        #[arg(long, env = "RODCALL_SECRET", hide_env_values = true)]
        secret: Option<String>,

        /// Print the effective config (secrets redacted) and exit
        #[arg(long)]
        print_config: bool,
    },

    /// Post one RCall and print the result
    Call {
        /// Path to a TOML config file
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Endpoint URL (overrides client.url)
        #[arg(long)]
        url: Option<String>,

        /// File holding the RCall JSON (default: stdin)
        #[arg(long, short = 'r')]
        request: Option<PathBuf>,
    },

    /// Print a new random base64 secret
    Keygen,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            config,
            bind,
            secret,
            print_config,
        } => {
            run_serve(config, bind, secret, print_config).await;
        }
        Commands::Call { config, url, request } => {
            run_call(config, url, request).await;
        }
        Commands::Keygen => {
            println!("{}", keygen::generate().to_base64());
        }
    }
}

fn load_config(config_path: Option<PathBuf>, overrides: serde_json::Value) -> EffectiveConfig {
    match EffectiveConfig::build(config_path.as_deref(), Some(overrides)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(1);
        }
    }
}

async fn run_serve(
    config_path: Option<PathBuf>,
    bind: Option<String>,
    secret: Option<String>,
    print_config: bool,
) {
    let mut overrides = serde_json::Map::new();
    if let Some(bind) = bind {
        overrides.insert("bind".to_string(), bind.into());
    }
    if let Some(secret) = secret {
        overrides.insert("secret".to_string(), secret.into());
    }
    let config = load_config(config_path, serde_json::json!({ "server": overrides }));

    if print_config {
        match serde_json::to_string_pretty(&config.redacted()) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing output: {}", e);
                process::exit(1);
            }
        }
        return;
    }

    let server = match config.server() {
        Ok(server) => server,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(1);
        }
    };
    logging::init(&server.log_level);

    let secret = match server.secret() {
        Ok(Some(secret)) => secret,
        Ok(None) => {
            warn!(
                "no server.secret configured, using an ephemeral one; \
                 handles will not survive a restart"
            );
            keygen::generate()
        }
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(1);
        }
    };

    let registry = match demo::registry() {
        Ok(registry) => Arc::new(registry),
        Err(e) => {
            eprintln!("Error building registry: {}", e);
            process::exit(1);
        }
    };
    let dispatcher = Arc::new(Dispatcher::new(
        server.dispatcher_config(secret),
        registry,
        demo::root,
    ));

    let listener = match TcpListener::bind(&server.bind).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("Error binding {}: {}", server.bind, e);
            process::exit(1);
        }
    };

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
        info!("shutdown requested");
    };

    if let Err(e) = rodcall_server::http::serve(listener, Arc::clone(&dispatcher), shutdown).await {
        eprintln!("Server error: {}", e);
        process::exit(1);
    }

    if !dispatcher.close(server.shutdown_timeout()).await {
        process::exit(1);
    }
}

async fn run_call(config_path: Option<PathBuf>, url: Option<String>, request: Option<PathBuf>) {
    let overrides = match url {
        Some(url) => serde_json::json!({ "client": { "url": url } }),
        None => serde_json::json!({}),
    };
    let config = load_config(config_path, overrides);
    let client = match config.client() {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(1);
        }
    };
    logging::init("warn");

    let body = match request {
        Some(path) => {
            std::fs::read_to_string(&path).map_err(|e| format!("{}: {}", path.display(), e))
        }
        None => {
            let mut body = String::new();
            std::io::stdin()
                .read_to_string(&mut body)
                .map(|_| body)
                .map_err(|e| format!("stdin: {}", e))
        }
    };
    let body = match body {
        Ok(body) if body.trim().is_empty() => "{}".to_string(),
        Ok(body) => body,
        Err(e) => {
            eprintln!("Error reading request: {}", e);
            process::exit(1);
        }
    };

    let call: RCall = match serde_json::from_str(&body) {
        Ok(call) => call,
        Err(e) => {
            eprintln!("Invalid RCall JSON: {}", e);
            process::exit(1);
        }
    };

    let transport = match HttpTransport::from_config(&client) {
        Ok(transport) => transport,
        Err(e) => {
            eprintln!("Error creating client: {}", e);
            process::exit(1);
        }
    };

    match transport.call(call).await {
        Ok(result) => match serde_json::to_string_pretty(&result) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing output: {}", e);
                process::exit(1);
            }
        },
        Err(TransportError::Remote(error)) => {
            eprintln!("Call rejected: {}", error);
            process::exit(2);
        }
        Err(e) => {
            eprintln!("Call to {} failed: {}", transport.url(), e);
            process::exit(1);
        }
    }
}
