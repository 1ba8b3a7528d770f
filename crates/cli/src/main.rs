use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ig-relay")]
#[command(about = "Instagram webhook relay", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Run the relay: webhook handshake, signature check, and auto-replies via the Graph API.
    Serve {
        /// Config file path (default: IG_RELAY_CONFIG_PATH or ~/.ig-relay/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// HTTP port (default from PORT, config, or 3000)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Print startup diagnostics for the resolved configuration; exits non-zero when a required value is missing.
    CheckConfig {
        /// Config file path (default: IG_RELAY_CONFIG_PATH or ~/.ig-relay/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("ig-relay {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Serve { config, port }) => {
            if let Err(e) = run_serve(config, port).await {
                log::error!("relay failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::CheckConfig { config }) => match run_check_config(config) {
            Ok(true) => {}
            Ok(false) => std::process::exit(2),
            Err(e) => {
                log::error!("check-config failed: {:#}", e);
                std::process::exit(1);
            }
        },
        None => {
            println!("Run with --help for usage");
        }
    }
}

async fn run_serve(
    config_path: Option<std::path::PathBuf>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let mut config = lib::config::load_config(config_path)?;
    if let Some(p) = port {
        config.gateway.port = p;
    }
    log::info!("starting relay on {}:{}", config.gateway.bind, config.gateway.port);
    lib::gateway::run_gateway(config).await
}

fn run_check_config(config_path: Option<std::path::PathBuf>) -> anyhow::Result<bool> {
    let config = lib::config::load_config(config_path)?;
    let ig = &config.instagram;
    let state = |v: &Option<String>| if v.is_some() { "set" } else { "missing" };
    let rows = [
        ("listen", format!("{}:{}", config.gateway.bind, config.gateway.port)),
        ("IG_USER_ID", state(&ig.ig_user_id).to_string()),
        ("PAGE_ID", state(&ig.page_id).to_string()),
        ("PAGE_ACCESS_TOKEN", state(&ig.page_access_token).to_string()),
        ("VERIFY_TOKEN", state(&ig.verify_token).to_string()),
        ("META_APP_SECRET", state(&ig.app_secret).to_string()),
        ("graph api", format!("{}/{}", ig.graph_api_base, ig.graph_api_version)),
    ];
    for (name, value) in rows {
        println!("{:<18}{}", name, value);
    }
    for warning in config.startup_warnings() {
        println!("warning: {}", warning);
    }
    Ok(config.is_complete())
}
