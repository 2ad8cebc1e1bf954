//! Wallet session console.
//!
//! # Architecture Overview
//!
//! ```text
//!   CLI subcommand / HTTP console request
//!          │
//!          ▼
//!   ┌──────────────────────┐     ┌──────────────────────┐
//!   │  AuthSessionManager  │────▶│   AdapterRegistry    │
//!   │  (status, session)   │     │ local_key │ node_acc │
//!   └──────────┬───────────┘     └──────────┬───────────┘
//!              │                            │ connect
//!              │ session cache              ▼
//!              │                 ┌──────────────────────┐
//!              └────────────────▶│   ProviderHandle     │
//!                                │   (alloy provider)   │
//!                                └──────────┬───────────┘
//!                                           ▼
//!                                ┌──────────────────────┐
//!                                │   ChainRpcFacade     │──▶ JSON-RPC node
//!                                └──────────────────────┘
//! ```
//!
//! Each CLI invocation initializes the session, which resumes the cached
//! login, so `login` followed by `balance` behaves like one long session.

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::net::TcpListener;

use wallet_session::adapters::LoginOptions;
use wallet_session::config::{load_config, AppConfig};
use wallet_session::console::{BufferConsole, ConsoleSink, StdoutConsole};
use wallet_session::http::{ConsoleState, HttpServer};
use wallet_session::lifecycle::{signals, Shutdown};
use wallet_session::observability::{init_logging, metrics};
use wallet_session::rpc::{demo_update_message, greeter_abi, parse_abi, ChainRpcFacade};
use wallet_session::{AuthSessionManager, WalletError, WalletResult};

#[derive(Debug, Parser)]
#[command(name = "wallet-session", version, about = "Login-gated wallet session console")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override `chain.rpc_target`.
    #[arg(long, global = true)]
    rpc_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Log in through an adapter.
    Login(LoginArgs),
    /// Show the logged-in user's claims.
    UserInfo,
    /// Sign a fresh statement proving control of the account.
    Authenticate,
    /// Chain id reported by the node.
    ChainId,
    /// Accounts of the session.
    Accounts,
    /// Balance of the primary account.
    Balance,
    /// Sign a message (EIP-191).
    Sign {
        #[arg(default_value = "YOUR_MESSAGE")]
        message: String,
    },
    /// Transfer ether; sends to yourself when no destination is given.
    Send {
        #[arg(long, default_value = "0.0001")]
        amount: String,
        #[arg(long)]
        to: Option<String>,
    },
    /// Export the private key of a local-key session.
    PrivateKey,
    /// Deploy a contract.
    Deploy {
        /// Hex bytecode, or @path to a file containing it.
        #[arg(long)]
        bytecode: String,
        #[command(flatten)]
        abi: AbiArgs,
        /// Constructor arguments.
        args: Vec<String>,
    },
    /// Call a read-only contract function.
    Read {
        address: String,
        #[arg(long, default_value = "message")]
        function: String,
        #[command(flatten)]
        abi: AbiArgs,
        args: Vec<String>,
    },
    /// Send a state-changing contract call.
    Write {
        address: String,
        #[arg(long, default_value = "update")]
        function: String,
        #[command(flatten)]
        abi: AbiArgs,
        args: Vec<String>,
    },
    /// Log out and clear the session cache.
    Logout,
    /// Show the session status.
    Status,
    /// Run the HTTP console.
    Serve {
        /// Override `console.bind_address`.
        #[arg(long)]
        bind: Option<String>,
    },
}

#[derive(Debug, Args)]
struct LoginArgs {
    /// Adapter name; the highest priority adapter when omitted.
    #[arg(long)]
    adapter: Option<String>,
    /// Login method, e.g. google, line, jwt.
    #[arg(long, default_value = "google")]
    provider: String,
    /// Identity token for jwt logins.
    #[arg(long)]
    id_token: Option<String>,
    /// JWT claim holding the verifier id.
    #[arg(long)]
    verifier_id_field: Option<String>,
}

#[derive(Debug, Args)]
struct AbiArgs {
    /// Path to a JSON ABI file; the greeter ABI when omitted.
    #[arg(long)]
    abi: Option<PathBuf>,
}

impl AbiArgs {
    fn load(&self) -> WalletResult<alloy::json_abi::JsonAbi> {
        match &self.abi {
            Some(path) => parse_abi(&read_input_file(path)?),
            None => greeter_abi(),
        }
    }
}

fn read_input_file(path: &Path) -> WalletResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| WalletError::InvalidInput(format!("cannot read {}: {}", path.display(), e)))
}

fn load(cli: &Cli) -> WalletResult<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(rpc_url) = &cli.rpc_url {
        config.chain.rpc_target = rpc_url.clone();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    init_logging(&config.observability);

    tracing::debug!(
        network = %config.network,
        chain_id = %config.chain.chain_id,
        rpc_target = %config.chain.rpc_target,
        "Configuration loaded"
    );

    match run(cli.command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(kind = e.kind(), "Command failed");
            StdoutConsole.write_line(e.to_string());
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, config: AppConfig) -> WalletResult<()> {
    let manager = Arc::new(AuthSessionManager::from_config(&config)?);
    manager.initialize().await?;

    if let Command::Serve { bind } = command {
        return serve(manager, &config, bind).await;
    }

    let console = StdoutConsole;
    let rpc = manager.rpc().await;
    match command {
        Command::Login(args) => {
            let options = LoginOptions {
                login_provider: args.provider,
                id_token: args.id_token,
                verifier_id_field: args.verifier_id_field,
                ..LoginOptions::default()
            };
            manager.connect(args.adapter.as_deref(), options).await?;
            console.log(&manager.snapshot().await);
        }
        Command::UserInfo => console.log(&manager.user_info().await?),
        Command::Authenticate => console.log(&manager.authenticate_user().await?),
        Command::ChainId => console.log(&rpc.get_chain_id().await?.to_string()),
        Command::Accounts => console.log(&rpc.get_accounts().await?),
        Command::Balance => console.log(&rpc.get_balance().await?),
        Command::Sign { message } => {
            let signature = rpc.sign_message(&message).await?;
            let signer = ChainRpcFacade::verify_message(&message, &signature)?;
            console.log(&serde_json::json!({
                "message": message,
                "signature": alloy::hex::encode_prefixed(signature.as_bytes()),
                "signer": signer,
            }));
        }
        Command::Send { amount, to } => {
            let destination = match to {
                Some(to) => to,
                None => rpc.primary_account()?.to_string(),
            };
            console.log(&rpc.send_transaction(&amount, &destination).await?);
        }
        Command::PrivateKey => console.log(&rpc.get_private_key()?),
        Command::Deploy { bytecode, abi, args } => {
            let bytecode = match bytecode.strip_prefix('@') {
                Some(path) => read_input_file(Path::new(path))?,
                None => bytecode,
            };
            console.log(&rpc.deploy_contract(&abi.load()?, &bytecode, &args).await?);
        }
        Command::Read { address, function, abi, args } => {
            console.log(&rpc.read_contract(&address, &abi.load()?, &function, &args).await?);
        }
        Command::Write { address, function, abi, mut args } => {
            if function == "update" && args.is_empty() {
                args.push(demo_update_message());
            }
            console.log(&rpc.write_contract(&address, &abi.load()?, &function, &args).await?);
        }
        Command::Logout => {
            manager.disconnect().await?;
            console.log(&manager.snapshot().await);
        }
        Command::Status => console.log(&manager.snapshot().await),
        Command::Serve { .. } => {}
    }
    Ok(())
}

async fn serve(
    manager: Arc<AuthSessionManager>,
    config: &AppConfig,
    bind: Option<String>,
) -> WalletResult<()> {
    let metrics = if config.observability.metrics_enabled {
        Some(metrics::install_prometheus()?)
    } else {
        None
    };

    let state = ConsoleState {
        manager,
        console: Arc::new(BufferConsole::new(config.console.history)),
        metrics,
    };

    let bind = bind.unwrap_or_else(|| config.console.bind_address.clone());
    let listener = TcpListener::bind(&bind)
        .await
        .map_err(|e| WalletError::Config(format!("cannot bind {}: {}", bind, e)))?;

    let shutdown = Shutdown::new();
    tokio::spawn(signals::shutdown_on_signal(shutdown.clone()));

    HttpServer::new(state)
        .run(listener, shutdown)
        .await
        .map_err(|e| WalletError::Sdk(format!("HTTP console failed: {}", e)))?;

    tracing::info!("Shutdown complete");
    Ok(())
}
