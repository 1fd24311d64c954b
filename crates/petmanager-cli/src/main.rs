//! petmanager - command line client for the pet manager API.
//!
//! Logs in against the API, keeps the session tokens between runs and
//! manages pets, tutors and the links between them.

mod commands;
mod output;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use petmanager_core::api::ApiClient;
use petmanager_core::auth::LoginRedirect;
use petmanager_core::config::Config;
use petmanager_core::models::parse_id;
use petmanager_core::ApiError;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// File name prefix for the rolling log
const LOG_FILE_PREFIX: &str = "petmanager.log";

#[derive(Parser, Debug)]
#[command(name = "petmanager", version, about = "Gerencie pets e tutores pela linha de comando")]
struct Cli {
    /// API base URL (overrides the config file)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Print raw JSON instead of formatted output
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and store the session tokens
    Login {
        #[arg(short, long)]
        username: Option<String>,
    },
    /// Clear the stored session
    Logout,
    /// Show session and configuration state
    Status,
    /// Create a new account
    Register { username: String },
    Pets(PetsCommand),
    Tutors(TutorsCommand),
}

#[derive(Args, Debug)]
struct PetsCommand {
    #[command(subcommand)]
    command: PetsSubcommand,
}

#[derive(Args, Debug, Clone)]
struct ListArgs {
    #[arg(long, default_value_t = 0)]
    page: u32,
    #[arg(long, default_value_t = 10)]
    size: u32,
    /// Filter by name
    #[arg(long)]
    name: Option<String>,
}

#[derive(Subcommand, Debug)]
enum PetsSubcommand {
    List(ListArgs),
    Show {
        #[arg(value_parser = id_arg)]
        id: i64,
    },
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        breed: Option<String>,
        #[arg(long)]
        age: u32,
        /// Photo uploaded right after the pet is created
        #[arg(long)]
        photo: Option<PathBuf>,
    },
    Update {
        #[arg(value_parser = id_arg)]
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        breed: Option<String>,
        #[arg(long)]
        age: Option<u32>,
    },
    Delete {
        #[arg(value_parser = id_arg)]
        id: i64,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Upload a photo for a pet
    Photo {
        #[arg(value_parser = id_arg)]
        id: i64,
        path: PathBuf,
    },
}

#[derive(Args, Debug)]
struct TutorsCommand {
    #[command(subcommand)]
    command: TutorsSubcommand,
}

#[derive(Subcommand, Debug)]
enum TutorsSubcommand {
    List(ListArgs),
    Show {
        #[arg(value_parser = id_arg)]
        id: i64,
    },
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        cpf: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        address: Option<String>,
    },
    Update {
        #[arg(value_parser = id_arg)]
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        cpf: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        address: Option<String>,
    },
    Delete {
        #[arg(value_parser = id_arg)]
        id: i64,
        #[arg(short, long)]
        yes: bool,
    },
    /// List the pets linked to a tutor
    Pets {
        #[arg(value_parser = id_arg)]
        id: i64,
        #[command(flatten)]
        list: ListArgs,
    },
    /// Link a pet to a tutor
    Link {
        #[arg(value_parser = id_arg)]
        tutor_id: i64,
        #[arg(value_parser = id_arg)]
        pet_id: i64,
    },
    /// Remove the link between a pet and a tutor
    Unlink {
        #[arg(value_parser = id_arg)]
        tutor_id: i64,
        #[arg(value_parser = id_arg)]
        pet_id: i64,
        #[arg(short, long)]
        yes: bool,
    },
    Photo {
        #[arg(value_parser = id_arg)]
        id: i64,
        path: PathBuf,
    },
}

fn id_arg(raw: &str) -> Result<i64, String> {
    parse_id(raw).ok_or_else(|| format!("ID inválido: {}", raw))
}

/// Tells the user to log in again when the session ends.
struct TerminalRedirect;

impl LoginRedirect for TerminalRedirect {
    fn redirect_to_login(&self) {
        eprintln!("Sessão encerrada. Execute `petmanager login` para entrar novamente.");
    }
}

/// Initialize the tracing subscriber for logging.
///
/// `RUST_LOG` controls the level (default `warn`). When `log_dir` is set a
/// daily rolling file is written too; keep the returned guard alive so it
/// gets flushed.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let mut config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Erro ao carregar configuração: {:#}", e);
            std::process::exit(1);
        }
    };

    let _guard = init_tracing(config.log_dir.as_deref());
    apply_overrides(&mut config, cli.api_url.clone(), |name| std::env::var(name).ok());
    info!(api = %config.api_base_url, "petmanager starting");

    if let Err(e) = run(cli, config).await {
        match e.downcast_ref::<ApiError>() {
            Some(api) => eprintln!("{}", api.user_message()),
            None => eprintln!("Erro: {:#}", e),
        }
        std::process::exit(1);
    }
}

/// Environment first, then the command line. Runs after tracing is set up
/// so rejected environment values are logged.
fn apply_overrides(
    config: &mut Config,
    api_url: Option<String>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Vec<&'static str> {
    let rejected = config.apply_overrides(lookup);
    if let Some(url) = api_url {
        config.api_base_url = url;
    }
    rejected
}

async fn run(cli: Cli, mut config: Config) -> Result<()> {
    let storage = config
        .open_token_storage()
        .context("Failed to open token storage")?;
    let client = ApiClient::new(&config, storage, Arc::new(TerminalRedirect))?;
    let json = cli.json;

    match cli.command {
        Command::Login { username } => commands::login(&client, &mut config, username).await,
        Command::Logout => {
            commands::logout(&client);
            Ok(())
        }
        Command::Status => commands::status(&client, &config),
        Command::Register { username } => commands::register(&client, &username).await,
        Command::Pets(pets) => {
            client.session().require_auth()?;
            commands::pets(&client, pets.command, json).await
        }
        Command::Tutors(tutors) => {
            client.session().require_auth()?;
            commands::tutors(&client, tutors.command, json).await
        }
    }
}
