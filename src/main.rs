use clap::{Parser, Subcommand};
use slj_admin::config::{ConfigError, SessionConfig};
use slj_admin::forms::ResetPasswordForm;
use slj_admin::net::{AdminApi, ApiError};
use slj_admin::routes::navigate;
use slj_admin::storage::{FileKv, SessionCache, SessionStore, StorageError};
use slj_admin::{GuardDecision, RouteGuard, SessionState};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Api(#[from] ApiError),
    #[error("session cache: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Parser, Debug)]
#[command(name = "slj-admin", about = "Inspect and manage the SLJ Textiles admin session")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the cached session and the guard's decision for a path.
    Inspect {
        #[arg(long, default_value = "/")]
        path: String,
    },
    /// Remove the cached session.
    Clear,
    /// Reset an admin password through the REST API.
    ResetPassword {
        #[arg(long)]
        email: String,
        #[arg(long, env = "SLJ_NEW_PASSWORD")]
        new_password: String,
        #[arg(long, env = "SLJ_CONFIRM_PASSWORD")]
        confirm_password: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = SessionConfig::from_env()?;

    match cli.command {
        Command::Inspect { path } => {
            run_inspect(&config, &path);
            Ok(())
        }
        Command::Clear => {
            session_cache(&config).try_clear()?;
            tracing::info!(dir = %config.storage_dir.display(), "cached session cleared");
            Ok(())
        }
        Command::ResetPassword { email, new_password, confirm_password } => {
            let form = ResetPasswordForm { email, new_password, confirm_password };
            AdminApi::new(config.api_base_url.clone())?.reset_password(&form).await?;
            println!("Password reset successful");
            Ok(())
        }
    }
}

fn session_cache(config: &SessionConfig) -> SessionCache<FileKv> {
    SessionCache::new(FileKv::new(&config.storage_dir), config.storage_key.clone())
}

/// Without a live identity provider the cache is the only authority, so an
/// empty cache reads as signed out rather than loading.
fn run_inspect(config: &SessionConfig, path: &str) {
    let state = session_cache(config)
        .load()
        .map_or(SessionState::Unauthenticated, |cached| SessionState::Authenticated(cached.record));

    match state.record() {
        Some(record) => println!(
            "session: {} ({}) role={} email={}",
            record.display_name,
            record.identity,
            record.role,
            record.email.as_deref().unwrap_or("-")
        ),
        None => println!("session: none"),
    }

    let guard = RouteGuard::from_config(config);
    match navigate(path, &state, &guard) {
        GuardDecision::Waiting => println!("{path}: waiting"),
        GuardDecision::Redirect(to) => println!("{path}: redirect -> {to}"),
        GuardDecision::Render(view) => println!("{path}: render {view:?}"),
    }
}
