use auth_service::{config::AuthConfig, db, AppState};
use clap::{Parser, Subcommand};
use service_core::error::AppError;
use service_core::observability::logging::init_tracing;

/// Operator commands for the identity store.
#[derive(Parser, Debug)]
#[command(name = "auth-service", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply pending database migrations
    Migrate,
    /// Create the built-in guest, superuser and staff roles if missing
    SeedRoles,
    /// Create an administrator account
    CreateSuperuser {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Ping PostgreSQL and Redis
    Health,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();

    // Load configuration - fail fast if invalid
    let config = AuthConfig::from_env()?;

    init_tracing(
        &config.service_name,
        &config.common.log_level,
        config.common.otlp_endpoint(),
    )?;

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        command = ?cli.command,
        "Starting authentication service command"
    );

    match cli.command {
        Command::Migrate => {
            let pool = db::create_pool(&config.database)
                .await
                .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;
            db::run_migrations(&pool)
                .await
                .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;
        }
        Command::SeedRoles => {
            let (state, _) = AppState::connect(&config).await?;
            let created = state.authz.ensure_default_roles().await?;
            tracing::info!(created, "Default roles are present");
        }
        Command::CreateSuperuser { email, password } => {
            let (state, _) = AppState::connect(&config).await?;
            let user = state.sessions.create_superuser(&email, &password).await?;
            tracing::info!(user_id = %user.id, email = %user.email, "Superuser ready");
        }
        Command::Health => {
            let (state, database) = AppState::connect(&config).await?;
            database.health_check().await?;
            state.ledger.health_check().await.map_err(|e| {
                tracing::error!(error = %e, "Redis health check failed");
                AppError::InternalError(e)
            })?;
            tracing::info!(postgres = "up", redis = "up", "Health check passed");
        }
    }

    Ok(())
}
