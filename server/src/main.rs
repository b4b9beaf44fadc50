mod config;
mod graphql;
mod http;
#[cfg(test)]
mod test_support;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use entity::accounts::Role;
use migration::{Migrator, MigratorTrait};
use platform_db::{DatabaseSettings, DbPool, NewAccount, connect};
use platform_obs::{ObsConfig, init_tracing};
use products_hr::{HrModule, LocalBlobStore};
use tracing::{info, warn};

use crate::{
    config::AppConfig,
    http::{AppState, ServeConfig},
};

#[derive(Parser, Debug)]
#[command(name = "hr-server", version, about = "HR onboarding and approval service")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP + GraphQL server.
    Serve(ServeCommand),
    /// Run database migrations.
    #[command(subcommand)]
    Migrate(MigrateCommand),
    /// Create the initial admin account.
    Seed(SeedCommand),
    /// Print the GraphQL schema snapshot.
    #[command(name = "schema:print")]
    SchemaPrint {
        #[arg(long, value_name = "FILE", help = "Destination file path (stdout if omitted)")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum MigrateCommand {
    /// Apply pending migrations.
    Up,
    /// Rollback the most recent migration.
    Down,
}

#[derive(Args, Debug)]
struct ServeCommand {
    #[arg(long, default_value = "0.0.0.0")]
    host: std::net::IpAddr,
    #[arg(long, default_value_t = 8080)]
    port: u16,
    #[arg(long, help = "Allow starting even when migrations are pending")]
    allow_dirty: bool,
}

#[derive(Args, Debug)]
struct SeedCommand {
    #[arg(long, env = "SEED_ADMIN_EMAIL", default_value = "admin@example.com")]
    admin_email: String,
    #[arg(long, env = "SEED_ADMIN_PASSWORD")]
    admin_password: String,
}

impl From<ServeCommand> for ServeConfig {
    fn from(value: ServeCommand) -> Self {
        ServeConfig::new(value.host, value.port)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing(ObsConfig::from_env())?;
    let cli = Cli::parse();
    match cli.command {
        Command::Serve(cmd) => run_server(cmd).await,
        Command::Migrate(action) => match action {
            MigrateCommand::Up => migrate_up().await,
            MigrateCommand::Down => migrate_down().await,
        },
        Command::Seed(cmd) => run_seed(cmd).await,
        Command::SchemaPrint { output } => schema_print(output).await,
    }
}

async fn run_seed(cmd: SeedCommand) -> Result<()> {
    let email = platform_authn::normalize_email(&cmd.admin_email)
        .context("invalid --admin-email")?;
    let pool = setup_pool().await?;
    if let Some(existing) = platform_db::find_account_by_email(&pool, &email).await? {
        warn!(account_id = %existing.id, role = existing.role.as_str(), "seed account already exists");
        return Ok(());
    }
    let password_hash =
        platform_authn::hash_password(&cmd.admin_password).context("invalid --admin-password")?;
    let account = platform_db::create_account(
        &pool,
        NewAccount {
            display_name: "Administrator".into(),
            email,
            password_hash,
        },
        Role::Admin,
    )
    .await?;
    info!(account_id = %account.id, "admin account seeded");
    Ok(())
}

async fn schema_print(path: Option<PathBuf>) -> Result<()> {
    let sdl = graphql::schema_sdl();
    match path {
        Some(target) => {
            tokio::fs::write(&target, sdl)
                .await
                .with_context(|| format!("failed to write {}", target.display()))?;
            info!(path = %target.display(), "schema snapshot written");
        }
        None => println!("{sdl}"),
    }
    Ok(())
}

async fn setup_pool() -> Result<DbPool> {
    let settings = DatabaseSettings::from_env();
    connect(&settings).await.map_err(Into::into)
}

async fn run_server(cmd: ServeCommand) -> Result<()> {
    let config = Arc::new(AppConfig::load()?);
    let pool = setup_pool().await?;
    ensure_migrations(&pool, cmd.allow_dirty).await?;

    tokio::fs::create_dir_all(&config.blob_root)
        .await
        .with_context(|| format!("failed to create {}", config.blob_root.display()))?;
    let blobs = LocalBlobStore::new(config.blob_root.clone(), config.blob_public_url.clone());
    let hr = HrModule::new(pool, Arc::new(blobs));
    let schema = graphql::build_schema(hr.clone());
    let state = AppState { hr, schema, config };
    http::serve(cmd.into(), state).await
}

async fn ensure_migrations(pool: &DbPool, allow_dirty: bool) -> Result<()> {
    let pending = Migrator::get_pending_migrations(pool).await?;
    if !pending.is_empty() && !allow_dirty {
        anyhow::bail!(
            "pending migrations detected; run `cargo run -p server -- migrate up` or pass --allow-dirty"
        );
    }
    Ok(())
}

async fn migrate_up() -> Result<()> {
    let pool = setup_pool().await?;
    Migrator::up(&pool, None).await?;
    info!("database migrations applied");
    Ok(())
}

async fn migrate_down() -> Result<()> {
    let pool = setup_pool().await?;
    Migrator::down(&pool, Some(1)).await?;
    info!("most recent migration rolled back");
    Ok(())
}
