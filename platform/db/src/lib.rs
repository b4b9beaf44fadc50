//! Database primitives shared by the server and the HR workflow: connection
//! settings, the pooled connection, and the identity/session store.

use std::time::Duration;

use chrono::{DateTime, Utc};
use entity::accounts::{self, Role};
use entity::sessions;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectOptions, ConnectionTrait, Database, DatabaseConnection,
    DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

/// Shared sea-orm connection pool.
pub type DbPool = DatabaseConnection;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("database url missing (set {0})")]
    MissingUrl(String),
    #[error(transparent)]
    Db(#[from] DbErr),
}

pub type DbResult<T> = Result<T, DbError>;

/// Environment-driven connection settings.
#[derive(Clone, Debug, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "default_url_key")]
    env_key: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default)]
    pub sql_logging: bool,
}

fn default_url_key() -> String {
    "DATABASE_URL".to_string()
}

fn default_max_connections() -> u32 {
    10
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            env_key: default_url_key(),
            url: None,
            max_connections: default_max_connections(),
            sql_logging: false,
        }
    }
}

impl DatabaseSettings {
    pub fn from_env() -> Self {
        let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or_else(default_max_connections);
        let sql_logging = std::env::var("DATABASE_SQL_LOGGING")
            .ok()
            .map(|val| matches!(val.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
        Self {
            max_connections,
            sql_logging,
            ..Self::default()
        }
    }

    /// Settings pinned to an explicit url, bypassing the environment.
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn database_url(&self) -> DbResult<String> {
        if let Some(url) = &self.url {
            return Ok(url.clone());
        }
        std::env::var(&self.env_key).map_err(|_| DbError::MissingUrl(self.env_key.clone()))
    }
}

pub async fn connect(settings: &DatabaseSettings) -> DbResult<DbPool> {
    let url = settings.database_url()?;
    let mut options = ConnectOptions::new(url.clone());
    // An in-memory SQLite database only exists on the connection that created it.
    let max_connections = if url.starts_with("sqlite::memory:") {
        1
    } else {
        settings.max_connections
    };
    options
        .max_connections(max_connections)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(settings.sql_logging);
    let pool = Database::connect(options).await?;
    tracing::debug!(max_connections, "database pool ready");
    Ok(pool)
}

/// Fields needed to create an account row.
#[derive(Clone, Debug)]
pub struct NewAccount {
    pub email: String,
    pub display_name: String,
    pub password_hash: String,
}

pub async fn find_account<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> Result<Option<accounts::Model>, DbErr> {
    accounts::Entity::find_by_id(id).one(conn).await
}

pub async fn find_account_by_email<C: ConnectionTrait>(
    conn: &C,
    email: &str,
) -> Result<Option<accounts::Model>, DbErr> {
    accounts::Entity::find()
        .filter(accounts::Column::Email.eq(email))
        .one(conn)
        .await
}

pub async fn account_count<C: ConnectionTrait>(conn: &C) -> Result<u64, DbErr> {
    accounts::Entity::find().count(conn).await
}

pub async fn admin_accounts<C: ConnectionTrait>(conn: &C) -> Result<Vec<accounts::Model>, DbErr> {
    accounts::Entity::find()
        .filter(accounts::Column::Role.eq(Role::Admin))
        .order_by_asc(accounts::Column::CreatedAt)
        .all(conn)
        .await
}

pub async fn admin_count<C: ConnectionTrait>(conn: &C) -> Result<u64, DbErr> {
    accounts::Entity::find()
        .filter(accounts::Column::Role.eq(Role::Admin))
        .count(conn)
        .await
}

/// Inserts an account with the given role. Callers decide the role; see
/// [`initial_role`] for the first-account rule.
pub async fn create_account<C: ConnectionTrait>(
    conn: &C,
    new: NewAccount,
    role: Role,
) -> Result<accounts::Model, DbErr> {
    let now = Utc::now().fixed_offset();
    accounts::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(new.email),
        display_name: Set(new.display_name),
        password_hash: Set(new.password_hash),
        role: Set(role),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(conn)
    .await
}

/// Role for a freshly registered account: the very first account administers
/// the instance, everyone after starts as a plain user.
pub fn initial_role(existing_accounts: u64) -> Role {
    if existing_accounts == 0 {
        Role::Admin
    } else {
        Role::User
    }
}

/// Compare-and-swap role update. Returns `false` when the account no longer
/// holds `from`, leaving the row untouched.
pub async fn update_role<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
    from: Role,
    to: Role,
) -> Result<bool, DbErr> {
    let result = accounts::Entity::update_many()
        .col_expr(accounts::Column::Role, Expr::value(to))
        .col_expr(
            accounts::Column::UpdatedAt,
            Expr::value(Utc::now().fixed_offset()),
        )
        .filter(accounts::Column::Id.eq(id))
        .filter(accounts::Column::Role.eq(from))
        .exec(conn)
        .await?;
    Ok(result.rows_affected == 1)
}

pub async fn create_session<C: ConnectionTrait>(
    conn: &C,
    account_id: Uuid,
    expires_at: DateTime<Utc>,
    user_agent: Option<String>,
) -> Result<sessions::Model, DbErr> {
    sessions::ActiveModel {
        id: Set(Uuid::new_v4()),
        account_id: Set(account_id),
        created_at: Set(Utc::now().fixed_offset()),
        expires_at: Set(expires_at.fixed_offset()),
        user_agent: Set(user_agent),
    }
    .insert(conn)
    .await
}

/// Loads a live session and its account. Expired sessions are deleted and
/// reported as absent.
pub async fn load_session<C: ConnectionTrait>(
    conn: &C,
    session_id: Uuid,
) -> Result<Option<(sessions::Model, accounts::Model)>, DbErr> {
    let Some(session) = sessions::Entity::find_by_id(session_id).one(conn).await? else {
        return Ok(None);
    };
    if session.expires_at.with_timezone(&Utc) < Utc::now() {
        sessions::Entity::delete_by_id(session_id).exec(conn).await?;
        return Ok(None);
    }
    let account = find_account(conn, session.account_id).await?;
    Ok(account.map(|account| (session, account)))
}

pub async fn delete_session<C: ConnectionTrait>(conn: &C, session_id: Uuid) -> Result<(), DbErr> {
    sessions::Entity::delete_by_id(session_id).exec(conn).await?;
    Ok(())
}
