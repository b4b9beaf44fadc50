use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use axum_extra::extract::cookie::Key;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use platform_authn::SessionPolicy;

/// `Key::from` needs 64 bytes of key material (signing + encryption halves).
const MIN_COOKIE_SECRET_BYTES: usize = 64;
const DEFAULT_SESSION_TTL_HOURS: i64 = 720;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub cookie_key: Key,
    pub cors_allowed_origins: Vec<String>,
    pub session: SessionPolicy,
    pub blob_root: PathBuf,
    pub blob_public_url: String,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let cookie_secret =
            std::env::var("COOKIE_SECRET_BASE64").context("COOKIE_SECRET_BASE64 missing")?;
        let cookie_key = cookie_key(&cookie_secret)?;

        let cors_allowed_origins = parse_origins(
            &std::env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:5173".into()),
        );

        let session = match std::env::var("SESSION_TTL_HOURS") {
            Ok(raw) => SessionPolicy::from_hours(
                raw.trim()
                    .parse()
                    .with_context(|| format!("invalid SESSION_TTL_HOURS `{raw}`"))?,
            ),
            Err(_) => SessionPolicy::from_hours(DEFAULT_SESSION_TTL_HOURS),
        };

        let blob_root = std::env::var("BLOB_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./uploads"));
        let blob_public_url =
            std::env::var("BLOB_PUBLIC_URL").unwrap_or_else(|_| "/uploads".into());

        Ok(Self {
            cookie_key,
            cors_allowed_origins,
            session,
            blob_root,
            blob_public_url,
        })
    }
}

fn cookie_key(encoded: &str) -> Result<Key> {
    let secret_bytes = STANDARD
        .decode(encoded.trim())
        .context("invalid COOKIE_SECRET_BASE64")?;
    if secret_bytes.len() < MIN_COOKIE_SECRET_BYTES {
        return Err(anyhow!(
            "COOKIE_SECRET_BASE64 must decode to at least {MIN_COOKIE_SECRET_BYTES} bytes"
        ));
    }
    Ok(Key::from(&secret_bytes[..MIN_COOKIE_SECRET_BYTES]))
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}
