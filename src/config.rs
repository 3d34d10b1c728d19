use crate::error::{Error, Result};
use crate::models::image_model::ImageModel;
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

pub const DEFAULT_MAX_COVER_IMAGE_BYTES: usize = 12 * 1024 * 1024;

const SERPAPI_KEY_NAMES: [&str; 3] = ["SERPAPI_API_KEY", "SERP_API_KEY", "SERPAPI_KEY"];

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub admin_rps: u32,
    pub serpapi_api_key: Option<String>,
    pub serpapi_base_url: String,
    pub gemini_api_key: Option<String>,
    pub gemini_api_base_url: String,
    pub grok_api_key: Option<String>,
    pub grok_api_base_url: String,
    pub default_image_model: ImageModel,
    pub max_cover_image_bytes: usize,
    pub blob_read_write_token: Option<String>,
    pub blob_api_url: String,
    pub uploads_dir: String,
    pub public_base_url: String,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let server_address = get_env("SERVER_ADDRESS")?;
        let public_base_url = get_optional_env("PUBLIC_BASE_URL")
            .unwrap_or_else(|| format!("http://{}", server_address));

        Ok(Self {
            database_url: get_env("DATABASE_URL")?,
            admin_rps: get_env_parse_or("ADMIN_RPS", 50)?,
            serpapi_api_key: SERPAPI_KEY_NAMES.iter().find_map(|name| get_optional_env(name)),
            serpapi_base_url: base_url_or("SERPAPI_BASE_URL", "https://serpapi.com"),
            gemini_api_key: get_optional_env("GEMINI_API_KEY"),
            gemini_api_base_url: base_url_or(
                "GEMINI_API_BASE_URL",
                "https://generativelanguage.googleapis.com/v1beta",
            ),
            grok_api_key: get_optional_env("GROK_API_KEY"),
            grok_api_base_url: base_url_or("GROK_API_BASE_URL", "https://api.x.ai/v1"),
            default_image_model: ImageModel::default_from(
                get_optional_env("DEFAULT_COVER_IMAGE_MODEL_KEY").as_deref(),
            ),
            max_cover_image_bytes: max_cover_image_bytes(
                get_optional_env("MAX_COVER_IMAGE_BYTES").as_deref(),
            ),
            blob_read_write_token: get_optional_env("BLOB_READ_WRITE_TOKEN"),
            blob_api_url: base_url_or("BLOB_API_URL", "https://blob.vercel-storage.com"),
            uploads_dir: get_optional_env("UPLOADS_DIR").unwrap_or_else(|| "./uploads".to_string()),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            server_address,
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

/// Unset and blank variables are treated the same.
fn get_optional_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get_optional_env(name) {
        Some(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        None => Ok(default),
    }
}

fn base_url_or(name: &str, default: &str) -> String {
    get_optional_env(name)
        .unwrap_or_else(|| default.to_string())
        .trim_end_matches('/')
        .to_string()
}

/// Invalid or non-positive ceilings fall back to the default.
pub fn max_cover_image_bytes(raw: Option<&str>) -> usize {
    raw.and_then(|value| value.trim().parse::<usize>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_MAX_COVER_IMAGE_BYTES)
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
