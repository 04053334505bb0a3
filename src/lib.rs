pub mod backend;
pub mod client;
pub mod config;
pub mod contact;
pub mod directory;
pub mod notification;
pub mod session;

use std::env::var;

use anyhow::{Context, Result};
use url::Url;

pub fn api_url_from_env() -> Result<Url> {
    let val = var("API_URL")
        .context("Environment variable API_URL not set")?
        .parse::<Url>()
        .context("Environment variable API_URL invalid")?;

    Ok(val)
}
