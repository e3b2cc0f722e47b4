use anyhow::{Context, Result};
use reqwest::blocking::Client;

use crate::config::Config;

pub fn http_client(config: &Config) -> Result<Client> {
    let mut builder = Client::builder().user_agent(concat!("scout_xi/", env!("CARGO_PKG_VERSION")));
    if let Some(timeout) = config.http_timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().context("failed to build http client")
}
