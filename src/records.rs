//! Client for the canonical record store's internal HTTP API.
//!
//! The record store owns the listing data. Search only ever reads from it:
//! batch lookups by id to hydrate matches, and offset/limit pages plus a
//! total count for the offline indexing job.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::RecordStoreConfig;
use crate::models::PropertyRecord;

/// Fetch full records for a batch of ids. Unknown ids are simply absent from
/// the response; the caller decides what a missing record means.
pub async fn fetch_by_ids(
    client: &reqwest::Client,
    config: &RecordStoreConfig,
    ids: &[String],
) -> Result<Vec<PropertyRecord>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let url = format!("{}/internal/properties/batch", config.base_url);
    let req = BatchRequest { ids: ids.to_vec() };

    let resp = authorize(client.post(&url), config)
        .json(&req)
        .send()
        .await
        .context("Failed to call record store batch lookup")?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("Record store batch lookup returned {status}: {body}");
    }

    let body: PropertiesResponse = resp
        .json()
        .await
        .context("Failed to parse record store batch response")?;

    Ok(body.properties)
}

/// Fetch one page of records in stable id order, for indexing.
pub async fn fetch_page(
    client: &reqwest::Client,
    config: &RecordStoreConfig,
    offset: u64,
    limit: u32,
) -> Result<Vec<PropertyRecord>> {
    let url = format!("{}/internal/properties", config.base_url);

    let resp = authorize(client.get(&url), config)
        .query(&[("offset", offset.to_string()), ("limit", limit.to_string())])
        .send()
        .await
        .context("Failed to call record store page fetch")?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("Record store page fetch returned {status}: {body}");
    }

    let body: PropertiesResponse = resp
        .json()
        .await
        .context("Failed to parse record store page response")?;

    Ok(body.properties)
}

/// Total number of indexable records.
pub async fn count(client: &reqwest::Client, config: &RecordStoreConfig) -> Result<u64> {
    let url = format!("{}/internal/properties/count", config.base_url);

    let resp = authorize(client.get(&url), config)
        .send()
        .await
        .context("Failed to call record store count")?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("Record store count returned {status}: {body}");
    }

    let body: CountResponse = resp
        .json()
        .await
        .context("Failed to parse record store count response")?;

    Ok(body.count)
}

fn authorize(
    req: reqwest::RequestBuilder,
    config: &RecordStoreConfig,
) -> reqwest::RequestBuilder {
    match &config.api_token {
        Some(token) => req.header("Authorization", format!("Bearer {token}")),
        None => req,
    }
}

#[derive(Serialize)]
struct BatchRequest {
    ids: Vec<String>,
}

#[derive(Deserialize)]
struct PropertiesResponse {
    #[serde(default)]
    properties: Vec<PropertyRecord>,
}

#[derive(Deserialize)]
struct CountResponse {
    count: u64,
}
