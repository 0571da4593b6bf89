//! Asset-index and size-decimals metadata, fetched once at init
//! (spec.md §4.I "fetch asset metadata; build coin→asset_index and
//! coin→szDecimals tables").

use std::collections::HashMap;

use anyhow::{Context, Result};
use reqwest::Client;

#[derive(Debug, Clone, Default)]
pub struct AssetMeta {
    pub coin_to_asset: HashMap<String, u32>,
    pub sz_decimals: HashMap<u32, u32>,
}

impl AssetMeta {
    pub fn asset_index(&self, coin: &str) -> Option<u32> {
        self.coin_to_asset.get(coin).copied()
    }

    pub fn sz_decimals_for(&self, asset_index: u32) -> u32 {
        self.sz_decimals.get(&asset_index).copied().unwrap_or(4)
    }
}

/// Fetches the universe via the public `/info` endpoint (`{"type":"meta"}`)
/// and builds the lookup tables the adapter needs to translate a symbol
/// into an asset index before every signed action.
pub async fn fetch_meta(client: &Client, rest_url: &str) -> Result<AssetMeta> {
    let response = client
        .post(format!("{rest_url}/info"))
        .json(&serde_json::json!({"type": "meta"}))
        .send()
        .await
        .context("meta request failed")?;

    let body: serde_json::Value = response.json().await.context("meta response not JSON")?;
    let universe = body
        .get("universe")
        .and_then(|v| v.as_array())
        .context("meta response missing universe array")?;

    let mut meta = AssetMeta::default();
    for (index, asset) in universe.iter().enumerate() {
        let Some(name) = asset.get("name").and_then(|v| v.as_str()) else {
            continue;
        };
        let asset_index = index as u32;
        let sz_decimals = asset.get("szDecimals").and_then(|v| v.as_u64()).unwrap_or(4) as u32;
        meta.coin_to_asset.insert(name.to_string(), asset_index);
        meta.sz_decimals.insert(asset_index, sz_decimals);
    }
    Ok(meta)
}
