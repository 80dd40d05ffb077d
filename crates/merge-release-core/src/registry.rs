use crate::errors::{ReleaseError, Result};
use crate::types::PublishedRelease;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_NPM_REGISTRY: &str = "https://registry.npmjs.org/";

/// Package registry lookups.
pub trait Registry {
    /// Descriptor of the version currently tagged `latest`, or `None` when
    /// the package has never been published.
    fn latest(&self, package_name: &str) -> Result<Option<PublishedRelease>>;
}

#[derive(Debug, Deserialize)]
struct LatestDescriptor {
    name: Option<String>,
    version: String,
    #[serde(rename = "gitHead")]
    git_head: Option<String>,
}

/// npm-compatible registry client (`GET <base>/<name>/latest`).
pub struct NpmRegistry {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl NpmRegistry {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(crate::USER_AGENT)
            .build()
            .map_err(|err| {
                ReleaseError::Registry(format!("failed to build HTTP client: {}", err))
            })?;
        Ok(Self {
            base_url: base_url.to_string(),
            client,
        })
    }

    pub fn default_registry() -> Result<Self> {
        Self::new(DEFAULT_NPM_REGISTRY)
    }
}

impl Registry for NpmRegistry {
    fn latest(&self, package_name: &str) -> Result<Option<PublishedRelease>> {
        let url = build_latest_url(&self.base_url, package_name)?;
        debug!("Querying registry: {}", url);

        let response = self.client.get(url.clone()).send().map_err(|err| {
            ReleaseError::Registry(format!("HTTP request to {} failed: {}", url, err))
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let snippet: String = body.trim().chars().take(400).collect();
            return Err(ReleaseError::Registry(format!(
                "Registry {} returned {}: {}",
                url, status, snippet
            )));
        }

        let body = response.text().map_err(|err| {
            ReleaseError::Registry(format!("failed to read registry response: {}", err))
        })?;
        let descriptor: LatestDescriptor = serde_json::from_str(&body)
            .map_err(|err| ReleaseError::Registry(format!("invalid JSON from {}: {}", url, err)))?;

        Ok(Some(PublishedRelease {
            name: descriptor.name.unwrap_or_else(|| package_name.to_string()),
            version: descriptor.version,
            git_head: descriptor
                .git_head
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        }))
    }
}

fn build_latest_url(base: &str, package_name: &str) -> Result<reqwest::Url> {
    let trimmed = if base.trim().is_empty() {
        DEFAULT_NPM_REGISTRY
    } else {
        base.trim()
    };
    let normalized = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    let base_url = reqwest::Url::parse(&normalized).map_err(|err| {
        ReleaseError::Config(format!("invalid registry URL '{}': {}", base, err))
    })?;
    let encoded = format!("{}/latest", encode_package_name(package_name));
    base_url.join(&encoded).map_err(|err| {
        ReleaseError::Registry(format!(
            "failed to construct registry URL for '{}': {}",
            package_name, err
        ))
    })
}

fn encode_package_name(name: &str) -> String {
    let mut encoded = String::with_capacity(name.len());
    for b in name.bytes() {
        match b {
            b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(b as char)
            }
            b'@' => encoded.push('@'),
            b'/' => encoded.push_str("%2F"),
            other => encoded.push_str(&format!("%{:02X}", other)),
        }
    }
    encoded
}
