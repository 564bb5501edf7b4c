//! Registry Adapter: fetches the skill index and skill bodies from either a
//! remote HTTPS source or a local filesystem mirror. The two variants are
//! indistinguishable to callers behind the [`RegistryAdapter`] trait.

use crate::errors::AdapterError;
use crate::model::{Index, RawIndex, SkillDescriptor};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub trait RegistryAdapter: Send + Sync {
    fn fetch_index(&self) -> Result<Index, AdapterError>;
    fn fetch_body(&self, descriptor: &SkillDescriptor) -> Result<Vec<u8>, AdapterError>;
}

/// Parses a raw wire index into the validated [`Index`] type. This is the
/// single boundary where an under-specified document (missing optional
/// fields) becomes a structurally-complete record; every caller past this
/// point can assume `tags`/`trigger_keywords`/etc. are present, if empty.
pub fn parse_index(bytes: &[u8]) -> Result<Index, AdapterError> {
    let raw: RawIndex = serde_json::from_slice(bytes)
        .map_err(|e| AdapterError::Malformed(format!("index: {e}")))?;
    Ok(Index {
        generated_at: raw.generated_at,
        skills: raw.skills,
    })
}

fn verify_body(bytes: Vec<u8>, expected_hash: &str) -> Result<Vec<u8>, AdapterError> {
    let actual = hex::encode(Sha256::digest(&bytes));
    if actual != expected_hash {
        return Err(AdapterError::IntegrityMismatch {
            expected: expected_hash.to_string(),
            actual,
        });
    }
    Ok(bytes)
}

/// Remote HTTPS registry: a single index document plus per-skill body
/// documents addressable by `body_path`, joined against `base_url`.
pub struct HttpRegistryAdapter {
    client: reqwest::blocking::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

impl HttpRegistryAdapter {
    pub fn new(base_url: String, timeout: Duration) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::blocking::Client::new());
        HttpRegistryAdapter { client, base_url }
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }
}

impl RegistryAdapter for HttpRegistryAdapter {
    fn fetch_index(&self) -> Result<Index, AdapterError> {
        let url = self.url_for("index.json");
        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| AdapterError::NetworkUnavailable(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let message = resp
                .json::<ErrorBody>()
                .map(|b| b.message)
                .unwrap_or_default();
            return Err(AdapterError::Malformed(format!(
                "index fetch returned {status}: {message}"
            )));
        }

        let bytes = resp
            .bytes()
            .map_err(|e| AdapterError::NetworkUnavailable(e.to_string()))?;
        parse_index(&bytes)
    }

    fn fetch_body(&self, descriptor: &SkillDescriptor) -> Result<Vec<u8>, AdapterError> {
        let url = self.url_for(&descriptor.body_path);
        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| AdapterError::NetworkUnavailable(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(AdapterError::NotFound(descriptor.body_path.clone()));
        }
        if !resp.status().is_success() {
            return Err(AdapterError::Malformed(format!(
                "body fetch returned {}",
                resp.status()
            )));
        }

        let bytes = resp
            .bytes()
            .map_err(|e| AdapterError::NetworkUnavailable(e.to_string()))?
            .to_vec();
        verify_body(bytes, &descriptor.body_hash)
    }
}

/// Local filesystem mirror with the same layout as the HTTP source:
/// `<root>/index.json` and `<root>/<body_path>`.
pub struct LocalRegistryAdapter {
    root: PathBuf,
}

impl LocalRegistryAdapter {
    pub fn new(root: PathBuf) -> Self {
        LocalRegistryAdapter { root }
    }

    fn resolve(&self, relative: &str) -> PathBuf {
        self.root.join(relative.trim_start_matches('/'))
    }
}

impl RegistryAdapter for LocalRegistryAdapter {
    fn fetch_index(&self) -> Result<Index, AdapterError> {
        let path = self.resolve("index.json");
        let bytes = std::fs::read(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AdapterError::NotFound(path.display().to_string())
            } else {
                AdapterError::Malformed(e.to_string())
            }
        })?;
        parse_index(&bytes)
    }

    fn fetch_body(&self, descriptor: &SkillDescriptor) -> Result<Vec<u8>, AdapterError> {
        let path = self.resolve(&descriptor.body_path);
        let bytes = std::fs::read(&path)
            .map_err(|_| AdapterError::NotFound(path.display().to_string()))?;
        verify_body(bytes, &descriptor.body_hash)
    }
}

/// Build the adapter variant chosen by [`crate::config::RouterConfig`].
pub fn build_adapter(
    kind: crate::config::RegistryKind,
    registry_url: &str,
    timeout: Duration,
) -> Box<dyn RegistryAdapter> {
    match kind {
        crate::config::RegistryKind::Http => Box::new(HttpRegistryAdapter::new(
            registry_url.to_string(),
            timeout,
        )),
        crate::config::RegistryKind::Local => {
            Box::new(LocalRegistryAdapter::new(Path::new(registry_url).to_path_buf()))
        }
    }
}
