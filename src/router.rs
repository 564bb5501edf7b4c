//! Top-level orchestration: one [`Router`] per process, built fresh from
//! configuration, owning the cache handle and registry adapter. No
//! process-wide state survives the invocation (spec design note: "global
//! mutable state → per-invocation construction").

use crate::cache::{CacheStore, Freshness};
use crate::config::RouterConfig;
use crate::errors::RouterError;
use crate::language;
use crate::model::{HookInput, Index, SkillDescriptor};
use crate::registry::{self, RegistryAdapter};
use crate::{scoring, selector};

pub struct Router {
    config: RouterConfig,
    adapter: Box<dyn RegistryAdapter>,
    cache: CacheStore,
}

impl Router {
    pub fn new(config: RouterConfig) -> Self {
        let adapter = registry::build_adapter(
            config.registry_kind,
            &config.registry_url,
            config.fetch_timeout,
        );
        let cache = CacheStore::new(
            config.cache_dir.clone(),
            config.index_ttl,
            config.body_ttl,
        );
        Router {
            config,
            adapter,
            cache,
        }
    }

    /// Three-tier retrieval for the index: fresh cache, then remote/local
    /// fetch (persisting on success), then stale cache, then give up.
    fn resolve_index(&self) -> Result<Index, RouterError> {
        let (cached, freshness) = self.cache.get_index();
        if freshness == Freshness::Fresh {
            if let Some(index) = cached {
                return Ok(index);
            }
        }

        match self.adapter.fetch_index() {
            Ok(index) => {
                self.cache.put_index(&index);
                Ok(index)
            }
            Err(fetch_err) => {
                if freshness == Freshness::Stale {
                    if let Some(index) = cached {
                        tracing::debug!("using stale index cache after fetch failure");
                        return Ok(index);
                    }
                }
                Err(fetch_err.into())
            }
        }
    }

    /// Same three-tier policy for a skill body, additionally enforcing the
    /// SHA-256 integrity check against `descriptor.body_hash`.
    fn resolve_body(&self, descriptor: &SkillDescriptor) -> Result<Vec<u8>, RouterError> {
        let (cached, freshness) = self.cache.get_body(&descriptor.id, &descriptor.body_hash);
        if freshness == Freshness::Fresh {
            if let Some(bytes) = cached {
                return Ok(bytes);
            }
        }

        match self.adapter.fetch_body(descriptor) {
            Ok(bytes) => {
                self.cache.put_body(&descriptor.id, &descriptor.body_hash, &bytes);
                Ok(bytes)
            }
            Err(fetch_err) => {
                if freshness == Freshness::Stale {
                    if let Some(bytes) = cached {
                        tracing::debug!(id = %descriptor.id, "using stale body cache after fetch failure");
                        return Ok(bytes);
                    }
                }
                Err(fetch_err.into())
            }
        }
    }

    /// Run one routing decision for `raw_stdin`. Returns `Some(text)` to
    /// print on stdout, or `None` to print nothing. Every internal error
    /// collapses into `None` here — this is the sole boundary where the
    /// "never surface an error" contract is enforced.
    pub fn route(&self, raw_stdin: &str) -> Option<String> {
        match self.route_inner(raw_stdin) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "routing failed, emitting nothing");
                None
            }
        }
    }

    fn route_inner(&self, raw_stdin: &str) -> Result<Option<String>, RouterError> {
        let input: HookInput = serde_json::from_str(raw_stdin)?;

        if input.prompt.trim().is_empty() {
            return Ok(None);
        }

        let index = self.resolve_index()?;
        let language = language::detect(&input.prompt);
        let records = scoring::score_index(&index, &input.prompt, language);

        let selection = match selector::select(&records, self.config.threshold, self.config.ambiguity_gap) {
            Some(s) => s,
            None => return Ok(None),
        };

        let descriptor = match index.find(&selection.winner.skill_id) {
            Some(d) => d,
            None => return Ok(None),
        };

        let body = match self.resolve_body(descriptor) {
            Ok(bytes) => bytes,
            Err(_) => return Ok(None),
        };
        let body_text = String::from_utf8_lossy(&body);

        Ok(selector::render(
            &index,
            &selection,
            &body_text,
            self.config.body_max_chars,
        ))
    }
}
