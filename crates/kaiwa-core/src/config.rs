//! Provider configuration and change notification.
//!
//! Configuration is passed explicitly into the adapter at construction;
//! there is no global state and no polling. Callers that need to react to
//! configuration changes register a callback on a [`ConfigHandle`].

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// Provider identity.
///
/// Variants differ only in endpoint and auth shape; both speak the
/// OpenAI-compatible chat-completions wire format, so the send/stream
/// contract is shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    #[default]
    #[serde(rename = "openai-compatible")]
    OpenAiCompatible,
    Volcengine,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAiCompatible => "openai-compatible",
            ProviderKind::Volcengine => "volcengine",
        }
    }

    /// API root used when the configuration leaves `base_url` empty.
    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::OpenAiCompatible => "https://api.openai.com/v1",
            ProviderKind::Volcengine => "https://ark.cn-beijing.volces.com/api/v3",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for one provider endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub kind: ProviderKind,
    pub api_key: String,
    /// API root. Empty means the provider default.
    #[serde(default)]
    pub base_url: String,
    pub model: String,
    /// Optional JSON-mode response format hint (e.g. "json_object").
    #[serde(default)]
    pub response_format: Option<String>,
}

impl ProviderConfig {
    pub fn new(
        kind: ProviderKind,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            api_key: api_key.into(),
            base_url: String::new(),
            model: model.into(),
            response_format: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_response_format(mut self, hint: impl Into<String>) -> Self {
        self.response_format = Some(hint.into());
        self
    }

    /// Effective API root.
    pub fn base_url(&self) -> &str {
        if self.base_url.is_empty() {
            self.kind.default_base_url()
        } else {
            &self.base_url
        }
    }

    /// Chat-completions endpoint for this provider.
    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url().trim_end_matches('/'))
    }

    pub(crate) fn auth_header(&self) -> String {
        format!("Bearer {}", self.api_key)
    }

    /// Check the configuration is usable, before any request is attempted.
    pub fn validate(&self) -> Result<(), Error> {
        if self.api_key.trim().is_empty() {
            return Err(Error::Configuration("api_key is empty".to_string()));
        }
        if self.model.trim().is_empty() {
            return Err(Error::Configuration("model is empty".to_string()));
        }
        Ok(())
    }
}

/// Callback invoked with the new configuration after a change.
type ConfigObserver = Box<dyn Fn(&ProviderConfig) + Send + Sync>;

/// Shared handle to the active provider configuration.
///
/// Observers registered with [`subscribe`](ConfigHandle::subscribe) are
/// invoked, in registration order, each time [`update`](ConfigHandle::update)
/// swaps the value.
#[derive(Clone)]
pub struct ConfigHandle {
    inner: Arc<ConfigHandleInner>,
}

struct ConfigHandleInner {
    current: RwLock<ProviderConfig>,
    observers: Mutex<Vec<ConfigObserver>>,
}

impl ConfigHandle {
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            inner: Arc::new(ConfigHandleInner {
                current: RwLock::new(config),
                observers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Snapshot of the active configuration.
    pub fn current(&self) -> ProviderConfig {
        self.inner
            .current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Register a change observer.
    pub fn subscribe(&self, observer: impl Fn(&ProviderConfig) + Send + Sync + 'static) {
        self.inner
            .observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(observer));
    }

    /// Replace the active configuration and notify observers.
    pub fn update(&self, config: ProviderConfig) {
        {
            let mut current = self
                .inner
                .current
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            *current = config.clone();
        }
        let observers = self
            .inner
            .observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for observer in observers.iter() {
            observer(&config);
        }
    }
}

impl fmt::Debug for ConfigHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigHandle")
            .field("current", &self.current())
            .finish_non_exhaustive()
    }
}
