//! Generative paraphrase adapter: provider abstraction + OpenAI-compatible client + mock.
//!
//! The synthesizer only sees `Paraphraser`; whether a real provider exists is decided once
//! at startup by `build_paraphraser` from `SynthSettings` and `Secrets`.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{Secrets, SynthSettings};
use crate::error::SynthError;

// ------------------------------------------------------------
// Public surface
// ------------------------------------------------------------

/// Boxed future returned by providers.
pub type ParaphraseFuture<'a> = Pin<Box<dyn Future<Output = Result<String, SynthError>> + Send + 'a>>;

/// One remote call: system instruction + user prompt in, plain text out.
pub trait Paraphraser: Send + Sync {
    fn paraphrase<'a>(&'a self, system: &'a str, user: &'a str) -> ParaphraseFuture<'a>;
    /// Provider name for logs.
    fn provider_name(&self) -> &'static str;
}

/// Convenient alias used by callers.
pub type DynParaphraser = Arc<dyn Paraphraser>;

/// Factory: a real client when synthesis is enabled and an API key is present, else `None`
/// (the synthesizer then stays on the heuristic path).
pub fn build_paraphraser(
    settings: &SynthSettings,
    secrets: &Secrets,
) -> Result<Option<DynParaphraser>, SynthError> {
    if !settings.enabled {
        return Ok(None);
    }
    match secrets.openai_api_key.as_deref() {
        Some(key) => Ok(Some(Arc::new(OpenAiParaphraser::new(settings, key)?))),
        None => Ok(None),
    }
}

// ------------------------------------------------------------
// OpenAI (Chat Completions)
// ------------------------------------------------------------

pub struct OpenAiParaphraser {
    http: reqwest::Client,
    api_key: String,
    model: String,
    temperature: f32,
    endpoint: String,
}

impl OpenAiParaphraser {
    pub fn new(settings: &SynthSettings, api_key: &str) -> Result<Self, SynthError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("lunar-dream-etl/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| SynthError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            api_key: api_key.to_string(),
            model: settings.model.clone(),
            temperature: settings.temperature,
            endpoint: format!("{}/chat/completions", settings.api_base),
        })
    }
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}
#[derive(Serialize)]
struct Req<'a> {
    model: &'a str,
    messages: Vec<Msg<'a>>,
    temperature: f32,
}
#[derive(Deserialize)]
struct Resp {
    #[serde(default)]
    choices: Vec<Choice>,
}
#[derive(Deserialize)]
struct Choice {
    message: ChoiceMsg,
}
#[derive(Deserialize)]
struct ChoiceMsg {
    #[serde(default)]
    content: Option<String>,
}

impl Paraphraser for OpenAiParaphraser {
    fn paraphrase<'a>(&'a self, system: &'a str, user: &'a str) -> ParaphraseFuture<'a> {
        Box::pin(async move {
            let req = Req {
                model: &self.model,
                messages: vec![
                    Msg {
                        role: "system",
                        content: system,
                    },
                    Msg {
                        role: "user",
                        content: user,
                    },
                ],
                temperature: self.temperature,
            };

            let resp = self
                .http
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&req)
                .send()
                .await
                .map_err(|e| SynthError::Transport(e.to_string()))?;

            if !resp.status().is_success() {
                return Err(SynthError::Status(resp.status().as_u16()));
            }
            let body: Resp = resp
                .json()
                .await
                .map_err(|e| SynthError::Transport(e.to_string()))?;
            let content = body
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .unwrap_or_default();
            clean_answer(&content)
        })
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

// ------------------------------------------------------------
// Mock
// ------------------------------------------------------------

/// Deterministic provider for tests/local runs. `answer: None` simulates a provider failure.
pub struct MockParaphraser {
    pub answer: Option<String>,
    calls: AtomicUsize,
}

impl MockParaphraser {
    pub fn answering(answer: &str) -> Self {
        Self {
            answer: Some(answer.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            answer: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `paraphrase` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Paraphraser for MockParaphraser {
    fn paraphrase<'a>(&'a self, _system: &'a str, _user: &'a str) -> ParaphraseFuture<'a> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let out = match &self.answer {
            Some(a) => clean_answer(a),
            None => Err(SynthError::Transport("mock provider unavailable".to_string())),
        };
        Box::pin(async move { out })
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

// ------------------------------------------------------------
// Sanitization
// ------------------------------------------------------------

/// The answer is used verbatim apart from surrounding whitespace; blank is an error.
pub fn clean_answer(input: &str) -> Result<String, SynthError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        Err(SynthError::EmptyAnswer)
    } else {
        Ok(trimmed.to_string())
    }
}
