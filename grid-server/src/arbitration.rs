use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use grid_core::WordLibrary;
use grid_types::{JudgeDecision, Language, RejectReason};

/// Outcome of a full arbitration pass for one word.
#[derive(Debug, Clone, PartialEq)]
pub struct Ruling {
    pub valid: bool,
    pub reject: Option<RejectReason>,
}

impl Ruling {
    fn accepted() -> Self {
        Self {
            valid: true,
            reject: None,
        }
    }

    fn rejected(reason: RejectReason) -> Self {
        Self {
            valid: false,
            reject: Some(reason),
        }
    }
}

/// Community memory for words the shipped dictionaries miss. Verdicts
/// and running vote tallies are keyed by (word, language code).
#[async_trait]
pub trait VerdictStore: Send + Sync {
    async fn cached_verdict(&self, word: &str, language: Language) -> Option<bool>;
    async fn net_votes(&self, word: &str, language: Language) -> i32;
    async fn record_vote(&self, word: &str, language: Language, like: bool);
    async fn record_approval(&self, word: &str, language: Language);
}

#[derive(Default)]
struct VerdictEntry {
    verdict: Option<bool>,
    net_votes: i32,
}

pub struct InMemoryVerdictStore {
    entries: RwLock<HashMap<(String, &'static str), VerdictEntry>>,
}

impl InMemoryVerdictStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    fn key(word: &str, language: Language) -> (String, &'static str) {
        (word.to_string(), language.code())
    }
}

impl Default for InMemoryVerdictStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VerdictStore for InMemoryVerdictStore {
    async fn cached_verdict(&self, word: &str, language: Language) -> Option<bool> {
        let entries = self.entries.read().await;
        entries
            .get(&Self::key(word, language))
            .and_then(|entry| entry.verdict)
    }

    async fn net_votes(&self, word: &str, language: Language) -> i32 {
        let entries = self.entries.read().await;
        entries
            .get(&Self::key(word, language))
            .map(|entry| entry.net_votes)
            .unwrap_or(0)
    }

    async fn record_vote(&self, word: &str, language: Language, like: bool) {
        let mut entries = self.entries.write().await;
        let entry = entries.entry(Self::key(word, language)).or_default();
        entry.net_votes += if like { 1 } else { -1 };
    }

    async fn record_approval(&self, word: &str, language: Language) {
        let mut entries = self.entries.write().await;
        let entry = entries.entry(Self::key(word, language)).or_default();
        entry.verdict = Some(true);
    }
}

#[derive(Serialize)]
struct JudgeRequest<'a> {
    word: &'a str,
    language: &'a str,
}

#[derive(Debug, thiserror::Error)]
pub enum JudgeError {
    #[error("judge request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("judge unavailable: {0}")]
    Unavailable(String),
}

/// External authority consulted only when everything cheaper has no
/// answer for a word.
#[async_trait]
pub trait JudgeClient: Send + Sync {
    async fn judge(&self, word: &str, language: Language) -> Result<JudgeDecision, JudgeError>;
}

pub struct HttpJudgeClient {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl HttpJudgeClient {
    pub fn new(url: String, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
            timeout,
        }
    }
}

#[async_trait]
impl JudgeClient for HttpJudgeClient {
    async fn judge(&self, word: &str, language: Language) -> Result<JudgeDecision, JudgeError> {
        let response = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .json(&JudgeRequest {
                word,
                language: language.code(),
            })
            .send()
            .await?
            .error_for_status()?;

        let decision: JudgeDecision = response.json().await?;
        Ok(decision)
    }
}

/// Layered word arbitration: shipped dictionaries first, then community
/// cache, then crowd votes, then the external judge. Words the judge
/// approves feed back into the cache so the next claim never leaves the
/// process.
pub struct ArbitrationPipeline {
    library: Arc<WordLibrary>,
    store: Arc<dyn VerdictStore>,
    judge: Arc<dyn JudgeClient>,
    vote_threshold: i32,
    confidence_threshold: u8,
}

impl ArbitrationPipeline {
    pub fn new(
        library: Arc<WordLibrary>,
        store: Arc<dyn VerdictStore>,
        judge: Arc<dyn JudgeClient>,
        vote_threshold: i32,
        confidence_threshold: u8,
    ) -> Self {
        Self {
            library,
            store,
            judge,
            vote_threshold,
            confidence_threshold,
        }
    }

    pub async fn record_vote(&self, word: &str, language: Language, like: bool) {
        self.store.record_vote(word, language, like).await;
    }

    /// The word has already passed normalization and path checks; decide
    /// whether it is a real word in the room's language.
    pub async fn arbitrate(&self, word: &str, language: Language) -> Ruling {
        if self.library.contains(word, language) {
            return Ruling::accepted();
        }

        if let Some(verdict) = self.store.cached_verdict(word, language).await {
            debug!(word, cached = verdict, "arbitration served from cache");
            return if verdict {
                Ruling::accepted()
            } else {
                Ruling::rejected(RejectReason::NotAWord)
            };
        }

        if self.store.net_votes(word, language).await >= self.vote_threshold {
            self.persist_approval(word, language);
            return Ruling::accepted();
        }

        match self.judge.judge(word, language).await {
            Ok(decision) if !decision.valid => Ruling::rejected(RejectReason::NotAWord),
            Ok(decision) if decision.confidence < self.confidence_threshold => {
                Ruling::rejected(RejectReason::LowConfidence {
                    confidence: decision.confidence,
                })
            }
            Ok(_) => {
                self.persist_approval(word, language);
                Ruling::accepted()
            }
            Err(e) => {
                // Fail closed; an unreachable judge never mints points.
                warn!(word, error = %e, "external judge unavailable");
                Ruling::rejected(RejectReason::ArbitrationUnavailable)
            }
        }
    }

    fn persist_approval(&self, word: &str, language: Language) {
        let store = self.store.clone();
        let word = word.to_string();
        tokio::spawn(async move {
            store.record_approval(&word, language).await;
        });
    }
}
