//! Chat sessions: retrieval-grounded answers with a running transcript

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::RagConfig;
use crate::error::{Error, ErrorKind, Result};
use crate::providers::LlmProvider;
use crate::retrieval::RetrievalPipeline;
use crate::types::ConversationTurn;

use super::prompt::PromptBuilder;

/// Identifies one conversation
pub type SessionId = Uuid;

/// How an answer came about
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReplyKind {
    /// Answered from retrieved context; `sources` lists the files it came from
    Grounded { sources: Vec<String> },
    /// No usable context, so the model answered directly
    Direct,
    /// Retrieval or generation failed; the text is a user-facing apology
    Failed { error_kind: ErrorKind },
}

/// The assistant's answer to one message
#[derive(Debug, Clone, Serialize)]
pub struct Reply {
    pub text: String,
    pub kind: ReplyKind,
}

/// Per-session knobs, taken from [`RagConfig`]
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub top_k: usize,
    pub assistant_name: String,
    pub llm_timeout: Duration,
}

impl SessionSettings {
    pub fn from_config(config: &RagConfig) -> Self {
        Self {
            top_k: config.session.top_k,
            assistant_name: config.session.assistant_name.clone(),
            llm_timeout: Duration::from_secs(config.llm.timeout_secs),
        }
    }
}

/// One conversation with its own history.
///
/// Every accepted message leaves exactly two turns behind: the user's message
/// and the assistant's answer (or apology).
pub struct ConversationSession {
    id: SessionId,
    history: Vec<ConversationTurn>,
    pipeline: Arc<RetrievalPipeline>,
    llm: Arc<dyn LlmProvider>,
    settings: SessionSettings,
    created_at: DateTime<Utc>,
    last_active: DateTime<Utc>,
}

impl ConversationSession {
    pub fn new(
        id: SessionId,
        pipeline: Arc<RetrievalPipeline>,
        llm: Arc<dyn LlmProvider>,
        settings: SessionSettings,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            history: Vec::new(),
            pipeline,
            llm,
            settings,
            created_at: now,
            last_active: now,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Transcript in order, oldest first
    pub fn history(&self) -> &[ConversationTurn] {
        &self.history
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_active(&self) -> DateTime<Utc> {
        self.last_active
    }

    /// Forget the transcript
    pub fn clear(&mut self) {
        self.history.clear();
        self.last_active = Utc::now();
    }

    /// Answer `message`, recording both sides of the exchange.
    ///
    /// Blank messages are rejected without touching the history. Failures of
    /// retrieval or generation do not surface as `Err`; they become an
    /// apology turn with [`ReplyKind::Failed`].
    ///
    /// Both turns are committed together after the answer settles, so a
    /// `respond` future dropped mid-answer leaves the history as it was.
    pub async fn respond(&mut self, message: &str) -> Result<Reply> {
        if message.trim().is_empty() {
            return Err(Error::EmptyMessage);
        }

        self.last_active = Utc::now();

        let reply = match self.answer(message).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!("Session {} failed to answer: {}", self.id, e);
                Reply {
                    text: format!("Sorry, I encountered an error: {}", e),
                    kind: ReplyKind::Failed { error_kind: e.kind() },
                }
            }
        };

        self.history.push(ConversationTurn::user(message));
        self.history.push(ConversationTurn::assistant(reply.text.clone()));
        self.last_active = Utc::now();
        Ok(reply)
    }

    async fn answer(&self, message: &str) -> Result<Reply> {
        let results = self.pipeline.query(message, self.settings.top_k).await?;
        let context = PromptBuilder::build_context(&results);

        let (prompt, kind) = if context.trim().is_empty() {
            (
                PromptBuilder::direct(&self.settings.assistant_name, message),
                ReplyKind::Direct,
            )
        } else {
            let mut sources: Vec<String> = Vec::new();
            for hit in &results {
                if !sources.contains(&hit.metadata.source) {
                    sources.push(hit.metadata.source.clone());
                }
            }
            (
                PromptBuilder::grounded(&self.settings.assistant_name, &context, message),
                ReplyKind::Grounded { sources },
            )
        };

        let timeout = self.settings.llm_timeout;
        let text = tokio::time::timeout(timeout, self.llm.complete(&prompt))
            .await
            .map_err(|_| Error::Timeout {
                operation: "LLM generation",
                secs: timeout.as_secs(),
            })??;

        Ok(Reply { text, kind })
    }
}

/// All live sessions, keyed by id
pub struct SessionRegistry {
    sessions: DashMap<SessionId, Arc<Mutex<ConversationSession>>>,
    pipeline: Arc<RetrievalPipeline>,
    llm: Arc<dyn LlmProvider>,
    settings: SessionSettings,
}

impl SessionRegistry {
    pub fn new(
        pipeline: Arc<RetrievalPipeline>,
        llm: Arc<dyn LlmProvider>,
        settings: SessionSettings,
    ) -> Self {
        Self {
            sessions: DashMap::new(),
            pipeline,
            llm,
            settings,
        }
    }

    /// Start a new session with a fresh id
    pub fn create(&self) -> (SessionId, Arc<Mutex<ConversationSession>>) {
        let id = Uuid::new_v4();
        (id, self.insert(id))
    }

    fn insert(&self, id: SessionId) -> Arc<Mutex<ConversationSession>> {
        let session = Arc::new(Mutex::new(ConversationSession::new(
            id,
            Arc::clone(&self.pipeline),
            Arc::clone(&self.llm),
            self.settings.clone(),
        )));
        self.sessions.insert(id, Arc::clone(&session));
        tracing::debug!("Created session {}", id);
        session
    }

    pub fn get(&self, id: &SessionId) -> Option<Arc<Mutex<ConversationSession>>> {
        self.sessions.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Existing session for `id`, or a new one. A client holding an id the
    /// registry no longer knows gets a fresh session under that same id.
    pub fn get_or_create(&self, id: Option<SessionId>) -> (SessionId, Arc<Mutex<ConversationSession>>) {
        match id {
            None => self.create(),
            Some(id) => {
                let session = self
                    .sessions
                    .entry(id)
                    .or_insert_with(|| {
                        Arc::new(Mutex::new(ConversationSession::new(
                            id,
                            Arc::clone(&self.pipeline),
                            Arc::clone(&self.llm),
                            self.settings.clone(),
                        )))
                    })
                    .value()
                    .clone();
                (id, session)
            }
        }
    }

    /// Drop a session; true if it existed
    pub fn remove(&self, id: &SessionId) -> bool {
        self.sessions.remove(id).is_some()
    }

    /// Every live session id
    pub fn ids(&self) -> Vec<SessionId> {
        self.sessions.iter().map(|entry| *entry.key()).collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drop sessions idle for longer than `max_idle`. Sessions busy answering
    /// are kept. Returns how many were dropped.
    pub fn prune_idle(&self, max_idle: Duration) -> usize {
        let cutoff = match chrono::Duration::from_std(max_idle) {
            Ok(d) => Utc::now() - d,
            Err(_) => return 0,
        };

        let before = self.sessions.len();
        self.sessions.retain(|_, session| match session.try_lock() {
            Ok(guard) => guard.last_active() >= cutoff,
            Err(_) => true,
        });

        let pruned = before.saturating_sub(self.sessions.len());
        if pruned > 0 {
            tracing::info!("Pruned {} idle sessions", pruned);
        }
        pruned
    }
}
