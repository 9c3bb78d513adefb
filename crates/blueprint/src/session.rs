use std::time::Duration;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::api::ApiClient;
use crate::auth::TokenProvider;
use crate::errors::{ClientError, ClientResult};
use crate::models::message::Message;
use crate::store::ChatStore;
use crate::stream::classifier::{classify, Frame};
use crate::stream::decoder::LineDecoder;
use crate::stream::parser::parse_envelope;

/// Appended when the user stops an in-flight generation.
pub const STOPPED_NOTICE: &str = "⏹️ Streaming Ended";
/// Appended when the transfer fails.
pub const ERROR_NOTICE: &str = "❌ **Error:** Something went wrong while streaming response.";

/// Safety valve bounding unbounded or looping backends; reaching it counts
/// as natural completion, not an error.
pub const DEFAULT_MAX_AGENT_RESULTS: usize = 7;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Upper bound on agent results accepted from one generation. Must be
    /// at least 1.
    pub max_agent_results: usize,
    /// Optional bound on the wait for the next body chunk; elapsing counts
    /// as a transport failure.
    pub idle_read_timeout: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_agent_results: DEFAULT_MAX_AGENT_RESULTS,
            idle_read_timeout: None,
        }
    }
}

/// Lifecycle of one streamed generation request. Terminal states absorb
/// all further events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Streaming,
    Completed,
    Stopped,
    Errored,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SessionState::Completed | SessionState::Stopped | SessionState::Errored
        )
    }
}

/// What a settled session did.
#[derive(Debug)]
pub struct SessionOutcome {
    pub state: SessionState,
    pub agent_results: usize,
    /// Error from the post-settlement chat save, if any. The terminal state
    /// stands regardless.
    pub persist_error: Option<ClientError>,
}

/// Cancels the session's in-flight transfer from outside the read loop.
#[derive(Clone)]
pub struct StopHandle {
    token: CancellationToken,
}

impl StopHandle {
    pub fn stop(&self) {
        self.token.cancel();
    }
}

// How the read loop ended; `settle` turns this into the terminal state.
enum Settlement {
    Completed,
    Stopped,
    Errored,
}

enum ChunkEvent {
    Data(Bytes),
    Failed(reqwest::Error),
    IdleTimeout,
    Done,
}

/// Drives one generation request against one chat: owns the cancellation
/// token, counts accepted results against the cutoff, and performs exactly
/// one terminal transition per session.
///
/// One-shot: a settled session cannot be restarted. Callers must not run
/// two sessions against the same chat at once; sessions on different chats
/// are independent.
pub struct StreamSession {
    chat_id: Uuid,
    config: SessionConfig,
    cancel: Option<CancellationToken>,
    state: SessionState,
    received: usize,
}

impl StreamSession {
    pub fn new(chat_id: Uuid) -> Self {
        Self::with_config(chat_id, SessionConfig::default())
    }

    pub fn with_config(chat_id: Uuid, config: SessionConfig) -> Self {
        Self {
            chat_id,
            config,
            cancel: Some(CancellationToken::new()),
            state: SessionState::Idle,
            received: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn agent_results(&self) -> usize {
        self.received
    }

    /// Handle for stopping the session; `None` once it has settled and the
    /// token is gone.
    pub fn stop_handle(&self) -> Option<StopHandle> {
        self.cancel
            .as_ref()
            .map(|token| StopHandle { token: token.clone() })
    }

    /// Run the session to a terminal state.
    ///
    /// Appends the user message and an empty placeholder assistant message,
    /// issues the generation request, appends one assistant message per
    /// accepted agent result in arrival order, then attempts to persist the
    /// finished chat. Valid once, from `Idle`; the chat must exist.
    pub async fn run(
        &mut self,
        api: &ApiClient,
        tokens: &dyn TokenProvider,
        store: &mut ChatStore,
        prompt: &str,
    ) -> ClientResult<SessionOutcome> {
        if self.state != SessionState::Idle {
            return Err(ClientError::SessionNotIdle);
        }
        let cancel = match &self.cancel {
            Some(token) => token.clone(),
            None => return Err(ClientError::SessionNotIdle),
        };

        store.append_message(self.chat_id, Message::user(prompt))?;
        store.append_message(self.chat_id, Message::assistant(""))?;

        self.received = 0;
        self.state = SessionState::Streaming;
        debug!(chat_id = %self.chat_id, "session streaming");

        let settlement = tokio::select! {
            _ = cancel.cancelled() => Settlement::Stopped,
            response = api.generate_stream(prompt) => match response {
                Ok(response) => self.consume(response, store, &cancel).await,
                Err(err) if cancel.is_cancelled() => {
                    debug!(%err, "request aborted by cancellation");
                    Settlement::Stopped
                }
                Err(err) => {
                    warn!(%err, "failed to open the generation stream");
                    Settlement::Errored
                }
            },
        };

        self.settle(settlement, store);

        let persist_error = match self.persist(api, tokens, store).await {
            Ok(()) => None,
            Err(err) => {
                warn!(chat_id = %self.chat_id, %err, "failed to save chat after session");
                Some(err)
            }
        };

        Ok(SessionOutcome {
            state: self.state,
            agent_results: self.received,
            persist_error,
        })
    }

    async fn consume(
        &mut self,
        response: reqwest::Response,
        store: &mut ChatStore,
        cancel: &CancellationToken,
    ) -> Settlement {
        let mut body = response.bytes_stream();
        let mut decoder = LineDecoder::new();

        loop {
            let event = tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(chat_id = %self.chat_id, "transfer cancelled");
                    return Settlement::Stopped;
                }
                event = next_chunk(&mut body, self.config.idle_read_timeout) => event,
            };

            match event {
                ChunkEvent::Data(bytes) => {
                    for line in decoder.push(&bytes) {
                        if let Some(settlement) = self.handle_line(&line, store) {
                            return settlement;
                        }
                    }
                }
                ChunkEvent::Failed(err) if cancel.is_cancelled() => {
                    debug!(%err, "read unblocked by cancellation");
                    return Settlement::Stopped;
                }
                ChunkEvent::Failed(err) => {
                    warn!(%err, "transfer failed mid-stream");
                    return Settlement::Errored;
                }
                ChunkEvent::IdleTimeout => {
                    warn!("no data within the idle read limit");
                    return Settlement::Errored;
                }
                ChunkEvent::Done => {
                    // Body ended without an explicit end marker; flush the
                    // trailing fragment, then treat it as completion.
                    if let Some(line) = decoder.finish() {
                        if let Some(settlement) = self.handle_line(&line, store) {
                            return settlement;
                        }
                    }
                    return Settlement::Completed;
                }
            }
        }
    }

    // Returns the settlement this line forces, if any.
    fn handle_line(&mut self, line: &str, store: &mut ChatStore) -> Option<Settlement> {
        match classify(line) {
            Frame::Noise => None,
            Frame::EndOfStream => {
                debug!(chat_id = %self.chat_id, "stream end marker received");
                Some(Settlement::Completed)
            }
            Frame::Data(payload) => {
                let envelope = parse_envelope(&payload)?;
                debug!(agent = %envelope.agent_name, "agent result received");
                if let Err(err) = store.append_message(
                    self.chat_id,
                    Message::assistant(envelope.to_message_content()),
                ) {
                    error!(%err, "failed to append agent result");
                    return Some(Settlement::Errored);
                }
                self.received += 1;
                if self.received >= self.config.max_agent_results {
                    debug!(
                        limit = self.config.max_agent_results,
                        "result cutoff reached"
                    );
                    Some(Settlement::Completed)
                } else {
                    None
                }
            }
        }
    }

    // The single terminal transition: invalidates the token, appends the
    // user-facing notice where one is due, records the state.
    fn settle(&mut self, settlement: Settlement, store: &mut ChatStore) {
        if let Some(token) = self.cancel.take() {
            token.cancel();
        }
        self.state = match settlement {
            Settlement::Completed => SessionState::Completed,
            Settlement::Stopped => {
                self.append_notice(store, STOPPED_NOTICE);
                SessionState::Stopped
            }
            Settlement::Errored => {
                self.append_notice(store, ERROR_NOTICE);
                SessionState::Errored
            }
        };
        debug!(
            chat_id = %self.chat_id,
            state = ?self.state,
            results = self.received,
            "session settled"
        );
    }

    fn append_notice(&self, store: &mut ChatStore, notice: &str) {
        if let Err(err) = store.append_message(self.chat_id, Message::assistant(notice)) {
            error!(%err, "failed to append session notice");
        }
    }

    // Persist the finished chat; failure never changes the settled state.
    async fn persist(
        &self,
        api: &ApiClient,
        tokens: &dyn TokenProvider,
        store: &ChatStore,
    ) -> ClientResult<()> {
        let chat = store
            .chat(self.chat_id)
            .ok_or(ClientError::UnknownChat(self.chat_id))?;
        let token = tokens.id_token().await?;
        api.save_chat(&token, chat).await
    }
}

async fn next_chunk<S>(body: &mut S, idle_timeout: Option<Duration>) -> ChunkEvent
where
    S: Stream<Item = reqwest::Result<Bytes>> + Unpin,
{
    let next = match idle_timeout {
        Some(limit) => match timeout(limit, body.next()).await {
            Ok(next) => next,
            Err(_) => return ChunkEvent::IdleTimeout,
        },
        None => body.next().await,
    };
    match next {
        Some(Ok(bytes)) => ChunkEvent::Data(bytes),
        Some(Err(err)) => ChunkEvent::Failed(err),
        None => ChunkEvent::Done,
    }
}
