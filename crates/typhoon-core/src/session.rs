//! Chat session controller
//!
//! Owns the transcript, the composer, the notification slot and the loading
//! flag, and drives the `Idle -> Sending -> Idle` cycle for each turn. All
//! mutation goes through `&mut Session`; the only concurrent piece is the
//! spawned request task, which touches no session state and reports back
//! through a channel as a [`TurnOutcome`].

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;

use crate::api::{ApiError, ChatBackend};
use crate::composer::{AttachError, Attachment, Composer, UNSUPPORTED_FILE_TEXT};
use crate::notification::{DismissReason, Notification};
use crate::state::MessageEntry;
use crate::transcript::Transcript;

pub const CONNECTION_ERROR_TEXT: &str = "Connection error contacting API.";
pub const EMPTY_RESPONSE_TEXT: &str = "Error occurred";

pub type TurnId = u64;

/// Settlement of one dispatched request.
#[derive(Debug)]
pub struct TurnOutcome {
    pub turn: TurnId,
    pub result: Result<String, ApiError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendStatus {
    Dispatched(TurnId),
    /// Nothing to send: blank text and no file
    Empty,
    /// A request is already in flight
    Busy,
}

pub struct Session {
    transcript: Transcript,
    composer: Composer,
    notification: Notification,
    loading: bool,
    in_flight: Option<TurnId>,
    next_turn: TurnId,
    backend: Arc<dyn ChatBackend>,
    settled_tx: mpsc::UnboundedSender<TurnOutcome>,
}

impl Session {
    pub fn new(backend: Arc<dyn ChatBackend>, settled_tx: mpsc::UnboundedSender<TurnOutcome>) -> Self {
        Self {
            transcript: Transcript::new(),
            composer: Composer::new(),
            notification: Notification::new(),
            loading: false,
            in_flight: None,
            next_turn: 1,
            backend,
            settled_tx,
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    pub fn notification(&self) -> &Notification {
        &self.notification
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Whether the send affordance should be enabled.
    pub fn can_send(&self) -> bool {
        !self.loading && self.composer.has_content()
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.composer.set_text(text);
    }

    /// Stage `candidate`. Unsupported types raise the fixed warning instead.
    pub fn attach_file(&mut self, candidate: Attachment, now: Instant) -> bool {
        match self.composer.attach_file(candidate) {
            Ok(()) => true,
            Err(AttachError::UnsupportedType { media_type }) => {
                tracing::info!(%media_type, "rejected attachment");
                self.notification.show(UNSUPPORTED_FILE_TEXT, now);
                false
            }
        }
    }

    pub fn clear_file(&mut self) {
        self.composer.clear_file();
    }

    pub fn notify(&mut self, message: impl Into<String>, now: Instant) {
        self.notification.show(message, now);
    }

    pub fn dismiss_notification(&mut self, reason: DismissReason) -> bool {
        self.notification.close(reason)
    }

    pub fn tick(&mut self, now: Instant) {
        self.notification.tick(now);
    }

    /// Start a turn: snapshot and clear the composer, record the user entry,
    /// and dispatch exactly one request.
    pub fn send(&mut self) -> SendStatus {
        if self.loading {
            tracing::debug!("send ignored, request already in flight");
            return SendStatus::Busy;
        }
        if !self.composer.has_content() {
            return SendStatus::Empty;
        }

        let request = self.composer.take();
        let file_name = request.file.as_ref().map(|f| f.name.clone());
        self.transcript
            .append(MessageEntry::user(request.text.clone(), file_name));

        let turn = self.next_turn;
        self.next_turn += 1;
        self.in_flight = Some(turn);
        self.loading = true;

        let backend = Arc::clone(&self.backend);
        let settled_tx = self.settled_tx.clone();
        tokio::spawn(async move {
            // Run the call in its own task so a panic still settles the turn
            let call = tokio::spawn(async move { backend.send(request).await });
            let result = match call.await {
                Ok(result) => result,
                Err(e) => Err(ApiError::Aborted(e.to_string())),
            };
            // Receiver gone means the session was dropped mid-flight
            let _ = settled_tx.send(TurnOutcome { turn, result });
        });

        tracing::info!(turn, "dispatched chat turn");
        SendStatus::Dispatched(turn)
    }

    /// Record the bot reply for the in-flight turn and return to idle.
    /// Outcomes for any other turn are ignored.
    pub fn settle(&mut self, outcome: TurnOutcome) -> bool {
        if self.in_flight != Some(outcome.turn) {
            tracing::warn!(turn = outcome.turn, "ignoring outcome for unknown turn");
            return false;
        }

        let entry = match outcome.result {
            Ok(body) if body.is_empty() => MessageEntry::bot(EMPTY_RESPONSE_TEXT),
            Ok(body) => MessageEntry::bot(body),
            Err(e) => {
                tracing::warn!(turn = outcome.turn, error = %e, "chat turn failed");
                MessageEntry::bot_error(CONNECTION_ERROR_TEXT, e.to_string())
            }
        };
        self.transcript.append(entry);

        self.in_flight = None;
        self.loading = false;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::SendRequest;
    use crate::state::Sender;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Backend that replays scripted results and records what it was sent.
    struct ScriptedBackend {
        calls: AtomicUsize,
        requests: Mutex<Vec<SendRequest>>,
        replies: Mutex<Vec<Result<String, ApiError>>>,
    }

    impl ScriptedBackend {
        fn new(replies: Vec<Result<String, ApiError>>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
                replies: Mutex::new(replies),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ChatBackend for ScriptedBackend {
        async fn send(&self, request: SendRequest) -> Result<String, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request);
            let mut replies = self.replies.lock().unwrap();
            if replies.is_empty() {
                Ok(String::new())
            } else {
                replies.remove(0)
            }
        }
    }

    struct PanickingBackend;

    #[async_trait]
    impl ChatBackend for PanickingBackend {
        async fn send(&self, _request: SendRequest) -> Result<String, ApiError> {
            panic!("backend exploded");
        }
    }

    fn session_with(
        backend: Arc<dyn ChatBackend>,
    ) -> (Session, mpsc::UnboundedReceiver<TurnOutcome>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Session::new(backend, tx), rx)
    }

    async fn complete_turn(session: &mut Session, rx: &mut mpsc::UnboundedReceiver<TurnOutcome>) {
        let outcome = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("turn should settle")
            .expect("channel open");
        assert!(session.settle(outcome));
    }

    fn png(name: &str) -> Attachment {
        Attachment::new(name, "image/png", vec![1, 2, 3])
    }

    #[tokio::test]
    async fn test_empty_send_mutates_nothing() {
        let backend = ScriptedBackend::new(vec![]);
        let (mut session, _rx) = session_with(backend.clone());
        session.set_text("   ");

        assert_eq!(session.send(), SendStatus::Empty);
        assert!(session.transcript().is_empty());
        assert_eq!(session.composer().text(), "   ");
        assert!(!session.is_loading());

        tokio::task::yield_now().await;
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_send_snapshots_and_clears_composer() {
        let backend = ScriptedBackend::new(vec![Ok("hi there".to_string())]);
        let (mut session, mut rx) = session_with(backend.clone());
        session.set_text("hello");
        assert!(session.attach_file(png("cat.png"), Instant::now()));

        assert!(matches!(session.send(), SendStatus::Dispatched(_)));
        assert!(session.is_loading());
        assert_eq!(session.composer().text(), "");
        assert!(session.composer().file().is_none());

        let user = &session.transcript().entries()[0];
        assert_eq!(user.sender(), Sender::User);
        assert_eq!(user.text(), "hello");
        assert_eq!(user.file_name(), Some("cat.png"));

        complete_turn(&mut session, &mut rx).await;

        let sent = backend.requests.lock().unwrap();
        assert_eq!(sent[0].text, "hello");
        assert_eq!(sent[0].file.as_ref().map(|f| f.name.as_str()), Some("cat.png"));
    }

    #[tokio::test]
    async fn test_file_only_send_is_accepted() {
        let backend = ScriptedBackend::new(vec![Ok("a cat".to_string())]);
        let (mut session, mut rx) = session_with(backend);
        session.attach_file(png("cat.png"), Instant::now());

        assert!(matches!(session.send(), SendStatus::Dispatched(_)));
        complete_turn(&mut session, &mut rx).await;

        let entries = session.transcript().entries();
        assert_eq!(entries[0].text(), "");
        assert_eq!(entries[0].file_name(), Some("cat.png"));
        assert_eq!(entries[1].text(), "a cat");
    }

    #[tokio::test]
    async fn test_second_send_while_loading_is_ignored() {
        let backend = ScriptedBackend::new(vec![Ok("first".to_string())]);
        let (mut session, mut rx) = session_with(backend.clone());

        session.set_text("one");
        assert!(matches!(session.send(), SendStatus::Dispatched(_)));

        session.set_text("two");
        assert_eq!(session.send(), SendStatus::Busy);
        assert_eq!(session.transcript().len(), 1);
        assert_eq!(session.composer().text(), "two");
        assert!(!session.can_send());

        complete_turn(&mut session, &mut rx).await;
        assert_eq!(backend.calls(), 1);
        assert!(session.can_send());
    }

    #[tokio::test]
    async fn test_turns_are_ordered_pairs() {
        let backend = ScriptedBackend::new(vec![Ok("re: A".to_string()), Ok("re: B".to_string())]);
        let (mut session, mut rx) = session_with(backend);

        session.set_text("A");
        session.send();
        complete_turn(&mut session, &mut rx).await;
        session.set_text("B");
        session.send();
        complete_turn(&mut session, &mut rx).await;

        let got: Vec<(Sender, &str)> = session
            .transcript()
            .iter()
            .map(|e| (e.sender(), e.text()))
            .collect();
        assert_eq!(
            got,
            vec![
                (Sender::User, "A"),
                (Sender::Bot, "re: A"),
                (Sender::User, "B"),
                (Sender::Bot, "re: B"),
            ]
        );
    }

    #[tokio::test]
    async fn test_n_turns_yield_2n_entries() {
        let backend = ScriptedBackend::new(vec![]);
        let (mut session, mut rx) = session_with(backend);

        for i in 0..5 {
            session.set_text(format!("msg {}", i));
            session.send();
            complete_turn(&mut session, &mut rx).await;
        }

        assert_eq!(session.transcript().len(), 10);
    }

    #[tokio::test]
    async fn test_failure_appends_connection_error() {
        let backend = ScriptedBackend::new(vec![Err(ApiError::Aborted("boom".to_string()))]);
        let (mut session, mut rx) = session_with(backend);
        session.set_text("hello");
        session.send();
        complete_turn(&mut session, &mut rx).await;

        let bot = session.transcript().last().unwrap();
        assert_eq!(bot.sender(), Sender::Bot);
        assert_eq!(bot.text(), CONNECTION_ERROR_TEXT);
        assert!(bot.diagnostic().unwrap().contains("boom"));
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn test_empty_body_uses_fallback_text() {
        let backend = ScriptedBackend::new(vec![Ok(String::new())]);
        let (mut session, mut rx) = session_with(backend);
        session.set_text("hello");
        session.send();
        complete_turn(&mut session, &mut rx).await;

        assert_eq!(session.transcript().last().unwrap().text(), EMPTY_RESPONSE_TEXT);
    }

    #[tokio::test]
    async fn test_backend_panic_still_settles() {
        let (mut session, mut rx) = session_with(Arc::new(PanickingBackend));
        session.set_text("hello");
        session.send();
        complete_turn(&mut session, &mut rx).await;

        assert_eq!(session.transcript().last().unwrap().text(), CONNECTION_ERROR_TEXT);
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn test_stale_outcome_is_ignored() {
        let backend = ScriptedBackend::new(vec![]);
        let (mut session, _rx) = session_with(backend);

        let stray = TurnOutcome {
            turn: 42,
            result: Ok("stray".to_string()),
        };
        assert!(!session.settle(stray));
        assert!(session.transcript().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_attachment_notifies_once() {
        let backend = ScriptedBackend::new(vec![]);
        let (mut session, _rx) = session_with(backend);
        let now = Instant::now();

        let accepted = session.attach_file(
            Attachment::new("notes.txt", "text/plain", b"x".to_vec()),
            now,
        );

        assert!(!accepted);
        assert!(session.composer().file().is_none());
        assert!(session.notification().is_open());
        assert_eq!(session.notification().message(), UNSUPPORTED_FILE_TEXT);

        assert!(!session.dismiss_notification(DismissReason::Clickaway));
        session.tick(now + Duration::from_millis(3000));
        assert!(!session.notification().is_open());
    }
}
