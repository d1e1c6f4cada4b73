/*!
 * Mock provider implementations for testing.
 *
 * This module provides a mock provider that simulates different behaviors:
 * - `MockProvider::working()` - Echoes every tagged cue back as a valid response
 * - `MockProvider::failing()` - Always fails with a server error
 * - `MockProvider::truncated()` - Replies without the end marker
 * - `MockProvider::empty()` - Replies with an empty body
 *
 * Replies can also be scripted one call at a time with [`MockReply`]; the
 * script is consumed first and the behavior applies once it runs out. Every
 * request is recorded so tests can inspect the prompts that were sent.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::errors::ProviderError;
use crate::providers::{CompletionRequest, CompletionResponse, Provider};
use crate::translation::context::TermCategory;
use crate::translation::prompts::{END_MARKER, ENTRY_MARKER_PREFIX, TERMS_MARKER, entry_marker};

/// Behavior mode for the mock provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with a well-formed echo of the request
    Working,
    /// Always fails with an error
    Failing,
    /// Returns truncated responses (missing END marker)
    Truncated,
    /// Returns empty response
    Empty,
    /// Simulates slow response (for timeout testing)
    Slow { delay_ms: u64 },
}

/// One scripted reply
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Return this text verbatim
    Text(String),
    /// Fail with this error
    Error(ProviderError),
    /// Wait, then echo the request
    Delay(Duration),
    /// Echo the request
    Echo,
}

/// A source term the echo responder translates and reports
#[derive(Debug, Clone)]
struct TermRule {
    source: String,
    target: String,
    category: TermCategory,
}

/// Mock provider for testing translation behavior
#[derive(Debug, Clone)]
pub struct MockProvider {
    behavior: MockBehavior,
    script: Arc<Mutex<VecDeque<MockReply>>>,
    term_rules: Vec<TermRule>,
    prefix: String,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
    request_count: Arc<AtomicUsize>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            script: Arc::new(Mutex::new(VecDeque::new())),
            term_rules: Vec::new(),
            prefix: "[TRANSLATED] ".to_string(),
            requests: Arc::new(Mutex::new(Vec::new())),
            request_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a working mock provider that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a failing mock provider that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a mock that returns truncated responses
    pub fn truncated() -> Self {
        Self::new(MockBehavior::Truncated)
    }

    /// Create a mock that returns empty responses
    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    /// Queue replies for the next calls, in order
    pub fn with_script(self, replies: impl IntoIterator<Item = MockReply>) -> Self {
        self.script.lock().extend(replies);
        self
    }

    /// Translate `source` as `target` in echoed text and report it as a term
    pub fn with_term(mut self, source: &str, target: &str, category: TermCategory) -> Self {
        self.term_rules.push(TermRule {
            source: source.to_string(),
            target: target.to_string(),
            category,
        });
        self
    }

    /// Text prepended to every echoed line
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = prefix.to_string();
        self
    }

    /// Number of `complete` calls so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Every request received so far
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().clone()
    }

    /// Build a well-formed response for the tagged cues of a request
    pub fn echo_response(&self, request: &CompletionRequest) -> String {
        let mut response = String::new();
        let mut reported: Vec<&TermRule> = Vec::new();

        for (seq_num, lines) in Self::tagged_entries(&request.user) {
            response.push_str(&entry_marker(seq_num));
            response.push('\n');
            for line in lines {
                let mut translated = line.clone();
                for rule in &self.term_rules {
                    if translated.contains(&rule.source) {
                        translated = translated.replace(&rule.source, &rule.target);
                        if !reported.iter().any(|r| r.source == rule.source) {
                            reported.push(rule);
                        }
                    }
                }
                response.push_str(&self.prefix);
                response.push_str(&translated);
                response.push('\n');
            }
        }

        if !reported.is_empty() {
            response.push_str(TERMS_MARKER);
            response.push('\n');
            for rule in reported {
                response.push_str(&format!("{} => {} | {}\n", rule.source, rule.target, rule.category));
            }
        }

        response.push_str(END_MARKER);
        response
    }

    /// Cue index and text lines of every `<<ENTRY_n>>` block in a prompt
    fn tagged_entries(prompt: &str) -> Vec<(usize, Vec<String>)> {
        let mut entries: Vec<(usize, Vec<String>)> = Vec::new();
        let mut current: Option<(usize, Vec<String>)> = None;

        for line in prompt.lines() {
            let tag = line
                .trim()
                .strip_prefix(ENTRY_MARKER_PREFIX)
                .and_then(|rest| rest.strip_suffix(">>"))
                .and_then(|n| n.parse::<usize>().ok());

            if let Some(seq_num) = tag {
                entries.extend(current.take());
                current = Some((seq_num, Vec::new()));
            } else if line.trim().is_empty() {
                entries.extend(current.take());
            } else if let Some((_, lines)) = current.as_mut() {
                lines.push(line.to_string());
            }
        }

        entries.extend(current);
        entries
    }

    fn respond(&self, request: &CompletionRequest, text: String) -> CompletionResponse {
        CompletionResponse {
            prompt_tokens: Some((request.system.len() + request.user.len()) as u64 / 4),
            completion_tokens: Some(text.len() as u64 / 4),
            text,
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        self.request_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request.clone());

        let scripted = self.script.lock().pop_front();
        if let Some(reply) = scripted {
            return match reply {
                MockReply::Text(text) => Ok(self.respond(request, text)),
                MockReply::Error(error) => Err(error),
                MockReply::Delay(delay) => {
                    tokio::time::sleep(delay).await;
                    Ok(self.respond(request, self.echo_response(request)))
                }
                MockReply::Echo => Ok(self.respond(request, self.echo_response(request))),
            };
        }

        match self.behavior {
            MockBehavior::Working => Ok(self.respond(request, self.echo_response(request))),

            MockBehavior::Failing => Err(ProviderError::ApiError {
                message: "Simulated provider failure".to_string(),
                status_code: 500,
            }),

            MockBehavior::Truncated => {
                let mut text = self.echo_response(request);
                text.truncate(text.len() - END_MARKER.len());
                Ok(self.respond(request, text))
            }

            MockBehavior::Empty => Ok(CompletionResponse::default()),

            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Ok(self.respond(request, self.echo_response(request)))
            }
        }
    }

    async fn test_connection(&self, _model: &str) -> Result<(), ProviderError> {
        match self.behavior {
            MockBehavior::Failing => Err(ProviderError::ConnectionError("Simulated connection failure".to_string())),
            _ => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
