use super::error::GatewayError;
use super::service::ModelService;
use super::types::{
    normalize_model_name, ChatRequest, GenerateRequest, GenerationReply, ModelDescriptor,
    ModelListing, PullStatus,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// In-memory [`ModelService`] with canned replies and a call log
pub struct MockModelService {
    models: Mutex<Vec<ModelDescriptor>>,
    chat_replies: Mutex<VecDeque<MockReply>>,
    generate_replies: Mutex<VecDeque<MockReply>>,
    calls: Mutex<Vec<RecordedCall>>,
    healthy: AtomicBool,
    listing_fails: AtomicBool,
    pulls_fail: AtomicBool,
}

/// A queued chat or generate outcome
#[derive(Debug)]
pub enum MockReply {
    Reply(GenerationReply),
    Error(GatewayError),
}

impl MockReply {
    pub fn text(content: impl Into<String>) -> Self {
        MockReply::Reply(GenerationReply::Chat(content.into()))
    }

    pub fn error(error: GatewayError) -> Self {
        MockReply::Error(error)
    }
}

/// A call received by the mock
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    HealthCheck,
    ListModels,
    Pull { model: String },
    Chat(ChatRequest),
    Generate(GenerateRequest),
}

impl MockModelService {
    pub fn new() -> Self {
        Self {
            models: Mutex::new(Vec::new()),
            chat_replies: Mutex::new(VecDeque::new()),
            generate_replies: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            healthy: AtomicBool::new(true),
            listing_fails: AtomicBool::new(false),
            pulls_fail: AtomicBool::new(false),
        }
    }

    pub fn with_models<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mock = Self::new();
        *mock.models.lock().unwrap() = names.into_iter().map(ModelDescriptor::new).collect();
        mock
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    pub fn fail_listing(&self, fail: bool) {
        self.listing_fails.store(fail, Ordering::SeqCst);
    }

    pub fn fail_pulls(&self, fail: bool) {
        self.pulls_fail.store(fail, Ordering::SeqCst);
    }

    pub fn add_chat_reply(&self, reply: MockReply) {
        self.chat_replies.lock().unwrap().push_back(reply);
    }

    pub fn add_chat_replies(&self, replies: impl IntoIterator<Item = MockReply>) {
        self.chat_replies.lock().unwrap().extend(replies);
    }

    pub fn add_generate_reply(&self, reply: MockReply) {
        self.generate_replies.lock().unwrap().push_back(reply);
    }

    pub fn remaining_replies(&self) -> usize {
        self.chat_replies.lock().unwrap().len() + self.generate_replies.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn chat_requests(&self) -> Vec<ChatRequest> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                RecordedCall::Chat(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    pub fn generate_requests(&self) -> Vec<GenerateRequest> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                RecordedCall::Generate(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    /// Chat or generate calls, in the order received
    pub fn generation_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, RecordedCall::Chat(_) | RecordedCall::Generate(_)))
            .count()
    }

    fn record(&self, call: RecordedCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn next_reply(
        queue: &Mutex<VecDeque<MockReply>>,
        kind: &str,
    ) -> Result<GenerationReply, GatewayError> {
        match queue.lock().unwrap().pop_front() {
            Some(MockReply::Reply(reply)) => Ok(reply),
            Some(MockReply::Error(error)) => Err(error),
            None => Err(GatewayError::Other {
                message: format!("MockModelService: No more {} replies in queue", kind),
            }),
        }
    }
}

impl Default for MockModelService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelService for MockModelService {
    async fn health_check(&self) -> Result<bool, GatewayError> {
        self.record(RecordedCall::HealthCheck);
        Ok(self.healthy.load(Ordering::SeqCst))
    }

    async fn list_models(&self) -> Result<ModelListing, GatewayError> {
        self.record(RecordedCall::ListModels);
        if self.listing_fails.load(Ordering::SeqCst) {
            return Err(GatewayError::Network {
                message: "MockModelService: listing disabled".to_string(),
            });
        }
        Ok(ModelListing::Wrapped {
            models: self.models.lock().unwrap().clone(),
        })
    }

    async fn pull(
        &self,
        model: &str,
        on_status: &mut (dyn FnMut(PullStatus) + Send),
    ) -> Result<(), GatewayError> {
        self.record(RecordedCall::Pull {
            model: model.to_string(),
        });
        if self.pulls_fail.load(Ordering::SeqCst) {
            return Err(GatewayError::Api {
                status: None,
                message: format!("pull model manifest: {} not found", model),
            });
        }

        on_status(PullStatus::status("pulling manifest"));
        on_status(PullStatus {
            status: "downloading".to_string(),
            total: Some(100),
            completed: Some(100),
            ..Default::default()
        });
        on_status(PullStatus::status("success"));

        self.models
            .lock()
            .unwrap()
            .push(ModelDescriptor::new(normalize_model_name(model)));
        Ok(())
    }

    async fn chat(&self, request: ChatRequest) -> Result<GenerationReply, GatewayError> {
        self.record(RecordedCall::Chat(request));
        Self::next_reply(&self.chat_replies, "chat")
    }

    async fn generate(&self, request: GenerateRequest) -> Result<GenerationReply, GatewayError> {
        self.record(RecordedCall::Generate(request));
        Self::next_reply(&self.generate_replies, "generate")
    }

    fn name(&self) -> &str {
        "MockModelService"
    }
}

impl std::fmt::Debug for MockModelService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockModelService")
            .field("models", &self.models.lock().map(|m| m.len()).unwrap_or(0))
            .field("remaining_replies", &self.remaining_replies())
            .finish()
    }
}
