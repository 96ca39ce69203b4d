use std::collections::VecDeque;
use std::sync::Mutex;

use anyhow::{anyhow, Result};

use super::{GenerateContentRequest, GenerateContentResponse, GenerativeService};

/// Replays queued replies in order and keeps every request it was sent.
#[derive(Default)]
pub struct ScriptedService {
    replies: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<GenerateContentRequest>>,
}

impl ScriptedService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let service = Self::new();
        for reply in replies {
            service.push_reply(reply);
        }
        service
    }

    pub fn push_reply(&self, text: impl Into<String>) {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(Ok(text.into()));
        }
    }

    pub fn push_failure(&self, message: impl Into<String>) {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(Err(message.into()));
        }
    }

    pub fn requests(&self) -> Vec<GenerateContentRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.requests
            .lock()
            .map(|requests| requests.len())
            .unwrap_or_default()
    }
}

impl GenerativeService for ScriptedService {
    fn name(&self) -> &str {
        "scripted"
    }

    fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        self.requests
            .lock()
            .map_err(|_| anyhow!("scripted request log poisoned"))?
            .push(request.clone());
        let next = self
            .replies
            .lock()
            .map_err(|_| anyhow!("scripted reply queue poisoned"))?
            .pop_front();
        match next {
            Some(Ok(text)) => Ok(GenerateContentResponse {
                text,
                model: request.model.clone(),
                finish_reason: Some("STOP".to_string()),
            }),
            Some(Err(message)) => Err(anyhow!(message)),
            None => Err(anyhow!("scripted service has no reply queued")),
        }
    }
}
