use crate::model::{ChatModel, Message, ModelError, Role};
use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Answers summary requests with "Summary of <title>" and planning requests with a fixed reply.
pub(crate) struct ScriptedModel {
    plan_reply: Option<String>,
    fail_summaries: bool,
    summary_calls: AtomicUsize,
    plan_calls: AtomicUsize,
    last_plan_request: Mutex<Option<String>>,
}

impl ScriptedModel {
    pub(crate) fn new() -> Self {
        Self {
            plan_reply: None,
            fail_summaries: false,
            summary_calls: AtomicUsize::new(0),
            plan_calls: AtomicUsize::new(0),
            last_plan_request: Mutex::new(None),
        }
    }

    pub(crate) fn with_plan(mut self, reply: impl Into<String>) -> Self {
        self.plan_reply = Some(reply.into());
        self
    }

    pub(crate) fn failing_summaries(mut self) -> Self {
        self.fail_summaries = true;
        self
    }

    pub(crate) fn summary_calls(&self) -> usize {
        self.summary_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn plan_calls(&self) -> usize {
        self.plan_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn last_plan_request(&self) -> Option<String> {
        self.last_plan_request.lock().unwrap().clone()
    }
}

fn first(messages: &[Message], role: Role) -> &str {
    messages
        .iter()
        .find(|m| m.role == role)
        .map_or("", |m| m.content.as_str())
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn complete(&self, messages: &[Message]) -> Result<String, ModelError> {
        let user = first(messages, Role::User);
        if first(messages, Role::System).starts_with("You summarize") {
            self.summary_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_summaries {
                return Err(ModelError::EmptyResponse);
            }
            let title = user
                .lines()
                .next()
                .and_then(|line| line.strip_prefix("Section: "))
                .unwrap_or("?");
            return Ok(format!("Summary of {title}"));
        }

        self.plan_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_plan_request.lock().unwrap() = Some(user.to_string());
        self.plan_reply.clone().ok_or(ModelError::Exhausted {
            attempts: 3,
            last: Box::new(ModelError::EmptyResponse),
        })
    }
}

/// A planner reply rewriting `updates` (title, content) and describing them with `changes`.
pub(crate) fn plan_reply(updates: &[(&str, &str)], changes: &[&str]) -> String {
    let sections_to_update: Vec<_> = updates
        .iter()
        .map(|(title, _)| json!({"title": title, "reasoning": "requested"}))
        .collect();
    let updated_sections: Vec<_> = updates
        .iter()
        .map(|(title, content)| json!({"title": title, "content": content}))
        .collect();
    json!({
        "sectionsToUpdate": sections_to_update,
        "updatedSections": updated_sections,
        "summaryOfChanges": changes,
    })
    .to_string()
}
