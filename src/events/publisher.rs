use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::trace;
use uuid::Uuid;

use crate::config::EventsConfig;
use crate::constants::{events, system};

/// Lifecycle events of a single answer submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SubmissionEvent {
    AnswerRecorded {
        answer_id: String,
        question_id: Uuid,
        project_id: Uuid,
        worker_id: Uuid,
        skipped: bool,
    },
    /// The question reached its replication target with this submission
    QuestionCompleted {
        question_id: Uuid,
        project_id: Uuid,
        completed_replications: i32,
    },
    GoldStandardScored {
        question_id: Uuid,
        worker_id: Uuid,
        matched: bool,
    },
    /// The task row was left for the store's completion trigger
    TaskCompletionDeferred { task_id: Uuid, reason: String },
}

impl SubmissionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SubmissionEvent::AnswerRecorded { .. } => events::ANSWER_RECORDED,
            SubmissionEvent::QuestionCompleted { .. } => events::QUESTION_COMPLETED,
            SubmissionEvent::GoldStandardScored { .. } => events::GOLD_STANDARD_SCORED,
            SubmissionEvent::TaskCompletionDeferred { .. } => events::TASK_COMPLETION_DEFERRED,
        }
    }
}

/// Event that has been published
#[derive(Debug, Clone)]
pub struct PublishedEvent {
    pub event: SubmissionEvent,
    pub published_at: DateTime<Utc>,
}

/// Broadcast publisher scoped to one pipeline instance
#[derive(Debug, Clone)]
pub struct SubmissionEventPublisher {
    sender: broadcast::Sender<PublishedEvent>,
}

impl SubmissionEventPublisher {
    /// Create a new event publisher with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn from_config(config: &EventsConfig) -> Self {
        Self::new(config.channel_capacity)
    }

    /// Publish an event. Having no subscribers is not an error.
    pub fn publish(&self, event: SubmissionEvent) {
        let name = event.name();
        let published = PublishedEvent {
            event,
            published_at: Utc::now(),
        };
        match self.sender.send(published) {
            Ok(receivers) => trace!(event = name, receivers, "Event published"),
            Err(broadcast::error::SendError(_)) => trace!(event = name, "Event published with no subscribers"),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PublishedEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for SubmissionEventPublisher {
    fn default() -> Self {
        Self::new(system::EVENT_CHANNEL_CAPACITY)
    }
}
