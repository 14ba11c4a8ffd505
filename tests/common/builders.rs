//! Test data builders that seed an `InMemoryStore`

#![allow(dead_code)]

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;
use workbench_core::constants::{GateStatus, ProjectStatus};
use workbench_core::models::{
    Project, ProjectAssignment, Question, Task, TrainingCompletion, TrainingGateResult,
    TrainingModule,
};
use workbench_core::store::InMemoryStore;

use super::unique_name;

/// Builder pattern for creating test Projects
pub struct ProjectBuilder {
    name: Option<String>,
    status: ProjectStatus,
    training_required: bool,
    training_module_id: Option<Uuid>,
    requires_training_gate: bool,
    replications_per_question: i32,
}

impl ProjectBuilder {
    pub fn new() -> Self {
        Self {
            name: None,
            status: ProjectStatus::Active,
            training_required: false,
            training_module_id: None,
            requires_training_gate: false,
            replications_per_question: 1,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_status(mut self, status: ProjectStatus) -> Self {
        self.status = status;
        self
    }

    /// Flag training as required without pointing at any module
    pub fn training_flagged(mut self) -> Self {
        self.training_required = true;
        self
    }

    pub fn with_training_module(mut self, module_id: Uuid) -> Self {
        self.training_required = true;
        self.training_module_id = Some(module_id);
        self
    }

    pub fn with_training_gate(mut self) -> Self {
        self.requires_training_gate = true;
        self
    }

    pub fn with_replications(mut self, replications: i32) -> Self {
        self.replications_per_question = replications;
        self
    }

    pub fn build(self, store: &InMemoryStore) -> Project {
        let mut project = Project::new(self.name.unwrap_or_else(|| unique_name("project")));
        project.status = self.status;
        project.training_required = self.training_required;
        project.training_module_id = self.training_module_id;
        project.requires_training_gate = self.requires_training_gate;
        project.replications_per_question = self.replications_per_question;
        store.insert_project(project.clone());
        project
    }
}

/// Builder pattern for creating test Questions with their claimable tasks
pub struct QuestionBuilder {
    project_id: Uuid,
    identifier: Option<String>,
    row_index: i64,
    required_replications: Option<i32>,
    gold_answer: Option<Value>,
    data: Option<Value>,
}

impl QuestionBuilder {
    pub fn new(project_id: Uuid) -> Self {
        Self {
            project_id,
            identifier: None,
            row_index: 0,
            required_replications: None,
            gold_answer: None,
            data: None,
        }
    }

    pub fn with_identifier(mut self, identifier: &str) -> Self {
        self.identifier = Some(identifier.to_string());
        self
    }

    pub fn at_row(mut self, row_index: i64) -> Self {
        self.row_index = row_index;
        self
    }

    pub fn with_required_replications(mut self, required: i32) -> Self {
        self.required_replications = Some(required);
        self
    }

    pub fn with_gold_answer(mut self, answer: Value) -> Self {
        self.gold_answer = Some(answer);
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn build(self, store: &InMemoryStore) -> (Question, Vec<Task>) {
        let identifier = self
            .identifier
            .unwrap_or_else(|| format!("Q-{}", self.row_index));
        let mut question = Question::new(self.project_id, identifier, self.row_index);
        if let Some(required) = self.required_replications {
            question = question.with_required_replications(required);
        }
        if let Some(answer) = self.gold_answer {
            question = question.with_gold_answer(answer);
        }
        if let Some(data) = self.data {
            question.data = data;
        }
        let tasks = store.insert_question(question.clone());
        (question, tasks)
    }
}

pub fn assignment(worker_id: Uuid, project: &Project, priority: i32) -> ProjectAssignment {
    ProjectAssignment::new(worker_id, project.project_id, priority)
}

pub fn training_module(store: &InMemoryStore) -> TrainingModule {
    let module = TrainingModule {
        module_id: Uuid::new_v4(),
        title: unique_name("module"),
        content_url: Some("https://training.example/module".to_string()),
    };
    store.insert_training_module(module.clone());
    module
}

pub fn complete_training(
    store: &InMemoryStore,
    worker_id: Uuid,
    project: &Project,
    module: &TrainingModule,
) -> TrainingCompletion {
    let completion = TrainingCompletion {
        completion_id: Uuid::new_v4(),
        worker_id,
        project_id: project.project_id,
        training_module_id: module.module_id,
        completed_at: Utc::now(),
    };
    store.record_training_completion(completion.clone());
    completion
}

pub fn record_gate(store: &InMemoryStore, worker_id: Uuid, project: &Project, status: GateStatus) {
    store.record_gate_result(TrainingGateResult {
        gate_id: Uuid::new_v4(),
        worker_id,
        project_id: project.project_id,
        gate_name: unique_name("gate"),
        status,
        checked_at: Utc::now(),
    });
}
