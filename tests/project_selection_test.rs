//! Project routing against the in-memory store: priority order, availability,
//! reservations, and the training fail-open / gate fail-closed policies.

mod common;

use common::*;
use std::sync::Arc;
use uuid::Uuid;
use workbench_core::config::SelectionConfig;
use workbench_core::constants::{GateStatus, ProjectStatus, SelectionReason};
use workbench_core::orchestration::ProjectSelector;
use workbench_core::store::{InMemoryStore, StoreOperation, TaskClaimProtocol};

fn selector(store: &Arc<InMemoryStore>) -> ProjectSelector {
    ProjectSelector::new(store.clone(), SelectionConfig::default())
}

#[tokio::test]
async fn test_returns_none_for_empty_inputs() {
    let store = Arc::new(InMemoryStore::new());
    let project = ProjectBuilder::new().build(&store);
    QuestionBuilder::new(project.project_id).build(&store);
    let worker = Uuid::new_v4();

    let selector = selector(&store);
    assert!(selector
        .select_next_project(worker, &[], &[project.clone()])
        .await
        .is_none());
    assert!(selector
        .select_next_project(worker, &[assignment(worker, &project, 1)], &[])
        .await
        .is_none());
}

#[tokio::test]
async fn test_lowest_priority_number_wins() {
    let store = Arc::new(InMemoryStore::new());
    let worker = Uuid::new_v4();
    let later = ProjectBuilder::new().with_name("later").build(&store);
    let first = ProjectBuilder::new().with_name("first").build(&store);
    QuestionBuilder::new(later.project_id).build(&store);
    QuestionBuilder::new(first.project_id).build(&store);

    let assignments = vec![assignment(worker, &later, 5), assignment(worker, &first, 1)];
    let selected = selector(&store)
        .select_next_project(worker, &assignments, &[later, first.clone()])
        .await
        .unwrap();

    assert_eq!(selected.project.project_id, first.project_id);
    assert_eq!(selected.available_count, 1);
    assert_eq!(selected.reason, SelectionReason::Available);
}

#[tokio::test]
async fn test_project_without_work_is_skipped_even_when_trained() {
    let store = Arc::new(InMemoryStore::new());
    let worker = Uuid::new_v4();
    let module = training_module(&store);

    let drained = ProjectBuilder::new()
        .with_training_module(module.module_id)
        .build(&store);
    complete_training(&store, worker, &drained, &module);
    let open = ProjectBuilder::new().build(&store);
    QuestionBuilder::new(open.project_id).build(&store);

    let assignments = vec![assignment(worker, &drained, 1), assignment(worker, &open, 2)];
    let selected = selector(&store)
        .select_next_project(worker, &assignments, &[drained, open.clone()])
        .await
        .unwrap();

    assert_eq!(selected.project.project_id, open.project_id);
}

#[tokio::test]
async fn test_inactive_projects_are_skipped() {
    let store = Arc::new(InMemoryStore::new());
    let worker = Uuid::new_v4();
    let paused = ProjectBuilder::new()
        .with_status(ProjectStatus::Paused)
        .build(&store);
    let completed = ProjectBuilder::new()
        .with_status(ProjectStatus::Completed)
        .build(&store);
    QuestionBuilder::new(paused.project_id).build(&store);
    QuestionBuilder::new(completed.project_id).build(&store);

    let assignments = vec![assignment(worker, &paused, 1), assignment(worker, &completed, 2)];
    assert!(selector(&store)
        .select_next_project(worker, &assignments, &[paused, completed])
        .await
        .is_none());
}

#[tokio::test]
async fn test_held_reservation_counts_as_availability() {
    let store = Arc::new(InMemoryStore::new());
    let worker = Uuid::new_v4();
    let project = ProjectBuilder::new().build(&store);
    QuestionBuilder::new(project.project_id).build(&store);

    store
        .claim_next_task(project.project_id, worker)
        .await
        .unwrap()
        .unwrap();

    let selected = selector(&store)
        .select_next_project(worker, &[assignment(worker, &project, 1)], &[project.clone()])
        .await
        .unwrap();
    assert_eq!(selected.available_count, 0);
    assert!(selected.has_active_reservation);

    // Someone else's reservation does not keep the project open for this worker
    let other = Uuid::new_v4();
    assert!(selector(&store)
        .select_next_project(other, &[assignment(other, &project, 1)], &[project])
        .await
        .is_none());
}

#[tokio::test]
async fn test_training_flag_without_module_never_requires_training() {
    let store = Arc::new(InMemoryStore::new());
    let worker = Uuid::new_v4();
    let project = ProjectBuilder::new().training_flagged().build(&store);
    QuestionBuilder::new(project.project_id).build(&store);

    let selected = selector(&store)
        .select_next_project(worker, &[assignment(worker, &project, 1)], &[project])
        .await
        .unwrap();

    assert_eq!(selected.reason, SelectionReason::Available);
    assert!(!selected.training_required);
    assert!(selected.training_completed);
    assert!(selected.training_module.is_none());
}

#[tokio::test]
async fn test_outstanding_training_is_reported_but_does_not_block() {
    let store = Arc::new(InMemoryStore::new());
    let worker = Uuid::new_v4();
    let module = training_module(&store);
    let project = ProjectBuilder::new()
        .with_training_module(module.module_id)
        .build(&store);
    QuestionBuilder::new(project.project_id).build(&store);

    let selected = selector(&store)
        .select_next_project(worker, &[assignment(worker, &project, 1)], &[project.clone()])
        .await
        .unwrap();

    assert_eq!(selected.reason, SelectionReason::TrainingRequired);
    assert!(selected.training_required);
    assert!(!selected.training_completed);
    assert_eq!(selected.training_module, Some(module.clone()));

    let completion = complete_training(&store, worker, &project, &module);
    let selected = selector(&store)
        .select_next_project(worker, &[assignment(worker, &project, 1)], &[project])
        .await
        .unwrap();

    assert_eq!(selected.reason, SelectionReason::Available);
    assert!(selected.training_completed);
    assert_eq!(selected.training_completion_id, Some(completion.completion_id));
}

#[tokio::test]
async fn test_missing_module_row_disables_training() {
    let store = Arc::new(InMemoryStore::new());
    let worker = Uuid::new_v4();
    let project = ProjectBuilder::new()
        .with_training_module(Uuid::new_v4())
        .build(&store);
    QuestionBuilder::new(project.project_id).build(&store);

    let selected = selector(&store)
        .select_next_project(worker, &[assignment(worker, &project, 1)], &[project])
        .await
        .unwrap();

    assert_eq!(selected.reason, SelectionReason::Available);
    assert!(!selected.training_required);
}

#[tokio::test]
async fn test_training_lookup_failure_fails_open() {
    let store = Arc::new(InMemoryStore::new());
    let worker = Uuid::new_v4();
    let module = training_module(&store);
    let project = ProjectBuilder::new()
        .with_training_module(module.module_id)
        .build(&store);
    QuestionBuilder::new(project.project_id).build(&store);

    store.fail_on(StoreOperation::FindTrainingCompletion);
    let selected = selector(&store)
        .select_next_project(worker, &[assignment(worker, &project, 1)], &[project.clone()])
        .await
        .unwrap();
    assert_eq!(selected.reason, SelectionReason::Available);
    assert!(!selected.training_required);

    store.clear_failures();
    store.fail_on(StoreOperation::FindTrainingModule);
    let selected = selector(&store)
        .select_next_project(worker, &[assignment(worker, &project, 1)], &[project])
        .await
        .unwrap();
    assert_eq!(selected.reason, SelectionReason::Available);
    assert!(selected.training_module.is_none());
}

#[tokio::test]
async fn test_gate_requires_non_empty_all_passed_set() {
    let store = Arc::new(InMemoryStore::new());
    let worker = Uuid::new_v4();
    let project = ProjectBuilder::new().with_training_gate().build(&store);
    QuestionBuilder::new(project.project_id).build(&store);
    let assignments = vec![assignment(worker, &project, 1)];
    let projects = vec![project.clone()];

    // No gate rows at all
    assert!(selector(&store)
        .select_next_project(worker, &assignments, &projects)
        .await
        .is_none());

    record_gate(&store, worker, &project, GateStatus::Passed);
    record_gate(&store, worker, &project, GateStatus::Pending);
    assert!(selector(&store)
        .select_next_project(worker, &assignments, &projects)
        .await
        .is_none());

    let passing_worker = Uuid::new_v4();
    record_gate(&store, passing_worker, &project, GateStatus::Passed);
    record_gate(&store, passing_worker, &project, GateStatus::Passed);
    let selected = selector(&store)
        .select_next_project(
            passing_worker,
            &[assignment(passing_worker, &project, 1)],
            &projects,
        )
        .await
        .unwrap();
    assert!(selected.gate_required);
    assert!(selected.gates_passed);
    assert_eq!(selected.reason, SelectionReason::Available);
}

#[tokio::test]
async fn test_gate_lookup_failure_fails_closed() {
    let store = Arc::new(InMemoryStore::new());
    let worker = Uuid::new_v4();
    let gated = ProjectBuilder::new().with_training_gate().build(&store);
    let fallback = ProjectBuilder::new().build(&store);
    QuestionBuilder::new(gated.project_id).build(&store);
    QuestionBuilder::new(fallback.project_id).build(&store);
    record_gate(&store, worker, &gated, GateStatus::Passed);

    store.fail_on(StoreOperation::ListTrainingGates);
    let assignments = vec![assignment(worker, &gated, 1), assignment(worker, &fallback, 2)];
    let selected = selector(&store)
        .select_next_project(worker, &assignments, &[gated, fallback.clone()])
        .await
        .unwrap();

    assert_eq!(selected.project.project_id, fallback.project_id);
}

#[tokio::test]
async fn test_availability_failure_moves_to_next_candidate() {
    let store = Arc::new(InMemoryStore::new());
    let worker = Uuid::new_v4();
    let project = ProjectBuilder::new().build(&store);
    QuestionBuilder::new(project.project_id).build(&store);

    store.fail_on(StoreOperation::CountClaimable);
    assert!(selector(&store)
        .select_next_project(worker, &[assignment(worker, &project, 1)], &[project])
        .await
        .is_none());
}

#[tokio::test]
async fn test_reservation_lookup_failure_counts_as_no_reservation() {
    let store = Arc::new(InMemoryStore::new());
    let worker = Uuid::new_v4();
    let open = ProjectBuilder::new().build(&store);
    let held = ProjectBuilder::new().build(&store);
    QuestionBuilder::new(open.project_id).build(&store);
    QuestionBuilder::new(held.project_id).build(&store);

    // The only row in `held` is reserved by this worker, so it has no claimable work
    store
        .claim_next_task(held.project_id, worker)
        .await
        .unwrap()
        .unwrap();

    store.fail_on(StoreOperation::CountReservations);
    let assignments = vec![assignment(worker, &held, 1), assignment(worker, &open, 2)];
    let selected = selector(&store)
        .select_next_project(worker, &assignments, &[held.clone(), open.clone()])
        .await
        .unwrap();

    assert_eq!(selected.project.project_id, open.project_id);
    assert!(!selected.has_active_reservation);
    assert_eq!(selected.available_count, 1);

    assert!(selector(&store)
        .select_next_project(worker, &[assignment(worker, &held, 1)], &[held])
        .await
        .is_none());
}

#[tokio::test]
async fn test_assignment_for_unknown_project_is_ignored() {
    let store = Arc::new(InMemoryStore::new());
    let worker = Uuid::new_v4();
    let known = ProjectBuilder::new().build(&store);
    QuestionBuilder::new(known.project_id).build(&store);

    let mut orphan = assignment(worker, &known, 0);
    orphan.project_id = Uuid::new_v4();
    let assignments = vec![orphan, assignment(worker, &known, 3)];

    let selected = selector(&store)
        .select_next_project(worker, &assignments, &[known.clone()])
        .await
        .unwrap();
    assert_eq!(selected.project.project_id, known.project_id);
}
