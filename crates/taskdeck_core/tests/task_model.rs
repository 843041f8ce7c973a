use taskdeck_core::{SubTask, Task, TaskAttributes, TaskStatus};
use uuid::Uuid;

#[test]
fn new_task_sets_defaults() {
    let owner = Uuid::new_v4();
    let task = Task::new("Plan", None, None, None, owner);

    assert_eq!(task.id, None);
    assert_eq!(task.user_id, Some(owner));
    assert_eq!(task.attrs.status, TaskStatus::Pending);
    assert_eq!(task.attrs.created_at, None);
    assert_eq!(task.attrs.updated_at, None);
    assert!(task.subtasks().is_empty());
    assert!(!task.is_persisted());
}

#[test]
fn new_subtask_sets_defaults() {
    let subtask = SubTask::new("step", Some("details".to_string()), Some(10), Some(20), None);

    assert_eq!(subtask.id, None);
    assert_eq!(subtask.parent_task_id, None);
    assert_eq!(subtask.attrs.status, TaskStatus::Pending);
    assert_eq!(subtask.attrs.start_date, Some(10));
    assert_eq!(subtask.attrs.end_date, Some(20));
}

#[test]
fn completion_is_binary_without_subtasks() {
    let mut task = Task::new("solo", None, None, None, Uuid::new_v4());

    assert_eq!(task.completion_percentage(), 0.0);

    task.attrs.status = TaskStatus::Done;
    assert_eq!(task.completion_percentage(), 1.0);

    task.attrs.status = TaskStatus::Cancelled;
    assert_eq!(task.completion_percentage(), 0.0);
}

#[test]
fn completion_is_done_ratio_with_subtasks() {
    let mut task = Task::new("release", None, None, None, Uuid::new_v4());
    task.add_subtask(done_subtask("a"));
    task.add_subtask(pending_subtask("b"));
    task.add_subtask(done_subtask("c"));

    assert_eq!(task.completion_percentage(), 2.0 / 3.0);

    // The task's own status does not matter once subtasks exist.
    task.attrs.status = TaskStatus::Done;
    assert_eq!(task.completion_percentage(), 2.0 / 3.0);
}

#[test]
fn add_subtask_sets_back_reference_and_membership() {
    let mut task = Task::new("parent", None, None, None, Uuid::new_v4());
    task.id = Some(11);

    task.add_subtask(pending_subtask("child"));

    assert_eq!(task.subtasks().len(), 1);
    assert_eq!(task.subtasks()[0].parent_task_id, Some(11));
}

#[test]
fn add_subtask_is_idempotent_by_assigned_id() {
    let mut task = Task::new("parent", None, None, None, Uuid::new_v4());
    task.id = Some(11);

    let mut subtask = pending_subtask("child");
    subtask.id = Some(7);

    task.add_subtask(subtask.clone());
    subtask.attrs.status = TaskStatus::Done;
    task.add_subtask(subtask);

    assert_eq!(task.subtasks().len(), 1);
    assert_eq!(task.subtasks()[0].attrs.status, TaskStatus::Done);
}

#[test]
fn unpersisted_subtasks_always_append() {
    let mut task = Task::new("parent", None, None, None, Uuid::new_v4());

    task.add_subtask(pending_subtask("first"));
    task.add_subtask(pending_subtask("first"));

    assert_eq!(task.subtasks().len(), 2);
}

#[test]
fn remove_subtask_detaches_and_clears_back_reference() {
    let mut task = Task::new("parent", None, None, None, Uuid::new_v4());
    task.id = Some(11);

    let mut subtask = pending_subtask("child");
    subtask.id = Some(7);
    task.add_subtask(subtask);

    let detached = task.remove_subtask(7).unwrap();
    assert_eq!(detached.parent_task_id, None);
    assert!(task.subtasks().is_empty());

    // A second removal is a no-op, not an error.
    assert!(task.remove_subtask(7).is_none());
}

#[test]
fn with_subtasks_adopts_and_reparents_members() {
    let adopted = vec![pending_subtask("one"), done_subtask("two")];
    let task = Task::with_subtasks("parent", None, None, None, Uuid::new_v4(), adopted);

    assert_eq!(task.subtasks().len(), 2);
    for member in task.subtasks() {
        assert_eq!(member.parent_task_id, task.id);
    }
}

#[test]
fn unpersisted_tasks_with_identical_fields_are_not_equal() {
    let owner = Uuid::new_v4();
    let first = Task::new("same", None, Some(1), Some(2), owner);
    let second = Task::new("same", None, Some(1), Some(2), owner);

    assert_ne!(first, second);
    // Not even a clone of itself compares equal by value.
    assert_ne!(first, first.clone());
    // Reference identity is the only pre-persistence identity.
    assert!(std::ptr::eq(&first, &first));
}

#[test]
fn tasks_sharing_an_assigned_id_are_equal() {
    let mut first = Task::new("original", None, None, None, Uuid::new_v4());
    let mut second = Task::new("renamed", Some("other".to_string()), None, None, Uuid::new_v4());
    first.id = Some(42);
    second.id = Some(42);

    assert_eq!(first, second);

    second.id = Some(43);
    assert_ne!(first, second);
}

#[test]
fn subtask_equality_follows_the_same_policy() {
    let mut first = pending_subtask("x");
    let mut second = done_subtask("y");

    assert_ne!(first, second);

    first.id = Some(5);
    second.id = Some(5);
    assert_eq!(first, second);
}

#[test]
fn touch_created_stamps_once_and_touch_updated_refreshes() {
    let mut attrs = TaskAttributes::new("t", None, None, None);

    attrs.touch_created(1_000);
    assert_eq!(attrs.created_at, Some(1_000));
    assert_eq!(attrs.updated_at, Some(1_000));

    attrs.touch_created(2_000);
    assert_eq!(attrs.created_at, Some(1_000));

    attrs.touch_updated(3_000);
    assert_eq!(attrs.created_at, Some(1_000));
    assert_eq!(attrs.updated_at, Some(3_000));
}

#[test]
fn serialization_uses_snake_case_wire_fields() {
    let mut task = Task::new("wire", Some("body".to_string()), Some(1), Some(2), Uuid::new_v4());
    task.attrs.status = TaskStatus::InProgress;
    task.add_subtask(done_subtask("child"));

    let json = serde_json::to_value(&task).unwrap();
    assert_eq!(json["title"], "wire");
    assert_eq!(json["description"], "body");
    assert_eq!(json["status"], "in_progress");
    assert_eq!(json["start_date"], 1);
    assert_eq!(json["end_date"], 2);
    assert!(json["created_at"].is_null());
    assert_eq!(json["subtasks"][0]["status"], "done");
}

fn pending_subtask(title: &str) -> SubTask {
    SubTask::new(title, None, None, None, None)
}

fn done_subtask(title: &str) -> SubTask {
    let mut subtask = pending_subtask(title);
    subtask.attrs.status = TaskStatus::Done;
    subtask
}
