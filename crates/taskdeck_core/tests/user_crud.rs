use rusqlite::Connection;
use taskdeck_core::db::open_db_in_memory;
use taskdeck_core::{
    RegisterUserRequest, SqliteUserRepository, SubTask, Task, User, UserRepoError, UserRepository,
    UserService, UserValidationError,
};
use uuid::Uuid;

#[test]
fn create_and_get_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::new(&conn);

    let mut user = User::new(
        "ada@example.com",
        Some("Ada".to_string()),
        Some("https://cdn.example.com/ada.png".to_string()),
        Some(r#"{"sub":"g-123"}"#.to_string()),
    );
    let id = repo.create_user(&mut user).unwrap();

    assert_eq!(id, user.id);
    assert!(user.created_at.is_some());

    let loaded = repo.get_user(id).unwrap().unwrap();
    assert_eq!(loaded, user);
    assert_eq!(loaded.email, "ada@example.com");
    assert_eq!(loaded.full_name.as_deref(), Some("Ada"));
    assert_eq!(loaded.google_user_info_json.as_deref(), Some(r#"{"sub":"g-123"}"#));
    assert_eq!(loaded.created_at, user.created_at);
    // Lazy contract: the task collection stays unloaded on plain reads.
    assert!(loaded.tasks().is_empty());
}

#[test]
fn get_user_by_email_finds_the_account() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::new(&conn);

    let mut user = User::new("grace@example.com", None, None, None);
    repo.create_user(&mut user).unwrap();

    let found = repo.get_user_by_email("grace@example.com").unwrap().unwrap();
    assert_eq!(found, user);

    assert!(repo.get_user_by_email("nobody@example.com").unwrap().is_none());
}

#[test]
fn duplicate_email_is_rejected_as_taken() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::new(&conn);

    let mut first = User::new("shared@example.com", None, None, None);
    repo.create_user(&mut first).unwrap();

    let mut second = User::new("shared@example.com", None, None, None);
    let err = repo.create_user(&mut second).unwrap_err();
    assert!(matches!(err, UserRepoError::EmailTaken(email) if email == "shared@example.com"));
}

#[test]
fn create_user_persists_owned_tasks_and_subtasks() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::new(&conn);

    let mut user = User::new("owner@example.com", None, None, None);
    let mut task = Task::new("move house", None, None, None, user.id);
    task.add_subtask(SubTask::new("pack", None, None, None, None));
    user.add_task(task);

    repo.create_user(&mut user).unwrap();

    assert_eq!(count_rows(&conn, "tasks"), 1);
    assert_eq!(count_rows(&conn, "subtasks"), 1);
    assert!(user.tasks()[0].is_persisted());
    assert!(user.tasks()[0].subtasks()[0].is_persisted());
}

#[test]
fn hydrate_tasks_materializes_the_owned_graph() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::new(&conn);

    let mut user = User::new("owner@example.com", None, None, None);
    let mut task = Task::new("garden", None, None, None, user.id);
    task.add_subtask(SubTask::new("weed", None, None, None, None));
    user.add_task(task);
    repo.create_user(&mut user).unwrap();

    let mut reloaded = repo.get_user(user.id).unwrap().unwrap();
    assert!(reloaded.tasks().is_empty());

    repo.hydrate_tasks(&mut reloaded).unwrap();

    assert_eq!(reloaded.tasks().len(), 1);
    let task = &reloaded.tasks()[0];
    assert_eq!(task.user_id, Some(user.id));
    assert_eq!(task.subtasks().len(), 1);
    assert_eq!(task.subtasks()[0].parent_task_id, task.id);
}

#[test]
fn update_user_changes_profile_but_not_created_at() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::new(&conn);

    let mut user = User::new("old@example.com", None, None, None);
    repo.create_user(&mut user).unwrap();
    let created_at = user.created_at;

    user.email = "new@example.com".to_string();
    user.full_name = Some("New Name".to_string());
    repo.update_user(&user).unwrap();

    let loaded = repo.get_user(user.id).unwrap().unwrap();
    assert_eq!(loaded.email, "new@example.com");
    assert_eq!(loaded.full_name.as_deref(), Some("New Name"));
    assert_eq!(loaded.created_at, created_at);
}

#[test]
fn update_to_a_taken_email_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::new(&conn);

    let mut holder = User::new("held@example.com", None, None, None);
    repo.create_user(&mut holder).unwrap();
    let mut mover = User::new("mover@example.com", None, None, None);
    repo.create_user(&mut mover).unwrap();

    mover.email = "held@example.com".to_string();
    let err = repo.update_user(&mover).unwrap_err();
    assert!(matches!(err, UserRepoError::EmailTaken(_)));
}

#[test]
fn update_of_missing_user_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::new(&conn);

    let ghost = User::new("ghost@example.com", None, None, None);
    let err = repo.update_user(&ghost).unwrap_err();
    assert!(matches!(err, UserRepoError::NotFound(id) if id == ghost.id));
}

#[test]
fn delete_user_cascades_through_tasks_to_subtasks() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::new(&conn);

    let mut user = User::new("owner@example.com", None, None, None);
    let mut task = Task::new("estate", None, None, None, user.id);
    task.add_subtask(SubTask::new("inventory", None, None, None, None));
    task.add_subtask(SubTask::new("appraise", None, None, None, None));
    user.add_task(task);
    repo.create_user(&mut user).unwrap();

    assert_eq!(count_rows(&conn, "tasks"), 1);
    assert_eq!(count_rows(&conn, "subtasks"), 2);

    repo.delete_user(user.id).unwrap();

    assert_eq!(count_rows(&conn, "users"), 0);
    assert_eq!(count_rows(&conn, "tasks"), 0);
    assert_eq!(count_rows(&conn, "subtasks"), 0);
}

#[test]
fn delete_of_missing_user_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::new(&conn);

    let err = repo.delete_user(Uuid::new_v4()).unwrap_err();
    assert!(matches!(err, UserRepoError::NotFound(_)));
}

#[test]
fn service_registers_accounts_from_provider_data() {
    let conn = open_db_in_memory().unwrap();
    let service = UserService::new(SqliteUserRepository::new(&conn));

    let user = service
        .register_user(RegisterUserRequest {
            email: "new@example.com".to_string(),
            full_name: Some("New User".to_string()),
            picture_url: None,
            google_user_info_json: Some(r#"{"sub":"g-777"}"#.to_string()),
        })
        .unwrap();

    assert!(user.created_at.is_some());
    let loaded = service.get_user(user.id).unwrap().unwrap();
    assert_eq!(loaded, user);
}

#[test]
fn service_rejects_blank_email() {
    let conn = open_db_in_memory().unwrap();
    let service = UserService::new(SqliteUserRepository::new(&conn));

    let err = service
        .register_user(RegisterUserRequest {
            email: "  ".to_string(),
            full_name: None,
            picture_url: None,
            google_user_info_json: None,
        })
        .unwrap_err();
    assert!(matches!(
        err,
        UserRepoError::Validation(UserValidationError::EmptyEmail)
    ));
}

fn count_rows(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}
