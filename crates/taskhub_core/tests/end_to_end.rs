use taskhub_core::db::open_db_in_memory;
use taskhub_core::{
    ErrorKind, ProjectService, SessionPreferences, SqliteProjectRepository,
    SqliteTaskRepository, SqliteUserRepository, TaskListRequest, TaskService, TaskState, User,
    UserRepository,
};

#[test]
fn member_task_flow_from_creation_to_conflict() {
    let conn = open_db_in_memory().unwrap();
    let users = SqliteUserRepository::try_new(&conn).unwrap();
    let owner = users.create_user(&User::new("olivia")).unwrap();
    let member = users.create_user(&User::new("mateo")).unwrap();
    let stranger = users.create_user(&User::new("sam")).unwrap();

    let projects = ProjectService::new(
        SqliteProjectRepository::try_new(&conn).unwrap(),
        SqliteUserRepository::try_new(&conn).unwrap(),
    );
    let tasks = TaskService::new(
        SqliteProjectRepository::try_new(&conn).unwrap(),
        SqliteTaskRepository::try_new(&conn).unwrap(),
    );

    let project = projects.create_project(owner.into(), "Release").unwrap();
    assert!(projects.add_member(owner.into(), project.id, member).unwrap());

    let task = tasks
        .create_task(member.into(), project.id, "Write changelog")
        .unwrap();

    let err = tasks
        .edit_task(stranger.into(), task.id, "Hijacked")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    // Completion is reserved for the owner and the assignee.
    tasks
        .assign_task(owner.into(), task.id, Some(member))
        .unwrap();
    let completed = tasks.complete_task(member.into(), task.id).unwrap();
    let audit = completed.state();
    assert!(matches!(audit, TaskState::Completed { by, .. } if by == member));

    let err = tasks.complete_task(owner.into(), task.id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert!((400..500).contains(&err.kind().http_status()));

    let mut session = SessionPreferences::default();
    let request = TaskListRequest {
        status: Some("completed"),
        ..TaskListRequest::default()
    };
    let listing = tasks
        .list_tasks(owner.into(), project.id, &request, &mut session)
        .unwrap();
    assert_eq!(listing.page.items.len(), 1);
    let stored = &listing.page.items[0];
    assert_eq!(stored.task.title, "Write changelog");
    assert_eq!(stored.task.state(), audit);
    assert_eq!(stored.assignee_username.as_deref(), Some("mateo"));
    assert_eq!(listing.counts.completed, 1);
    assert_eq!(listing.counts.pending, 0);
}

#[test]
fn handed_over_project_follows_new_owner_rules() {
    let conn = open_db_in_memory().unwrap();
    let users = SqliteUserRepository::try_new(&conn).unwrap();
    let founder = users.create_user(&User::new("founder")).unwrap();
    let successor = users.create_user(&User::new("successor")).unwrap();

    let projects = ProjectService::new(
        SqliteProjectRepository::try_new(&conn).unwrap(),
        SqliteUserRepository::try_new(&conn).unwrap(),
    );
    let tasks = TaskService::new(
        SqliteProjectRepository::try_new(&conn).unwrap(),
        SqliteTaskRepository::try_new(&conn).unwrap(),
    );

    let project = projects.create_project(founder.into(), "Legacy").unwrap();
    projects
        .add_member(founder.into(), project.id, successor)
        .unwrap();
    let task = tasks
        .create_task(founder.into(), project.id, "Archive")
        .unwrap();

    projects
        .transfer_ownership(founder.into(), project.id, successor)
        .unwrap();

    // The founder is now a plain member and can be assigned work.
    let err = tasks.delete_task(founder.into(), task.id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    tasks
        .assign_task(successor.into(), task.id, Some(founder))
        .unwrap();
    tasks.complete_task(founder.into(), task.id).unwrap();
    tasks.delete_task(successor.into(), task.id).unwrap();

    projects.delete_project(successor.into(), project.id).unwrap();
    assert!(projects.list_projects(founder.into()).unwrap().is_empty());
}
