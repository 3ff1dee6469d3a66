use rusqlite::Connection;
use std::sync::Barrier;
use std::time::Duration;
use taskhub_core::db::{open_db, open_db_in_memory, open_db_with_timeout};
use taskhub_core::{
    ErrorKind, Principal, Project, ProjectId, ProjectRepository, ProjectService, RepoResult,
    ServiceError, SqliteProjectRepository, SqliteTaskRepository, SqliteUserRepository,
    TaskRepository, TaskService, TaskState, User, UserId, UserRepository,
};
use uuid::Uuid;

type Tasks<'conn> = TaskService<SqliteProjectRepository<'conn>, SqliteTaskRepository<'conn>>;

fn task_service(conn: &Connection) -> Tasks<'_> {
    TaskService::new(
        SqliteProjectRepository::try_new(conn).unwrap(),
        SqliteTaskRepository::try_new(conn).unwrap(),
    )
}

fn seed_user(conn: &Connection, username: &str) -> UserId {
    SqliteUserRepository::try_new(conn)
        .unwrap()
        .create_user(&User::new(username))
        .unwrap()
}

struct Team {
    owner: UserId,
    member: UserId,
    stranger: UserId,
    project: Project,
}

fn seed_team(conn: &Connection) -> Team {
    let owner = seed_user(conn, "owner");
    let member = seed_user(conn, "member");
    let stranger = seed_user(conn, "stranger");
    let projects = ProjectService::new(
        SqliteProjectRepository::try_new(conn).unwrap(),
        SqliteUserRepository::try_new(conn).unwrap(),
    );
    let project = projects.create_project(owner.into(), "Board").unwrap();
    projects.add_member(owner.into(), project.id, member).unwrap();
    let project = projects.get_project(owner.into(), project.id).unwrap();
    Team {
        owner,
        member,
        stranger,
        project,
    }
}

#[test]
fn owner_and_member_create_pending_tasks() {
    let conn = open_db_in_memory().unwrap();
    let team = seed_team(&conn);
    let tasks = task_service(&conn);

    let by_owner = tasks
        .create_task(team.owner.into(), team.project.id, " Plan ")
        .unwrap();
    let by_member = tasks
        .create_task(team.member.into(), team.project.id, "Build")
        .unwrap();

    assert_eq!(by_owner.title, "Plan");
    assert_eq!(by_owner.state(), TaskState::Pending);
    assert_eq!(by_owner.assigned_to, None);
    assert_eq!(by_member.project_id, team.project.id);

    let err = tasks
        .create_task(team.stranger.into(), team.project.id, "Sneak")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}

#[test]
fn create_task_checks_permission_before_title() {
    let conn = open_db_in_memory().unwrap();
    let team = seed_team(&conn);
    let tasks = task_service(&conn);

    let err = tasks
        .create_task(team.stranger.into(), team.project.id, "  ")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let err = tasks
        .create_task(team.member.into(), team.project.id, "  ")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = tasks
        .create_task(team.member.into(), Uuid::new_v4(), "Orphan")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn edit_is_limited_to_owner_and_assignee() {
    let conn = open_db_in_memory().unwrap();
    let team = seed_team(&conn);
    let tasks = task_service(&conn);
    let task = tasks
        .create_task(team.member.into(), team.project.id, "Draft")
        .unwrap();

    // Creating a task does not make the creator its assignee.
    let err = tasks
        .edit_task(team.member.into(), task.id, "Member edit")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    tasks
        .assign_task(team.owner.into(), task.id, Some(team.member))
        .unwrap();
    let edited = tasks
        .edit_task(team.member.into(), task.id, "Member edit")
        .unwrap();
    assert_eq!(edited.title, "Member edit");

    let edited = tasks
        .edit_task(team.owner.into(), task.id, "Owner edit")
        .unwrap();
    assert_eq!(edited.title, "Owner edit");

    let err = tasks
        .edit_task(team.owner.into(), task.id, "")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let stored = SqliteTaskRepository::try_new(&conn)
        .unwrap()
        .get_task(task.id)
        .unwrap()
        .unwrap();
    assert_eq!(stored.title, "Owner edit");
}

#[test]
fn completion_is_single_fire() {
    let conn = open_db_in_memory().unwrap();
    let team = seed_team(&conn);
    let tasks = task_service(&conn);
    let task = tasks
        .create_task(team.owner.into(), team.project.id, "Ship")
        .unwrap();
    tasks
        .assign_task(team.owner.into(), task.id, Some(team.member))
        .unwrap();

    let completed = tasks.complete_task(team.member.into(), task.id).unwrap();
    let TaskState::Completed { by, at } = completed.state() else {
        panic!("task should be completed");
    };
    assert_eq!(by, team.member);

    for actor in [team.owner, team.member] {
        let err = tasks.complete_task(actor.into(), task.id).unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyCompleted(id) if id == task.id));
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.kind().http_status(), 409);
    }

    let stored = SqliteTaskRepository::try_new(&conn)
        .unwrap()
        .get_task(task.id)
        .unwrap()
        .unwrap();
    assert_eq!(stored.state(), TaskState::Completed { by, at });
}

#[test]
fn forbidden_completion_leaves_task_pending() {
    let conn = open_db_in_memory().unwrap();
    let team = seed_team(&conn);
    let tasks = task_service(&conn);
    let task = tasks
        .create_task(team.owner.into(), team.project.id, "Guarded")
        .unwrap();

    for actor in [team.member, team.stranger] {
        let err = tasks.complete_task(actor.into(), task.id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }
    let err = tasks
        .complete_task(team.owner.into(), Uuid::new_v4())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let stored = SqliteTaskRepository::try_new(&conn)
        .unwrap()
        .get_task(task.id)
        .unwrap()
        .unwrap();
    assert_eq!(stored.state(), TaskState::Pending);
}

#[test]
fn assignment_rules() {
    let conn = open_db_in_memory().unwrap();
    let team = seed_team(&conn);
    let tasks = task_service(&conn);
    let task = tasks
        .create_task(team.owner.into(), team.project.id, "Assign me")
        .unwrap();

    let err = tasks
        .assign_task(team.member.into(), task.id, Some(team.member))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let err = tasks
        .assign_task(team.owner.into(), task.id, Some(team.stranger))
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::AssigneeNotMember { assignee, .. } if assignee == team.stranger
    ));
    assert_eq!(err.kind().http_status(), 400);

    // The owner holds no membership row and is not an assignment target.
    let err = tasks
        .assign_task(team.owner.into(), task.id, Some(team.owner))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let repo = SqliteTaskRepository::try_new(&conn).unwrap();
    assert_eq!(repo.get_task(task.id).unwrap().unwrap().assigned_to, None);

    let assigned = tasks
        .assign_task(team.owner.into(), task.id, Some(team.member))
        .unwrap();
    assert_eq!(assigned.assigned_to, Some(team.member));

    let cleared = tasks.assign_task(team.owner.into(), task.id, None).unwrap();
    assert_eq!(cleared.assigned_to, None);
    assert_eq!(repo.get_task(task.id).unwrap().unwrap().assigned_to, None);
}

#[test]
fn only_owner_deletes_tasks() {
    let conn = open_db_in_memory().unwrap();
    let team = seed_team(&conn);
    let tasks = task_service(&conn);
    let task = tasks
        .create_task(team.member.into(), team.project.id, "Disposable")
        .unwrap();

    let err = tasks.delete_task(team.member.into(), task.id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    tasks.delete_task(team.owner.into(), task.id).unwrap();
    let err = tasks.delete_task(team.owner.into(), task.id).unwrap_err();
    assert!(matches!(err, ServiceError::TaskNotFound(id) if id == task.id));
}

#[test]
fn stranger_mutations_leave_state_unchanged() {
    let conn = open_db_in_memory().unwrap();
    let team = seed_team(&conn);
    let tasks = task_service(&conn);
    let task = tasks
        .create_task(team.owner.into(), team.project.id, "Untouchable")
        .unwrap();
    let stranger: Principal = team.stranger.into();

    let outcomes = [
        tasks.create_task(stranger, team.project.id, "x").map(|_| ()),
        tasks.edit_task(stranger, task.id, "x").map(|_| ()),
        tasks.complete_task(stranger, task.id).map(|_| ()),
        tasks
            .assign_task(stranger, task.id, Some(team.member))
            .map(|_| ()),
        tasks.delete_task(stranger, task.id),
    ];
    for outcome in outcomes {
        assert_eq!(outcome.unwrap_err().kind(), ErrorKind::Forbidden);
    }

    let stored = SqliteTaskRepository::try_new(&conn)
        .unwrap()
        .get_task(task.id)
        .unwrap()
        .unwrap();
    assert_eq!(stored, task);
}

#[test]
fn anonymous_is_sent_to_login() {
    let conn = open_db_in_memory().unwrap();
    let team = seed_team(&conn);
    let tasks = task_service(&conn);
    let task = tasks
        .create_task(team.owner.into(), team.project.id, "Private")
        .unwrap();
    let anonymous = Principal::Anonymous;

    let outcomes = [
        tasks.create_task(anonymous, team.project.id, "x").map(|_| ()),
        tasks.edit_task(anonymous, task.id, "x").map(|_| ()),
        tasks.complete_task(anonymous, task.id).map(|_| ()),
        tasks.assign_task(anonymous, task.id, None).map(|_| ()),
        tasks.delete_task(anonymous, task.id),
    ];
    for outcome in outcomes {
        assert_eq!(outcome.unwrap_err().kind(), ErrorKind::Unauthenticated);
    }
}

#[test]
fn store_compare_and_set_rejects_stale_completion() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("race.sqlite3");
    let conn = open_db(&path).unwrap();
    let team = seed_team(&conn);
    let task = task_service(&conn)
        .create_task(team.owner.into(), team.project.id, "Contested")
        .unwrap();

    let first = open_db(&path).unwrap();
    let second = open_db(&path).unwrap();
    let first_repo = SqliteTaskRepository::try_new(&first).unwrap();
    let second_repo = SqliteTaskRepository::try_new(&second).unwrap();

    // Both sides observed the task as pending.
    assert!(!first_repo.get_task(task.id).unwrap().unwrap().is_completed);
    assert!(!second_repo.get_task(task.id).unwrap().unwrap().is_completed);

    assert!(first_repo.mark_completed(task.id, team.owner, 10).unwrap());
    assert!(!second_repo.mark_completed(task.id, team.member, 20).unwrap());

    let stored = second_repo.get_task(task.id).unwrap().unwrap();
    assert_eq!(
        stored.state(),
        TaskState::Completed {
            by: team.owner,
            at: 10
        }
    );
}

#[test]
fn concurrent_completions_yield_one_winner() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("threads.sqlite3");
    let conn = open_db(&path).unwrap();
    let team = seed_team(&conn);
    let tasks = task_service(&conn);
    let task = tasks
        .create_task(team.owner.into(), team.project.id, "Contested")
        .unwrap();
    tasks
        .assign_task(team.owner.into(), task.id, Some(team.member))
        .unwrap();

    let task_id = task.id;
    let barrier = Barrier::new(2);
    let outcomes: Vec<Result<UserId, ServiceError>> = std::thread::scope(|scope| {
        let handles: Vec<_> = [team.owner, team.member]
            .into_iter()
            .map(|actor| {
                let path = path.as_path();
                let barrier = &barrier;
                scope.spawn(move || {
                    let conn = open_db_with_timeout(path, Duration::from_secs(10)).unwrap();
                    let tasks = task_service(&conn);
                    barrier.wait();
                    tasks.complete_task(actor.into(), task_id).map(|_| actor)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    });

    let winners: Vec<UserId> = outcomes
        .iter()
        .filter_map(|outcome| outcome.as_ref().ok().copied())
        .collect();
    assert_eq!(winners.len(), 1);
    let losers: Vec<&ServiceError> = outcomes
        .iter()
        .filter_map(|outcome| outcome.as_ref().err())
        .collect();
    assert_eq!(losers.len(), 1);
    assert_eq!(losers[0].kind(), ErrorKind::Conflict);

    let stored = SqliteTaskRepository::try_new(&conn)
        .unwrap()
        .get_task(task.id)
        .unwrap()
        .unwrap();
    assert_eq!(stored.completed_by, Some(winners[0]));
}

/// Serves every call from the store except project lookups, which behave as
/// if the project was deleted right after the task row was read.
struct VanishingProjects<'conn>(SqliteProjectRepository<'conn>);

impl ProjectRepository for VanishingProjects<'_> {
    fn create_project(&self, project: &Project) -> RepoResult<ProjectId> {
        self.0.create_project(project)
    }

    fn get_project(&self, _id: ProjectId) -> RepoResult<Option<Project>> {
        Ok(None)
    }

    fn list_projects_for_user(&self, user: UserId) -> RepoResult<Vec<Project>> {
        self.0.list_projects_for_user(user)
    }

    fn delete_project(&self, id: ProjectId) -> RepoResult<()> {
        self.0.delete_project(id)
    }

    fn add_member(&self, project: ProjectId, user: UserId) -> RepoResult<bool> {
        self.0.add_member(project, user)
    }

    fn remove_member(&self, project: ProjectId, user: UserId) -> RepoResult<bool> {
        self.0.remove_member(project, user)
    }

    fn transfer_ownership(&self, project: ProjectId, from: UserId, to: UserId) -> RepoResult<bool> {
        self.0.transfer_ownership(project, from, to)
    }
}

#[test]
fn task_whose_project_vanished_between_reads_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let team = seed_team(&conn);
    let task = task_service(&conn)
        .create_task(team.owner.into(), team.project.id, "Orphaned")
        .unwrap();

    let tasks = TaskService::new(
        VanishingProjects(SqliteProjectRepository::try_new(&conn).unwrap()),
        SqliteTaskRepository::try_new(&conn).unwrap(),
    );

    let err = tasks.complete_task(team.owner.into(), task.id).unwrap_err();
    assert!(matches!(err, ServiceError::TaskNotFound(id) if id == task.id));
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.kind().http_status(), 404);

    let err = tasks
        .edit_task(team.owner.into(), task.id, "Renamed")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
