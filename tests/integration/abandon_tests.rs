use std::sync::{Arc, Barrier};
use std::thread;

use vetter_core::types::{Change, ChangeInfo, ChangeStatus, Principal};
use vetter_core::{now_ms, BranchRef, ChangeId, ProjectKey, Transition};
use vetter_policy::groups::{ADMINISTRATORS, REGISTERED_USERS};
use vetter_policy::{AccessPolicy, Capability, Grant, PermissionGate};
use vetter_review::{AbandonRestoreService, BatchRequest, ErrorKind, TransactionCoordinator};
use vetter_store::ChangeStore;

struct Fixture {
    _tmp: tempfile::TempDir,
    store: Arc<ChangeStore>,
    service: AbandonRestoreService,
    project: ProjectKey,
    admin: Principal,
    user: Principal,
}

fn make_fixture() -> Fixture {
    let tmp = tempfile::tempdir().unwrap();
    let store = Arc::new(ChangeStore::init(tmp.path()).unwrap());
    let project = ProjectKey::new("project").unwrap();
    store.create_project(&project).unwrap();
    let gate = Arc::new(PermissionGate::new(AccessPolicy::bootstrap()).unwrap());
    let service = AbandonRestoreService::new(store.clone(), gate);
    Fixture {
        _tmp: tmp,
        store,
        service,
        project,
        admin: Principal::user("admin").with_group(ADMINISTRATORS),
        user: Principal::user("user"),
    }
}

impl Fixture {
    fn create_change_in(&self, project: &ProjectKey) -> String {
        let change = Change::new(
            project.clone(),
            BranchRef::new("master").unwrap(),
            "admin",
            "test commit",
            now_ms(),
        );
        self.store.insert_change(change).unwrap().change.id.to_string()
    }

    fn create_change(&self) -> String {
        self.create_change_in(&self.project)
    }

    fn create_draft_change(&self) -> String {
        let change = Change::new_draft(
            self.project.clone(),
            BranchRef::new("master").unwrap(),
            "admin",
            "draft commit",
            now_ms(),
        );
        self.store.insert_change(change).unwrap().change.id.to_string()
    }

    fn get(&self, id: &str) -> ChangeInfo {
        self.service.get(id, &self.admin).unwrap()
    }

    fn status(&self, id: &str) -> ChangeStatus {
        self.get(id).status()
    }

    fn last_message(&self, id: &str) -> String {
        self.get(id).last_message().unwrap().text.to_lowercase()
    }

    fn change_id(id: &str) -> ChangeId {
        ChangeId::from_string(id).unwrap()
    }
}

#[test]
fn abandon() {
    let f = make_fixture();
    let id = f.create_change();
    assert_eq!(f.status(&id), ChangeStatus::New);

    f.service.abandon(&id, &f.admin, None).unwrap();
    assert_eq!(f.status(&id), ChangeStatus::Abandoned);
    assert!(f.last_message(&id).contains("abandoned"));

    let err = f.service.abandon(&id, &f.admin, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert!(err.to_string().contains("change is abandoned"));
}

#[test]
fn batch_abandon() {
    let f = make_fixture();
    let a = f.create_change();
    let b = f.create_change();

    f.service
        .batch_abandon(
            &f.project,
            &f.admin,
            &[Fixture::change_id(&a), Fixture::change_id(&b)],
            Some("deadbeef"),
        )
        .unwrap();

    for id in [&a, &b] {
        assert_eq!(f.status(id), ChangeStatus::Abandoned);
        let last = f.last_message(id);
        assert!(last.contains("abandoned"));
        assert!(last.contains("deadbeef"));
    }
}

#[test]
fn batch_abandon_change_project() {
    let f = make_fixture();
    let project1 = ProjectKey::new("project1").unwrap();
    let project2 = ProjectKey::new("project2").unwrap();
    f.store.create_project(&project1).unwrap();
    f.store.create_project(&project2).unwrap();

    let a = f.create_change_in(&project1);
    let b = f.create_change_in(&project2);

    let err = f
        .service
        .batch_abandon(
            &project1,
            &f.admin,
            &[Fixture::change_id(&a), Fixture::change_id(&b)],
            None,
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(
        err.to_string(),
        format!("Project name \"{project2}\" doesn't match \"{project1}\"")
    );
    assert_eq!(f.status(&a), ChangeStatus::New);
    assert_eq!(f.status(&b), ChangeStatus::New);
}

#[test]
fn batch_abandon_is_all_or_nothing() {
    let f = make_fixture();
    let a = f.create_change();
    let b = f.create_change();
    f.service.abandon(&b, &f.admin, None).unwrap();
    let messages_before = f.get(&a).messages.len();

    let err = f
        .service
        .batch_abandon(
            &f.project,
            &f.admin,
            &[Fixture::change_id(&a), Fixture::change_id(&b)],
            Some("cleanup"),
        )
        .unwrap_err();
    assert!(err.to_string().contains("change is abandoned"));
    assert_eq!(f.status(&a), ChangeStatus::New);
    assert_eq!(f.get(&a).messages.len(), messages_before);
}

#[test]
fn batch_abandon_requires_permission_on_every_change() {
    let f = make_fixture();
    let own = Change::new(
        f.project.clone(),
        BranchRef::new("master").unwrap(),
        "user",
        "user's change",
        now_ms(),
    );
    let own = f.store.insert_change(own).unwrap().change.id;
    let foreign = Fixture::change_id(&f.create_change());

    let err = f
        .service
        .batch_abandon(&f.project, &f.user, &[own, foreign], None)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);
    assert_eq!(err.to_string(), "abandon not permitted");
    assert_eq!(f.status(&own.to_string()), ChangeStatus::New);
    assert_eq!(f.status(&foreign.to_string()), ChangeStatus::New);
}

#[test]
fn abandon_draft() {
    let f = make_fixture();
    let id = f.create_draft_change();
    assert_eq!(f.status(&id), ChangeStatus::Draft);

    let err = f.service.abandon(&id, &f.admin, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert!(err.to_string().contains("draft changes cannot be abandoned"));
}

#[test]
fn abandon_merged() {
    let f = make_fixture();
    let id = f.create_change();
    TransactionCoordinator::new(f.store.clone())
        .apply_batch(
            &BatchRequest::new(f.project.clone(), f.admin.clone(), vec![Fixture::change_id(&id)]),
            Transition::Merge,
        )
        .unwrap();
    assert_eq!(f.status(&id), ChangeStatus::Merged);

    let err = f.service.abandon(&id, &f.admin, None).unwrap_err();
    assert_eq!(err.to_string(), "change is merged");
    let err = f.service.restore(&id, &f.admin, None).unwrap_err();
    assert_eq!(err.to_string(), "change is merged");
}

#[test]
fn abandon_not_allowed_without_permission() {
    let f = make_fixture();
    let id = f.create_change();
    assert_eq!(f.status(&id), ChangeStatus::New);

    let err = f.service.abandon(&id, &f.user, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);
    assert!(err.to_string().contains("abandon not permitted"));
    assert_eq!(f.status(&id), ChangeStatus::New);
}

#[test]
fn abandon_and_restore_allowed_with_permission() {
    let f = make_fixture();
    let id = f.create_change();
    assert_eq!(f.status(&id), ChangeStatus::New);

    f.service
        .gate()
        .grant(Grant::new(
            f.project.as_str(),
            "refs/heads/master",
            Capability::Abandon,
            REGISTERED_USERS,
        ))
        .unwrap();

    f.service.abandon(&id, &f.user, None).unwrap();
    assert_eq!(f.status(&id), ChangeStatus::Abandoned);
    f.service.restore(&id, &f.user, None).unwrap();
    assert_eq!(f.status(&id), ChangeStatus::New);
}

#[test]
fn granting_abandon_makes_the_same_calls_succeed() {
    let f = make_fixture();
    let id = f.create_change();

    let err = f.service.abandon(&id, &f.user, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);
    assert_eq!(f.status(&id), ChangeStatus::New);

    f.service
        .gate()
        .grant(Grant::new(
            f.project.as_str(),
            "refs/heads/*",
            Capability::Abandon,
            REGISTERED_USERS,
        ))
        .unwrap();

    f.service.abandon(&id, &f.user, None).unwrap();
    assert_eq!(f.status(&id), ChangeStatus::Abandoned);
    f.service.restore(&id, &f.user, None).unwrap();
    assert_eq!(f.status(&id), ChangeStatus::New);
}

#[test]
fn restore_succeeds_once_granted() {
    let f = make_fixture();
    let id = f.create_change();
    f.service.abandon(&id, &f.admin, None).unwrap();

    let err = f.service.restore(&id, &f.user, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);
    assert_eq!(f.status(&id), ChangeStatus::Abandoned);

    f.service
        .gate()
        .grant(Grant::new(
            f.project.as_str(),
            "refs/heads/master",
            Capability::Abandon,
            REGISTERED_USERS,
        ))
        .unwrap();

    f.service.restore(&id, &f.user, None).unwrap();
    assert_eq!(f.status(&id), ChangeStatus::New);
}

#[test]
fn abandon_draft_with_grant_is_a_conflict() {
    let f = make_fixture();
    let id = f.create_draft_change();
    f.service
        .gate()
        .grant(Grant::new(
            f.project.as_str(),
            "refs/heads/*",
            Capability::Abandon,
            REGISTERED_USERS,
        ))
        .unwrap();

    let err = f.service.abandon(&id, &f.user, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(err.to_string(), "draft changes cannot be abandoned");

    let err = f
        .service
        .batch_abandon(&f.project, &f.user, &[Fixture::change_id(&id)], None)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(err.to_string(), "draft changes cannot be abandoned");
    assert_eq!(f.status(&id), ChangeStatus::Draft);
}

#[test]
fn drafts_stay_hidden_without_permission() {
    let f = make_fixture();
    let id = f.create_draft_change();

    let err = f.service.abandon(&id, &f.user, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let listed = f.service.list(&f.user, Some(&f.project)).unwrap();
    assert!(listed.iter().all(|c| c.id.to_string() != id));
    let listed = f.service.list(&f.admin, Some(&f.project)).unwrap();
    assert!(listed.iter().any(|c| c.id.to_string() == id));
}

#[test]
fn restore() {
    let f = make_fixture();
    let id = f.create_change();
    assert_eq!(f.status(&id), ChangeStatus::New);
    f.service.abandon(&id, &f.admin, None).unwrap();
    assert_eq!(f.status(&id), ChangeStatus::Abandoned);

    let info = f.service.restore(&id, &f.admin, None).unwrap();
    assert_eq!(info.status(), ChangeStatus::New);
    assert!(f.last_message(&id).contains("restored"));

    let err = f.service.restore(&id, &f.admin, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert!(err.to_string().contains("change is new"));
}

#[test]
fn restore_not_allowed_without_permission() {
    let f = make_fixture();
    let id = f.create_change();
    f.service.abandon(&id, &f.admin, None).unwrap();
    assert_eq!(f.status(&id), ChangeStatus::Abandoned);

    let err = f.service.restore(&id, &f.user, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);
    assert!(err.to_string().contains("restore not permitted"));
    assert_eq!(f.status(&id), ChangeStatus::Abandoned);
}

#[test]
fn abandon_restore_round_trip_grows_log_by_two() {
    let f = make_fixture();
    let id = f.create_change();
    let before = f.get(&id);

    f.service.abandon(&id, &f.admin, Some("not needed")).unwrap();
    let after = f.service.restore(&id, &f.admin, Some("needed after all")).unwrap();

    assert_eq!(after.status(), before.status());
    assert_eq!(after.messages.len(), before.messages.len() + 2);
    assert_eq!(after.messages[..before.messages.len()], before.messages[..]);
    assert!(after
        .messages
        .windows(2)
        .all(|w| w[0].timestamp_ms <= w[1].timestamp_ms));
    assert_eq!(after.last_message().unwrap().text, "Restored\n\nneeded after all");
    assert_ne!(after.change.meta_id, before.change.meta_id);
}

#[test]
fn owner_may_abandon_own_change() {
    let f = make_fixture();
    let change = Change::new(
        f.project.clone(),
        BranchRef::new("master").unwrap(),
        "user",
        "user's change",
        now_ms(),
    );
    let id = f.store.insert_change(change).unwrap().change.id.to_string();

    let info = f.service.abandon(&id, &f.user, None).unwrap();
    assert_eq!(info.status(), ChangeStatus::Abandoned);
    assert_eq!(info.last_message().unwrap().author, "user");
}

#[test]
fn unknown_change_is_not_found() {
    let f = make_fixture();
    let err = f
        .service
        .abandon(&ChangeId::new().to_string(), &f.admin, None)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn concurrent_abandon_has_exactly_one_winner() {
    let f = make_fixture();
    let id = f.create_change();
    let messages_before = f.get(&id).messages.len();
    let service = Arc::new(f.service);
    let barrier = Arc::new(Barrier::new(2));

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let service = service.clone();
            let barrier = barrier.clone();
            let admin = f.admin.clone();
            let id = id.clone();
            thread::spawn(move || {
                barrier.wait();
                service.abandon(&id, &admin, None)
            })
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    let loser = results.into_iter().find_map(Result::err).unwrap();
    assert_eq!(loser.kind(), ErrorKind::Conflict);
    assert!(loser.to_string().contains("change is abandoned"));

    let info = service.get(&id, &f.admin).unwrap();
    assert_eq!(info.status(), ChangeStatus::Abandoned);
    assert_eq!(info.messages.len(), messages_before + 1);
}

#[test]
fn concurrent_abandon_of_different_changes_all_succeed() {
    let f = make_fixture();
    let ids: Vec<String> = (0..4).map(|_| f.create_change()).collect();
    let service = Arc::new(f.service);

    let handles: Vec<_> = ids
        .iter()
        .cloned()
        .map(|id| {
            let service = service.clone();
            let admin = f.admin.clone();
            thread::spawn(move || service.abandon(&id, &admin, None).map(|info| info.status()))
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap().unwrap(), ChangeStatus::Abandoned);
    }
}

#[test]
fn abandoned_state_survives_reopen() {
    let tmp = tempfile::tempdir().unwrap();
    let project = ProjectKey::new("project").unwrap();
    let admin = Principal::user("admin").with_group(ADMINISTRATORS);
    let id = {
        let store = Arc::new(ChangeStore::init(tmp.path()).unwrap());
        store.create_project(&project).unwrap();
        let change = Change::new(
            project.clone(),
            BranchRef::new("master").unwrap(),
            "admin",
            "persisted",
            now_ms(),
        );
        let id = store.insert_change(change).unwrap().change.id.to_string();
        let gate = Arc::new(PermissionGate::new(AccessPolicy::bootstrap()).unwrap());
        AbandonRestoreService::new(store, gate)
            .abandon(&id, &admin, Some("gone"))
            .unwrap();
        id
    };

    let store = ChangeStore::open(tmp.path()).unwrap();
    let info = store.get_change(&ChangeId::from_string(&id).unwrap()).unwrap().unwrap();
    assert_eq!(info.status(), ChangeStatus::Abandoned);
    assert_eq!(info.last_message().unwrap().text, "Abandoned\n\ngone");
}
