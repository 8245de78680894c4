//! Tests for the profile mutation service.

use std::sync::Arc;

use chrono::NaiveDate;
use mockall::Sequence;

use super::*;
use crate::domain::ErrorCode;
use crate::domain::ports::MockProfileRepository;
use crate::domain::{Experience, Version};

fn fields(status: &str) -> ProfileFields {
    ProfileFields {
        status: Some(status.to_owned()),
        skills: Some(vec!["rust".to_owned()]),
        social: None,
    }
}

fn draft(title: &str) -> ExperienceDraft {
    ExperienceDraft {
        title: title.to_owned(),
        company: "Acme".to_owned(),
        from_date: NaiveDate::from_ymd_opt(2021, 3, 1).expect("valid date"),
        to_date: None,
        location: Some("Remote".to_owned()),
        description: None,
    }
}

fn make_service(repo: MockProfileRepository, retry: RetryPolicy) -> ProfileService<MockProfileRepository> {
    ProfileService::new(Arc::new(repo), retry)
}

#[tokio::test]
async fn upsert_creates_profile_when_missing() {
    let caller = UserId::random();

    let mut repo = MockProfileRepository::new();
    repo.expect_find_by_user_id()
        .times(1)
        .return_once(|_| Ok(None));
    repo.expect_create()
        .withf(move |profile| profile.user_id() == caller && profile.status() == "Developer")
        .times(1)
        .returning(|_| Ok(Version::initial()));

    let service = make_service(repo, RetryPolicy::default());
    let profile = service
        .upsert_profile(caller, fields("Developer"))
        .await
        .expect("create succeeds");

    assert!(profile.experience().is_empty());
    assert_eq!(profile.skills(), ["rust".to_owned()]);
}

#[tokio::test]
async fn upsert_applies_partial_update_and_keeps_experience() {
    let caller = UserId::random();
    let existing = Profile::new(caller, fields("Developer")).with_experience_added(draft("Eng"));
    let kept = existing.experience().to_vec();

    let mut repo = MockProfileRepository::new();
    repo.expect_find_by_user_id()
        .times(1)
        .return_once(move |_| Ok(Some((existing, Version::initial()))));
    repo.expect_create().times(0);
    repo.expect_replace()
        .withf(move |next, _| {
            next.status() == "Architect"
                && next.skills() == ["rust".to_owned()]
                && next.experience() == kept.as_slice()
        })
        .times(1)
        .returning(|_, expected| Ok(expected.next()));

    let service = make_service(repo, RetryPolicy::default());
    let updated = service
        .upsert_profile(
            caller,
            ProfileFields {
                status: Some("Architect".to_owned()),
                skills: None,
                social: None,
            },
        )
        .await
        .expect("update succeeds");

    assert_eq!(updated.status(), "Architect");
    assert_eq!(updated.experience().len(), 1);
}

#[tokio::test]
async fn upsert_falls_back_to_update_when_create_races() {
    let caller = UserId::random();
    let concurrent = Profile::new(caller, fields("Sniped"));

    let mut repo = MockProfileRepository::new();
    let mut seq = Sequence::new();
    repo.expect_find_by_user_id()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(None));
    repo.expect_create()
        .times(1)
        .in_sequence(&mut seq)
        .returning(move |profile| {
            Err(ProfileRepositoryError::DuplicateProfile {
                user_id: profile.user_id(),
            })
        });
    repo.expect_find_by_user_id()
        .times(1)
        .in_sequence(&mut seq)
        .returning(move |_| Ok(Some((concurrent.clone(), Version::initial()))));
    repo.expect_replace()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, expected| Ok(expected.next()));

    let service = make_service(repo, RetryPolicy::default());
    let profile = service
        .upsert_profile(caller, fields("Developer"))
        .await
        .expect("second attempt updates");

    assert_eq!(profile.status(), "Developer");
}

#[tokio::test]
async fn upsert_surfaces_contention_after_repeated_conflicts() {
    let caller = UserId::random();
    let existing = Profile::new(caller, fields("Developer"));

    let mut repo = MockProfileRepository::new();
    repo.expect_find_by_user_id()
        .times(2)
        .returning(move |_| Ok(Some((existing.clone(), Version::initial()))));
    repo.expect_replace()
        .times(2)
        .returning(|_, _| Err(ProfileRepositoryError::VersionConflict));

    let service = make_service(repo, RetryPolicy::new(2));
    let error = service
        .upsert_profile(caller, fields("Developer"))
        .await
        .expect_err("budget exhausted");

    assert_eq!(error.code(), ErrorCode::Contention);
}

#[tokio::test]
async fn upsert_surfaces_service_unavailable_when_the_store_stays_down() {
    let caller = UserId::random();
    let existing = Profile::new(caller, fields("Developer"));

    let mut repo = MockProfileRepository::new();
    repo.expect_find_by_user_id()
        .times(2)
        .returning(move |_| Ok(Some((existing.clone(), Version::initial()))));
    repo.expect_replace()
        .times(2)
        .returning(|_, _| Err(ProfileRepositoryError::connection("pool unavailable")));

    let service = make_service(repo, RetryPolicy::new(2));
    let error = service
        .upsert_profile(caller, fields("Developer"))
        .await
        .expect_err("store unreachable");

    assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
}

#[tokio::test]
async fn add_experience_prepends_to_existing_profile() {
    let caller = UserId::random();
    let existing = Profile::new(caller, fields("Developer")).with_experience_added(draft("Eng"));

    let mut repo = MockProfileRepository::new();
    repo.expect_find_by_user_id()
        .times(1)
        .return_once(move |_| Ok(Some((existing, Version::initial()))));
    repo.expect_replace()
        .withf(|next, _| {
            let titles: Vec<_> = next.experience().iter().map(Experience::title).collect();
            titles == ["Lead", "Eng"]
        })
        .times(1)
        .returning(|_, expected| Ok(expected.next()));

    let service = make_service(repo, RetryPolicy::default());
    let profile = service
        .add_experience(caller, draft("Lead"))
        .await
        .expect("add succeeds");

    assert_eq!(profile.experience().len(), 2);
}

#[tokio::test]
async fn add_experience_without_profile_is_not_found() {
    let mut repo = MockProfileRepository::new();
    repo.expect_find_by_user_id()
        .times(1)
        .return_once(|_| Ok(None));
    repo.expect_replace().times(0);

    let service = make_service(repo, RetryPolicy::default());
    let error = service
        .add_experience(UserId::random(), draft("Eng"))
        .await
        .expect_err("no profile yet");

    assert_eq!(error.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn add_experience_rejects_blank_title() {
    let repo = MockProfileRepository::new();
    let service = make_service(repo, RetryPolicy::default());

    let error = service
        .add_experience(UserId::random(), draft("  "))
        .await
        .expect_err("blank title");

    assert_eq!(error.code(), ErrorCode::InvalidRequest);
}

#[tokio::test]
async fn remove_experience_deletes_exactly_the_requested_entry() {
    let caller = UserId::random();
    let existing = Profile::new(caller, fields("Developer"))
        .with_experience_added(draft("Eng"))
        .with_experience_added(draft("Lead"));
    let target = existing.experience()[1].id();

    let mut repo = MockProfileRepository::new();
    repo.expect_find_by_user_id()
        .times(1)
        .return_once(move |_| Ok(Some((existing, Version::initial()))));
    repo.expect_replace()
        .withf(move |next, _| {
            next.experience().len() == 1 && next.experience()[0].id() != target
        })
        .times(1)
        .returning(|_, expected| Ok(expected.next()));

    let service = make_service(repo, RetryPolicy::default());
    let profile = service
        .remove_experience(caller, target)
        .await
        .expect("remove succeeds");

    assert_eq!(profile.experience().len(), 1);
    assert_eq!(profile.experience()[0].title(), "Lead");
}

#[tokio::test]
async fn remove_experience_rejects_absent_ids_without_a_write() {
    let caller = UserId::random();
    let existing = Profile::new(caller, fields("Developer")).with_experience_added(draft("Eng"));

    let mut repo = MockProfileRepository::new();
    repo.expect_find_by_user_id()
        .times(1)
        .return_once(move |_| Ok(Some((existing, Version::initial()))));
    repo.expect_replace().times(0);

    let service = make_service(repo, RetryPolicy::default());
    let error = service
        .remove_experience(caller, ExperienceId::random())
        .await
        .expect_err("absent id rejected");

    assert_eq!(error.code(), ErrorCode::NotFound);
}
