mod common;

use common::{fixture, new_analysis, new_meeting};
use minutify_store::{
    auth::Session,
    models::meeting::MeetingPatch,
    services::{
        meetings::{CascadeOutcome, MeetingError, MeetingService, cascade_delete_meeting},
        records::RecordStore,
    },
};
use std::sync::atomic::Ordering;
use uuid::Uuid;

#[tokio::test]
async fn meeting_without_analyses_issues_no_analysis_deletes() {
    let fx = fixture().await;
    let service = MeetingService::new(fx.records.clone());
    let owner = Session::new("u1");
    let meeting = service.create_meeting(&owner, new_meeting("solo")).await.unwrap();

    let outcome = service.delete_meeting(&owner, meeting.id).await.unwrap();

    assert_eq!(
        outcome,
        CascadeOutcome {
            meeting_removed: true,
            analyses_deleted: 0,
        }
    );
    assert_eq!(fx.records.analysis_deletes.load(Ordering::SeqCst), 0);
    assert!(fx.records.get_meeting(meeting.id).await.unwrap().is_none());
}

#[tokio::test]
async fn meeting_delete_removes_every_referencing_analysis() {
    let fx = fixture().await;
    let service = MeetingService::new(fx.records.clone());
    let owner = Session::new("u1");
    let doomed = service.create_meeting(&owner, new_meeting("doomed")).await.unwrap();
    let kept = service.create_meeting(&owner, new_meeting("kept")).await.unwrap();
    for i in 0..3 {
        service
            .create_analysis(&owner, doomed.id, new_analysis(&format!("take {i}")))
            .await
            .unwrap();
    }
    service
        .create_analysis(&owner, kept.id, new_analysis("keep me"))
        .await
        .unwrap();

    let outcome = service.delete_meeting(&owner, doomed.id).await.unwrap();

    assert_eq!(outcome.analyses_deleted, 3);
    assert!(
        fx.records
            .list_analyses_by_meeting(doomed.id)
            .await
            .unwrap()
            .is_empty()
    );
    assert_eq!(
        fx.records.list_analyses_by_meeting(kept.id).await.unwrap().len(),
        1
    );
}

#[tokio::test]
async fn failed_analysis_query_keeps_meeting_deleted_and_retry_finishes() {
    let fx = fixture().await;
    let service = MeetingService::new(fx.records.clone());
    let owner = Session::new("u1");
    let meeting = service.create_meeting(&owner, new_meeting("flaky")).await.unwrap();
    for i in 0..2 {
        service
            .create_analysis(&owner, meeting.id, new_analysis(&format!("v{i}")))
            .await
            .unwrap();
    }

    fx.records
        .fail_list_analyses_by_meeting
        .store(true, Ordering::SeqCst);
    let err = service.delete_meeting(&owner, meeting.id).await.unwrap_err();
    assert!(matches!(err, MeetingError::Store(_)));

    // No rollback: the meeting row is gone, the analyses are not.
    assert!(fx.records.inner.get_meeting(meeting.id).await.unwrap().is_none());
    assert_eq!(
        fx.records
            .inner
            .list_analyses_by_meeting(meeting.id)
            .await
            .unwrap()
            .len(),
        2
    );

    fx.records
        .fail_list_analyses_by_meeting
        .store(false, Ordering::SeqCst);
    let retry = service.delete_meeting(&owner, meeting.id).await.unwrap();
    assert_eq!(
        retry,
        CascadeOutcome {
            meeting_removed: false,
            analyses_deleted: 2,
        }
    );
    assert!(
        fx.records
            .list_analyses_by_user("u1")
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn cascade_of_absent_meeting_is_a_no_op() {
    let fx = fixture().await;
    let outcome = cascade_delete_meeting(fx.records.as_ref(), Uuid::new_v4())
        .await
        .unwrap();
    assert_eq!(outcome, CascadeOutcome::default());
}

#[tokio::test]
async fn other_users_cannot_see_change_or_delete_a_meeting() {
    let fx = fixture().await;
    let service = MeetingService::new(fx.records.clone());
    let owner = Session::new("owner");
    let intruder = Session::new("intruder");
    let meeting = service.create_meeting(&owner, new_meeting("private")).await.unwrap();

    assert!(matches!(
        service.get_meeting(&intruder, meeting.id).await,
        Err(MeetingError::NotFound(_))
    ));
    let patch = MeetingPatch {
        title: Some("pwned".into()),
        ..Default::default()
    };
    assert!(matches!(
        service.update_meeting(&intruder, meeting.id, patch).await,
        Err(MeetingError::NotFound(_))
    ));
    assert!(matches!(
        service.delete_meeting(&intruder, meeting.id).await,
        Err(MeetingError::NotFound(_))
    ));
    assert!(service.list_meetings(&intruder).await.unwrap().is_empty());

    let still_there = service.get_meeting(&owner, meeting.id).await.unwrap();
    assert_eq!(still_there.title, "private");
}

#[tokio::test]
async fn recording_an_analysis_marks_the_meeting_analyzed() {
    let fx = fixture().await;
    let service = MeetingService::new(fx.records.clone());
    let owner = Session::new("u1");
    let meeting = service.create_meeting(&owner, new_meeting("weekly")).await.unwrap();
    assert!(!meeting.analyzed);
    assert!(
        service
            .get_analysis_for_meeting(&owner, meeting.id)
            .await
            .unwrap()
            .is_none()
    );

    let analysis = service
        .create_analysis(&owner, meeting.id, new_analysis("done"))
        .await
        .unwrap();

    let reloaded = service.get_meeting(&owner, meeting.id).await.unwrap();
    assert!(reloaded.analyzed);
    let fetched = service
        .get_analysis_for_meeting(&owner, meeting.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fetched.id, analysis.id);
    assert_eq!(fetched.action_items, analysis.action_items);

    assert!(service.delete_analysis(&owner, analysis.id).await.unwrap());
    assert!(!service.delete_analysis(&owner, analysis.id).await.unwrap());
}
