//! Focus Queue against SQLite
//!
//! Load order, chunking, navigation, logging and resume across a real store.

mod common;

use cadence_core::application::focus::{
    load_queue, Advance, AssociatedRecordFetcher, FocusView, LoggerState, TaskQueueSource,
};
use cadence_core::domain::{
    InteractionKind, LogDraft, QueueKind, QuickLogType, TaskNature,
};
use cadence_core::port::{FocusLocation, InteractionRepository, NoticeLevel};
use common::{Env, NOW};
use std::sync::Arc;

/// 45 tasks over 3 leads, returned in the order the queue should show them
async fn seed_tasks(env: &Env) -> Vec<String> {
    let leads = [
        env.lead("a", 1).await,
        env.lead("b", 1).await,
        env.lead("c", 1).await,
    ];
    let mut ids = Vec::new();
    for i in 0..45 {
        let id = format!("t-{:02}", i);
        env.task(&id, &leads[i % 3], "Day 1 Follow-up", TaskNature::Interactive, Some(NOW))
            .await;
        ids.push(id);
    }
    // Queue order differs from insertion order
    ids.reverse();
    ids
}

#[tokio::test]
async fn test_queue_of_45_loads_in_requested_order() {
    let env = Env::new().await;
    let mut ids = seed_tasks(&env).await;
    ids.insert(10, "ghost".to_string());

    let source = TaskQueueSource::new(env.tasks.clone());
    let items = load_queue(&source, &ids).await.unwrap();

    let loaded: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
    let expected: Vec<&str> = ids.iter().map(String::as_str).filter(|id| *id != "ghost").collect();
    assert_eq!(loaded, expected);
    assert!(items.iter().all(|i| i.kind == QueueKind::Tasks));

    println!("✅ 46 ids (one unknown) loaded as 45 items in request order");
}

#[tokio::test]
async fn test_session_logs_and_advances() {
    let env = Env::new().await;
    let ids = seed_tasks(&env).await;
    let mut session = env.session();

    let loaded = session
        .open(FocusLocation::new(QueueKind::Tasks, ids.clone()))
        .await;
    assert_eq!(loaded, 45);
    assert_eq!(session.current_item().unwrap().id, ids[0]);
    assert!(matches!(session.view(), FocusView::Ready { .. }));

    let outcome = session
        .submit(&LogDraft::quick(QuickLogType::Followup).with_notes("Spoke briefly"))
        .await
        .unwrap();

    assert_eq!(outcome.advance, Advance::Moved(1));
    assert_eq!(session.current_item().unwrap().id, ids[1]);
    assert_eq!(session.logger_state(), LoggerState::Idle);
    assert_eq!(session.progress().completed, 1);

    // Persisted with task and lead links
    let lead_id = outcome.record.lead_id.clone();
    let stored = env.interactions.find_for_lead(&lead_id).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].task_id.as_deref(), Some(ids[0].as_str()));
    assert_eq!(stored[0].notes.as_deref(), Some("Spoke briefly"));
    assert!(matches!(
        stored[0].kind,
        InteractionKind::QuickLog {
            log_type: QuickLogType::Followup,
            ..
        }
    ));

    // Location bar tracks the current item for resume
    let location = env.location_bar.last().unwrap();
    assert_eq!(location.current.as_deref(), Some(ids[1].as_str()));
    assert_eq!(env.notifier.count(NoticeLevel::Success), 1);

    println!("✅ Log persisted, item completed, session advanced");
}

#[tokio::test]
async fn test_resume_from_location_string() {
    let env = Env::new().await;
    let ids = seed_tasks(&env).await;
    let query = FocusLocation::new(QueueKind::Tasks, ids.clone())
        .with_current(ids[20].clone())
        .to_query();

    let mut session = env.session();
    session.open(FocusLocation::parse(&query)).await;

    assert_eq!(session.progress().position, Some(20));
    assert_eq!(session.location().to_query(), query);
}

#[tokio::test]
async fn test_validation_failure_writes_nothing() {
    let env = Env::new().await;
    let ids = seed_tasks(&env).await;
    let mut session = env.session();
    session.open(FocusLocation::new(QueueKind::Tasks, ids)).await;

    let err = session
        .submit(&LogDraft::withdrawal(Vec::<String>::new()))
        .await
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(env.pending_interactions().await, 0);
    assert_eq!(session.progress().completed, 0);
    assert_eq!(env.notifier.count(NoticeLevel::Error), 1);
}

#[tokio::test]
async fn test_lead_queue_walks_leads() {
    let env = Env::new().await;
    env.lead("a", 1).await;
    env.lead("b", 1).await;

    let mut session = env.session();
    session
        .open(FocusLocation::new(
            QueueKind::Leads,
            vec!["b".to_string(), "a".to_string()],
        ))
        .await;
    assert_eq!(session.current_item().unwrap().id, "b");

    session
        .submit(&LogDraft::quick(QuickLogType::Unresponsive))
        .await
        .unwrap();
    let outcome = session
        .submit(&LogDraft::quick(QuickLogType::Unresponsive))
        .await
        .unwrap();

    assert_eq!(outcome.advance, Advance::Finished);
    assert!(session.is_finished());
    assert!(matches!(session.view(), FocusView::Finished));
    assert_eq!(env.pending_interactions().await, 2);
}

#[tokio::test]
async fn test_concurrent_fetches_agree() {
    let env = Env::new().await;
    env.lead("a", 1).await;
    let fetcher = Arc::new(AssociatedRecordFetcher::new(
        env.leads.clone(),
        env.notifier.clone(),
    ));

    let lookups = (0..8).map(|_| {
        let fetcher = Arc::clone(&fetcher);
        async move { fetcher.ensure(&"a".to_string()).await }
    });
    let results = futures::future::join_all(lookups).await;

    assert!(results.iter().all(|r| r.as_ref().map(|l| l.id.as_str()) == Some("a")));
    assert!(fetcher.cached("a").is_some());
    assert!(!fetcher.is_loading("a"));
}
