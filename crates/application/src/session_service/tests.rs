use std::sync::Arc;
use std::time::Duration;

use portalgate_core::AppError;
use tokio::sync::Notify;

use crate::test_support::{
    FakeAuthGateway, FakeCredentialStore, admin_session, employee_session, token,
};
use crate::{LoginGrant, SessionNotice, SessionService, SessionSnapshot};

fn service(gateway: Arc<FakeAuthGateway>, store: Arc<FakeCredentialStore>) -> SessionService {
    SessionService::new(gateway, store)
}

#[tokio::test(start_paused = true)]
async fn session_is_reused_within_freshness_window() {
    let gateway = FakeAuthGateway::signed_in_as(employee_session()).await;
    let service = service(gateway.clone(), Arc::new(FakeCredentialStore::default()));

    assert!(service.session().await.is_some());
    tokio::time::advance(Duration::from_secs(299)).await;
    assert!(service.session().await.is_some());

    assert_eq!(gateway.fetch_count().await, 1);
}

#[tokio::test(start_paused = true)]
async fn session_is_refetched_after_freshness_window() {
    let gateway = FakeAuthGateway::signed_in_as(employee_session()).await;
    let service = service(gateway.clone(), Arc::new(FakeCredentialStore::default()));

    assert!(service.session().await.is_some());
    tokio::time::advance(Duration::from_secs(301)).await;
    assert!(service.session().await.is_some());

    assert_eq!(gateway.fetch_count().await, 2);
}

#[tokio::test(start_paused = true)]
async fn custom_freshness_window_is_honoured() {
    let gateway = FakeAuthGateway::signed_in_as(employee_session()).await;
    let service = service(gateway.clone(), Arc::new(FakeCredentialStore::default()))
        .with_freshness(Duration::from_secs(10));

    let _ = service.session().await;
    tokio::time::advance(Duration::from_secs(11)).await;
    let _ = service.session().await;

    assert_eq!(gateway.fetch_count().await, 2);
}

#[tokio::test]
async fn refresh_bypasses_cache() {
    let gateway = FakeAuthGateway::signed_in_as(employee_session()).await;
    let service = service(gateway.clone(), Arc::new(FakeCredentialStore::default()));

    let _ = service.session().await;
    let _ = service.refresh().await;

    assert_eq!(gateway.fetch_count().await, 2);
}

#[tokio::test]
async fn stored_token_is_attached_to_session_fetch() {
    let gateway = FakeAuthGateway::signed_in_as(employee_session()).await;
    let store = FakeCredentialStore::holding(token("tok-1")).await;
    let service = service(gateway.clone(), store);

    let _ = service.session().await;

    let seen = gateway.seen_tokens.lock().await;
    assert_eq!(seen.as_slice(), &[Some("tok-1".to_owned())]);
}

#[tokio::test]
async fn anonymous_response_is_cached() {
    let gateway = Arc::new(FakeAuthGateway::default());
    let service = service(gateway.clone(), Arc::new(FakeCredentialStore::default()));

    assert!(service.session().await.is_none());
    assert!(service.session().await.is_none());

    assert_eq!(gateway.fetch_count().await, 1);
    assert_eq!(service.snapshot(), SessionSnapshot::Anonymous);
}

#[tokio::test]
async fn network_failure_degrades_to_anonymous_without_caching() {
    let gateway = FakeAuthGateway::signed_in_as(employee_session()).await;
    *gateway.network_down.lock().await = true;
    let service = service(gateway.clone(), Arc::new(FakeCredentialStore::default()));

    assert!(service.session().await.is_none());
    assert_eq!(service.snapshot(), SessionSnapshot::Anonymous);

    *gateway.network_down.lock().await = false;
    assert!(service.session().await.is_some());
    assert_eq!(gateway.fetch_count().await, 2);
}

#[tokio::test]
async fn snapshot_starts_loading_and_tracks_fetches() {
    let gateway = FakeAuthGateway::signed_in_as(admin_session()).await;
    let service = service(gateway, Arc::new(FakeCredentialStore::default()));
    let mut updates = service.subscribe();

    assert!(service.snapshot().is_loading());
    let _ = service.session().await;

    assert!(updates.has_changed().unwrap_or(false));
    let snapshot = updates.borrow_and_update().clone();
    assert_eq!(
        snapshot.session().map(|session| session.user().display_name().to_owned()),
        Some("Ada Admin".to_owned())
    );
}

#[tokio::test]
async fn login_stores_token_and_replaces_cache() {
    let gateway = Arc::new(FakeAuthGateway::default());
    *gateway.login_result.lock().await = Some(Ok(LoginGrant {
        session: employee_session(),
        token: Some(token("fresh-token")),
    }));
    let store = Arc::new(FakeCredentialStore::default());
    let service = service(gateway.clone(), store.clone());
    let mut notices = service.notices();

    assert!(service.session().await.is_none());
    let result = service.login("erin", "secret").await;
    assert!(result.is_ok());

    let cached = service.session().await;
    assert_eq!(
        cached.map(|session| session.user().id().to_string()),
        Some("u-employee".to_owned())
    );
    assert_eq!(gateway.fetch_count().await, 1);
    assert_eq!(
        store.token.lock().await.as_ref().map(|value| value.expose().to_owned()),
        Some("fresh-token".to_owned())
    );
    assert_eq!(
        notices.try_recv().ok(),
        Some(SessionNotice::LoggedIn {
            display_name: "Erin Employee".to_owned()
        })
    );
}

#[tokio::test]
async fn rejected_login_keeps_cache_and_reports_message_verbatim() {
    let gateway = FakeAuthGateway::signed_in_as(employee_session()).await;
    *gateway.login_result.lock().await = Some(Err("Account locked. Contact support.".to_owned()));
    let service = service(gateway.clone(), Arc::new(FakeCredentialStore::default()));
    let mut notices = service.notices();

    assert!(service.session().await.is_some());
    let result = service.login("erin", "wrong").await;

    assert!(matches!(
        result,
        Err(AppError::Rejected(ref message)) if message == "Account locked. Contact support."
    ));
    assert!(service.session().await.is_some());
    assert_eq!(gateway.fetch_count().await, 1);
    assert_eq!(
        notices.try_recv().ok(),
        Some(SessionNotice::LoginFailed(
            "Account locked. Contact support.".to_owned()
        ))
    );
}

#[tokio::test]
async fn login_validates_input_before_calling_backend() {
    let gateway = Arc::new(FakeAuthGateway::default());
    let service = service(gateway, Arc::new(FakeCredentialStore::default()));

    let result = service.login("", "secret").await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn logout_clears_credential_and_cache() {
    let gateway = FakeAuthGateway::signed_in_as(employee_session()).await;
    let store = FakeCredentialStore::holding(token("tok-1")).await;
    let service = service(gateway.clone(), store.clone());

    assert!(service.session().await.is_some());
    let result = service.logout().await;

    assert!(result.is_ok());
    assert!(store.token.lock().await.is_none());
    assert_eq!(service.snapshot(), SessionSnapshot::Anonymous);
    assert!(service.session().await.is_none());
    assert_eq!(*gateway.logout_calls.lock().await, 1);
    let seen = gateway.seen_tokens.lock().await;
    assert_eq!(seen.last(), Some(&Some("tok-1".to_owned())));
}

#[tokio::test]
async fn failed_logout_still_signs_client_out() {
    let gateway = FakeAuthGateway::signed_in_as(employee_session()).await;
    *gateway.logout_fails.lock().await = true;
    let store = FakeCredentialStore::holding(token("tok-1")).await;
    let service = service(gateway.clone(), store.clone());
    let mut notices = service.notices();

    assert!(service.session().await.is_some());
    let result = service.logout().await;

    assert!(result.is_err());
    assert!(store.token.lock().await.is_none());
    assert!(service.session().await.is_none());
    assert_eq!(
        notices.try_recv().ok(),
        Some(SessionNotice::LogoutFailed("Logout failed".to_owned()))
    );
}

#[tokio::test]
async fn fetch_in_flight_during_logout_does_not_restore_session() {
    let gateway = FakeAuthGateway::signed_in_as(employee_session()).await;
    let release = Arc::new(Notify::new());
    *gateway.hold_fetch.lock().await = Some(release.clone());
    let service = Arc::new(service(
        gateway.clone(),
        Arc::new(FakeCredentialStore::default()),
    ));

    let in_flight = tokio::spawn({
        let service = service.clone();
        async move { service.session().await }
    });
    gateway.fetch_started.notified().await;

    *gateway.logout_fails.lock().await = true;
    let _ = service.logout().await;
    release.notify_one();

    let Ok(stale) = in_flight.await else {
        panic!("in-flight fetch task failed");
    };
    assert!(stale.is_none());
    assert_eq!(service.snapshot(), SessionSnapshot::Anonymous);
}

#[tokio::test]
async fn logout_during_sign_in_wins() {
    let gateway = Arc::new(FakeAuthGateway::default());
    *gateway.login_result.lock().await = Some(Ok(LoginGrant {
        session: employee_session(),
        token: Some(token("late-token")),
    }));
    let store = Arc::new(FakeCredentialStore::default());
    let release = Arc::new(Notify::new());
    *store.hold_store.lock().await = Some(release.clone());
    let service = Arc::new(service(gateway.clone(), store.clone()));
    let mut notices = service.notices();

    let sign_in = tokio::spawn({
        let service = service.clone();
        async move { service.login("erin", "secret").await }
    });
    store.store_started.notified().await;

    assert!(service.logout().await.is_ok());
    assert_eq!(service.snapshot(), SessionSnapshot::Anonymous);
    release.notify_one();

    let Ok(result) = sign_in.await else {
        panic!("sign-in task failed");
    };
    assert!(matches!(result, Err(AppError::Unauthenticated(_))));
    assert_eq!(service.snapshot(), SessionSnapshot::Anonymous);
    assert!(store.token.lock().await.is_none());
    assert!(service.session().await.is_none());

    assert_eq!(notices.try_recv().ok(), Some(SessionNotice::LoggedOut));
    assert!(matches!(
        notices.try_recv().ok(),
        Some(SessionNotice::LoginFailed(_))
    ));
}

#[tokio::test]
async fn credential_store_failure_is_a_login_failure() {
    let gateway = Arc::new(FakeAuthGateway::default());
    *gateway.login_result.lock().await = Some(Ok(LoginGrant {
        session: employee_session(),
        token: Some(token("fresh-token")),
    }));
    let store = Arc::new(FakeCredentialStore::default());
    *store.fail_store.lock().await = true;
    let service = service(gateway, store.clone());
    let mut notices = service.notices();

    assert!(service.session().await.is_none());
    let result = service.login("erin", "secret").await;

    assert!(matches!(result, Err(AppError::Internal(_))));
    assert_eq!(service.snapshot(), SessionSnapshot::Anonymous);
    assert!(store.token.lock().await.is_none());
    assert_eq!(
        notices.try_recv().ok(),
        Some(SessionNotice::LoginFailed(
            "internal error: credential store is read-only".to_owned()
        ))
    );
}
