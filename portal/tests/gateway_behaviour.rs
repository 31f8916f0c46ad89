//! Behavioural tests for the HTTP gateway and submission sequence against a
//! stub backend.

use std::sync::Arc;
use std::time::Duration;

use loan_portal::domain::ports::{
    ApplicationsApi, DraftStore, InMemoryDraftStore, InMemorySessionStore, SessionStore,
};
use loan_portal::domain::{
    ApplicationId, ApplicationStatus, ApplicationType, DocumentType, DocumentUpload, SmeData,
    Wizard, WizardCoordinator,
};
use loan_portal::outbound::http::{GatewayClient, HttpApplicationsApi};
use mockable::DefaultClock;
use rstest::{fixture, rstest};
use serde_json::json;
use url::Url;

mod support;

use support::{RefreshMode, StubBackend, session, spawn_backend, valid_sme};

#[fixture]
fn sessions() -> Arc<InMemorySessionStore> {
    Arc::new(InMemorySessionStore::with_session(session()))
}

async fn applications_api(
    stub: &Arc<StubBackend>,
    sessions: Arc<InMemorySessionStore>,
) -> (HttpApplicationsApi, actix_web::dev::ServerHandle) {
    let (base, server) = spawn_backend(stub.clone())
        .await
        .expect("stub backend should start");
    let gateway = GatewayClient::new(
        Url::parse(&base).expect("stub url parses"),
        Duration::from_secs(5),
        sessions,
    )
    .expect("client builds");
    (HttpApplicationsApi::new(Arc::new(gateway)), server)
}

#[rstest]
#[actix_rt::test]
async fn rejected_access_token_is_refreshed_once_and_retried(
    sessions: Arc<InMemorySessionStore>,
) {
    let stub = StubBackend::with_stale_token(RefreshMode::Grant);
    let (api, server) = applications_api(&stub, sessions.clone()).await;
    let id = ApplicationId::random();

    let application = api.get(id).await.expect("retry succeeds");

    assert_eq!(application.id, id);
    let get = format!("GET /api/applications/{id}");
    assert_eq!(
        stub.calls(),
        vec![
            get.clone(),
            "POST /api/auth/refresh-token".to_owned(),
            get
        ]
    );
    assert_eq!(
        stub.refresh_bodies(),
        vec![json!({ "refreshToken": "refresh-1" })]
    );
    let stored = sessions.load().expect("session kept");
    assert_eq!(stored.access_token.expose(), "fresh");
    assert_eq!(stored.refresh_token.expose(), "refresh-2");
    server.stop(true).await;
}

#[rstest]
#[actix_rt::test]
async fn concurrent_rejections_share_one_refresh(sessions: Arc<InMemorySessionStore>) {
    let stub = StubBackend::with_stale_token(RefreshMode::Grant);
    let (api, server) = applications_api(&stub, sessions.clone()).await;
    let ids = [
        ApplicationId::random(),
        ApplicationId::random(),
        ApplicationId::random(),
    ];

    let [a, b, c] = ids;

    let (first, second, third) = tokio::join!(api.get(a), api.get(b), api.get(c));

    for (result, id) in [first, second, third].into_iter().zip(ids) {
        assert_eq!(result.expect("retry succeeds").id, id);
        assert_eq!(stub.count(&format!("GET /api/applications/{id}")), 2);
    }
    assert_eq!(stub.count("POST /api/auth/refresh-token"), 1);
    let stored = sessions.load().expect("session kept");
    assert_eq!(stored.access_token.expose(), "fresh");
    server.stop(true).await;
}

#[rstest]
#[actix_rt::test]
async fn second_rejection_ends_the_session_without_another_refresh(
    sessions: Arc<InMemorySessionStore>,
) {
    let stub = StubBackend::with_stale_token(RefreshMode::GrantUseless);
    let (api, server) = applications_api(&stub, sessions.clone()).await;
    let id = ApplicationId::random();

    let err = api.get(id).await.expect_err("retry is rejected");

    assert!(err.is_session_expired());
    assert_eq!(stub.count("POST /api/auth/refresh-token"), 1);
    assert_eq!(stub.count(&format!("GET /api/applications/{id}")), 2);
    assert!(sessions.load().is_none());
    server.stop(true).await;
}

#[rstest]
#[actix_rt::test]
async fn failed_refresh_ends_the_session(sessions: Arc<InMemorySessionStore>) {
    let stub = StubBackend::with_stale_token(RefreshMode::Reject);
    let (api, server) = applications_api(&stub, sessions.clone()).await;
    let id = ApplicationId::random();

    let err = api.get(id).await.expect_err("refresh is rejected");

    assert!(err.is_session_expired());
    assert_eq!(stub.count(&format!("GET /api/applications/{id}")), 1);
    assert!(sessions.load().is_none());
    server.stop(true).await;
}

fn upload(name: &str) -> DocumentUpload {
    DocumentUpload::new(name, name.as_bytes().to_vec())
}

#[rstest]
#[actix_rt::test]
async fn sme_wizard_creates_uploads_and_submits(sessions: Arc<InMemorySessionStore>) {
    let stub = StubBackend::new(RefreshMode::Grant);
    let (api, server) = applications_api(&stub, sessions).await;
    let drafts = Arc::new(InMemoryDraftStore::new());
    let coordinator = WizardCoordinator::new(Arc::new(api), drafts.clone());

    let mut wizard = Wizard::<SmeData>::new(Arc::new(DefaultClock));
    *wizard.form_mut() = valid_sme();
    for (kind, name) in [
        (DocumentType::NationalIdFront, "id-front.jpg"),
        (DocumentType::NationalIdBack, "id-back.jpg"),
        (DocumentType::BusinessRegistration, "registration.pdf"),
    ] {
        wizard.attach(kind, upload(name)).expect("accepted document");
    }

    let receipt = coordinator
        .submit(&mut wizard)
        .await
        .expect("submission succeeds");

    let id = stub.draft_id();
    assert_eq!(receipt.application.id, id);
    assert_eq!(receipt.application.status, ApplicationStatus::Submitted);
    assert_eq!(receipt.uploaded.len(), 3);
    assert!(receipt.optional_failures.is_empty());

    let calls = stub.calls();
    assert_eq!(calls.first().map(String::as_str), Some("POST /api/applications/sme"));
    assert_eq!(
        calls.last().cloned(),
        Some(format!("POST /api/applications/{id}/submit"))
    );
    assert_eq!(
        stub.count(&format!("POST /api/applications/{id}/documents/upload")),
        3
    );
    let mut uploads = stub.uploads();
    uploads.sort();
    assert_eq!(
        uploads,
        vec![
            "BUSINESS_REGISTRATION",
            "NATIONAL_ID_BACK",
            "NATIONAL_ID_FRONT"
        ]
    );
    assert_eq!(drafts.load(ApplicationType::Sme).expect("drafts readable"), None);
    server.stop(true).await;
}
