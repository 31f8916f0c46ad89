//! Stub loan backend served by Actix for gateway behaviour tests.
//!
//! The stub speaks just enough of the API to exercise token refresh and the
//! wizard submission sequence, and records every call it receives.

use std::net::TcpListener;
use std::sync::{Arc, Mutex, PoisonError};

use actix_web::dev::ServerHandle;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{App, HttpRequest, HttpResponse, HttpServer, web};
use loan_portal::domain::{
    ApplicationId, CreditHistory, RepaymentMethod, Role, Session, SmeData, User, UserId,
};
use serde_json::{Value, json};

/// How the stub answers `POST /auth/refresh-token`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    /// Issue `fresh` and accept it from then on.
    Grant,
    /// Issue `fresh` but keep rejecting it.
    GrantUseless,
    /// Reject the refresh token.
    Reject,
}

/// Shared stub state.
pub struct StubBackend {
    refresh_mode: RefreshMode,
    accepted_token: Mutex<String>,
    calls: Mutex<Vec<String>>,
    refresh_bodies: Mutex<Vec<Value>>,
    uploads: Mutex<Vec<String>>,
    draft_id: ApplicationId,
}

impl StubBackend {
    pub fn new(refresh_mode: RefreshMode) -> Arc<Self> {
        Arc::new(Self {
            refresh_mode,
            accepted_token: Mutex::new("access-1".to_owned()),
            calls: Mutex::new(Vec::new()),
            refresh_bodies: Mutex::new(Vec::new()),
            uploads: Mutex::new(Vec::new()),
            draft_id: ApplicationId::random(),
        })
    }

    /// Stub that rejects the initial access token so the first call
    /// triggers a refresh.
    pub fn with_stale_token(refresh_mode: RefreshMode) -> Arc<Self> {
        let stub = Self::new(refresh_mode);
        *lock(&stub.accepted_token) = "not-yet-issued".to_owned();
        stub
    }

    pub fn draft_id(&self) -> ApplicationId {
        self.draft_id
    }

    /// Every call as `METHOD /path`, in arrival order.
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    pub fn count(&self, call: &str) -> usize {
        lock(&self.calls).iter().filter(|seen| *seen == call).count()
    }

    pub fn refresh_bodies(&self) -> Vec<Value> {
        lock(&self.refresh_bodies).clone()
    }

    /// Document types received by the upload endpoint.
    pub fn uploads(&self) -> Vec<String> {
        lock(&self.uploads).clone()
    }

    fn record(&self, request: &HttpRequest) {
        lock(&self.calls).push(format!("{} {}", request.method(), request.path()));
    }

    fn authorised(&self, request: &HttpRequest) -> bool {
        let expected = format!("Bearer {}", lock(&self.accepted_token));
        request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value == expected)
    }

    fn application(&self, id: &str, status: &str) -> Value {
        json!({
            "id": id,
            "applicationType": "SME",
            "status": status,
            "createdAt": "2026-10-19T09:00:00Z",
            "applicantName": "Amina Mushi",
        })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn unauthorised() -> HttpResponse {
    HttpResponse::Unauthorized().json(json!({ "message": "Token expired" }))
}

async fn refresh(
    stub: web::Data<Arc<StubBackend>>,
    request: HttpRequest,
    body: web::Json<Value>,
) -> HttpResponse {
    stub.record(&request);
    lock(&stub.refresh_bodies).push(body.into_inner());
    match stub.refresh_mode {
        RefreshMode::Reject => {
            HttpResponse::Unauthorized().json(json!({ "message": "Refresh token expired" }))
        }
        RefreshMode::Grant | RefreshMode::GrantUseless => {
            if stub.refresh_mode == RefreshMode::Grant {
                *lock(&stub.accepted_token) = "fresh".to_owned();
            }
            HttpResponse::Ok().json(json!({
                "success": true,
                "data": { "accessToken": "fresh", "refreshToken": "refresh-2" }
            }))
        }
    }
}

async fn get_application(
    stub: web::Data<Arc<StubBackend>>,
    request: HttpRequest,
    path: web::Path<String>,
) -> HttpResponse {
    stub.record(&request);
    if !stub.authorised(&request) {
        return unauthorised();
    }
    HttpResponse::Ok().json(stub.application(&path, "DRAFT"))
}

async fn create_sme(
    stub: web::Data<Arc<StubBackend>>,
    request: HttpRequest,
    body: web::Json<Value>,
) -> HttpResponse {
    stub.record(&request);
    if !stub.authorised(&request) {
        return unauthorised();
    }
    if body.get("smeData").is_none() {
        return HttpResponse::BadRequest().json(json!({ "message": "smeData is required" }));
    }
    HttpResponse::Created().json(json!({
        "data": stub.application(&stub.draft_id.to_string(), "DRAFT")
    }))
}

async fn update_application(
    stub: web::Data<Arc<StubBackend>>,
    request: HttpRequest,
    path: web::Path<String>,
) -> HttpResponse {
    stub.record(&request);
    if !stub.authorised(&request) {
        return unauthorised();
    }
    HttpResponse::Ok().json(stub.application(&path, "DRAFT"))
}

/// Pulls the `documentType` text part out of a multipart body.
fn document_type_part(body: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(body);
    let (_, rest) = text.split_once("name=\"documentType\"")?;
    let (_, rest) = rest.split_once("\r\n\r\n")?;
    rest.split("\r\n").next().map(str::to_owned)
}

async fn upload_document(
    stub: web::Data<Arc<StubBackend>>,
    request: HttpRequest,
    body: web::Bytes,
) -> HttpResponse {
    stub.record(&request);
    if !stub.authorised(&request) {
        return unauthorised();
    }
    let Some(document_type) = document_type_part(&body) else {
        return HttpResponse::BadRequest().json(json!({ "message": "documentType is required" }));
    };
    lock(&stub.uploads).push(document_type.clone());
    HttpResponse::Ok().json(json!({
        "id": uuid::Uuid::new_v4(),
        "fileName": format!("{}.jpg", document_type.to_lowercase()),
        "documentType": document_type,
    }))
}

async fn submit(
    stub: web::Data<Arc<StubBackend>>,
    request: HttpRequest,
    path: web::Path<String>,
) -> HttpResponse {
    stub.record(&request);
    if !stub.authorised(&request) {
        return unauthorised();
    }
    let mut application = stub.application(&path, "SUBMITTED");
    application["submittedAt"] = json!("2026-10-19T09:05:00Z");
    HttpResponse::Ok().json(application)
}

/// Start the stub on an ephemeral port. Returns the API base URL.
pub async fn spawn_backend(stub: Arc<StubBackend>) -> Result<(String, ServerHandle), String> {
    let listener = TcpListener::bind("127.0.0.1:0").map_err(|err| err.to_string())?;
    let addr = listener.local_addr().map_err(|err| err.to_string())?;
    let data = web::Data::new(stub);

    let server = HttpServer::new(move || {
        let api = web::scope("/api")
            .route("/auth/refresh-token", web::post().to(refresh))
            .route("/applications/sme", web::post().to(create_sme))
            .route("/applications/{id}", web::get().to(get_application))
            .route("/applications/{id}", web::put().to(update_application))
            .route(
                "/applications/{id}/documents/upload",
                web::post().to(upload_document),
            )
            .route("/applications/{id}/submit", web::post().to(submit));
        App::new().app_data(data.clone()).service(api)
    })
    .disable_signals()
    .workers(1)
    .listen(listener)
    .map_err(|err| err.to_string())?
    .run();

    let handle = server.handle();
    actix_web::rt::spawn(server);

    Ok((format!("http://{addr}/api"), handle))
}

pub fn user() -> User {
    User {
        id: UserId::random(),
        email: "amina@example.com".to_owned(),
        first_name: "Amina".to_owned(),
        last_name: "Mushi".to_owned(),
        phone_number: Some("0712345678".to_owned()),
        national_id: None,
        role: Role::Applicant,
        documents: Vec::new(),
    }
}

pub fn session() -> Session {
    Session::new("access-1", "refresh-1", user())
}

/// SME form that passes every step.
pub fn valid_sme() -> SmeData {
    SmeData {
        business_name: "Mama Lishe Foods".to_owned(),
        business_type: "Food vendor".to_owned(),
        registration_number: "BRN-20931".to_owned(),
        business_address: "Kariakoo, Dar es Salaam".to_owned(),
        business_phone: "0712345678".to_owned(),
        months_in_operation: Some(30),
        number_of_employees: Some(4),
        monthly_revenue: Some(900_000),
        loan_amount: Some(2_000_000),
        payback_period_months: Some(12),
        repayment_method: Some(RepaymentMethod::Monthly),
        loan_purpose: "Stock".to_owned(),
        credit_history: CreditHistory {
            credit_reference_consent: true,
            ..CreditHistory::default()
        },
        ..SmeData::default()
    }
}
