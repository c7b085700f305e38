use std::sync::{Arc, Mutex};

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request};
use axum::response::Response;
use axum::Router;
use chrono::{DateTime, Duration, TimeZone, Utc};
use secrecy::SecretString;
use serde_json::{json, Value};

use crate::auth::{TokenAuthority, User, UserId};
use crate::clock::Clock;
use crate::error::RepositoryError;
use crate::listings::domain::{Listing, ListingId};
use crate::listings::repository::{InMemoryListingRepository, ListingRepository};
use crate::listings::{listing_router, ListingService};

/// Advances one minute on every read so creation order is visible in timestamps.
pub(super) struct SteppingClock {
    next: Mutex<DateTime<Utc>>,
}

impl SteppingClock {
    pub(super) fn new() -> Self {
        let start = Utc
            .with_ymd_and_hms(2025, 3, 1, 12, 0, 0)
            .single()
            .expect("valid start");
        Self {
            next: Mutex::new(start),
        }
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        let mut next = self.next.lock().expect("clock lock");
        let now = *next;
        *next = now + Duration::minutes(1);
        now
    }
}

/// Repository whose every call fails as if the store were down.
pub(super) struct UnavailableRepository;

impl ListingRepository for UnavailableRepository {
    fn insert(&self, _listing: Listing) -> Result<Listing, RepositoryError> {
        Err(RepositoryError::Unavailable("store offline".to_string()))
    }

    fn fetch(&self, _id: &ListingId) -> Result<Option<Listing>, RepositoryError> {
        Err(RepositoryError::Unavailable("store offline".to_string()))
    }

    fn newest_first(&self) -> Result<Vec<Listing>, RepositoryError> {
        Err(RepositoryError::Unavailable("store offline".to_string()))
    }

    fn modify(
        &self,
        _id: &ListingId,
        _change: &mut dyn FnMut(&mut Listing),
    ) -> Result<Listing, RepositoryError> {
        Err(RepositoryError::Unavailable("store offline".to_string()))
    }

    fn remove(&self, _id: &ListingId) -> Result<Listing, RepositoryError> {
        Err(RepositoryError::Unavailable("store offline".to_string()))
    }
}

pub(super) fn payload() -> Value {
    json!({
        "title": "Apartamento com vista",
        "description": "Dois quartos, sacada e vaga coberta.",
        "price": 385000,
        "city": "Florianopolis",
        "neighborhood": "Centro",
        "type": "apartment",
        "purpose": "sale",
        "bedrooms": 2,
        "bathrooms": 1,
        "area": 68.5,
        "condoFee": 540,
        "hasGarage": true,
        "images": ["https://res.cloudinary.com/demo/image/upload/grimoveis/sala.jpg"]
    })
}

pub(super) fn titled(title: &str) -> Value {
    let mut payload = payload();
    payload["title"] = json!(title);
    payload
}

pub(super) fn build_service() -> (
    Arc<ListingService<InMemoryListingRepository>>,
    InMemoryListingRepository,
) {
    let repository = InMemoryListingRepository::default();
    let service = Arc::new(ListingService::new(
        Arc::new(repository.clone()),
        Arc::new(SteppingClock::new()),
    ));
    (service, repository)
}

pub(super) fn authority() -> TokenAuthority {
    TokenAuthority::new(
        &SecretString::from("listing-tests-secret"),
        Duration::hours(1),
    )
}

pub(super) fn bearer(tokens: &TokenAuthority) -> String {
    let user = User {
        id: UserId("agent-1".to_string()),
        email: "corretor@grimoveis.com.br".to_string(),
        password_hash: String::new(),
        created_at: Utc::now(),
    };
    let token = tokens.issue(&user, Utc::now()).expect("token issued");
    format!("Bearer {token}")
}

pub(super) fn build_router() -> (Router, InMemoryListingRepository, String) {
    let (service, repository) = build_service();
    let tokens = authority();
    let bearer = bearer(&tokens);
    (listing_router(service, tokens), repository, bearer)
}

pub(super) fn request(
    method: Method,
    uri: &str,
    authorization: Option<&str>,
    body: Option<&Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(body).expect("serialize body")))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

pub(super) async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}
