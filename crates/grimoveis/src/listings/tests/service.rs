use std::sync::Arc;

use serde_json::{json, Number};

use super::common::*;
use crate::listings::domain::{ListingId, Price};
use crate::listings::{ListingService, ListingServiceError};

#[test]
fn list_returns_newest_first() {
    let (service, _) = build_service();
    for title in ["Primeiro anuncio", "Segundo anuncio", "Terceiro anuncio"] {
        service.create(&titled(title)).expect("created");
    }

    let titles: Vec<String> = service
        .list()
        .expect("listed")
        .into_iter()
        .map(|listing| listing.title)
        .collect();

    assert_eq!(
        titles,
        vec!["Terceiro anuncio", "Segundo anuncio", "Primeiro anuncio"]
    );
}

#[test]
fn create_assigns_identity_and_timestamps() {
    let (service, repository) = build_service();

    let listing = service.create(&payload()).expect("created");

    assert!(!listing.id.as_str().is_empty());
    assert_eq!(listing.created_at, listing.updated_at);
    assert_eq!(listing.views, 0);
    assert!(!listing.has_pool && !listing.featured && listing.has_garage);
    assert_eq!(repository.len().expect("len"), 1);
    assert_eq!(service.get(&listing.id).expect("fetched"), listing);
}

#[test]
fn price_sentinel_survives_storage() {
    let (service, _) = build_service();
    let mut body = payload();
    body["price"] = json!("ASK FOR PRICE");

    let created = service.create(&body).expect("created");
    let fetched = service.get(&created.id).expect("fetched");

    assert_eq!(fetched.price, Price::OnRequest);
    assert_eq!(
        serde_json::to_value(&fetched).expect("serialize")["price"],
        json!("ASK FOR PRICE")
    );
}

#[test]
fn invalid_create_is_not_persisted() {
    let (service, repository) = build_service();
    let mut body = payload();
    body.as_object_mut().expect("object").remove("city");

    let err = service.create(&body).expect_err("city is required");

    match err {
        ListingServiceError::Invalid(errors) => assert!(errors.mentions("city")),
        other => panic!("expected validation failure, got {other:?}"),
    }
    assert!(repository.is_empty().expect("len"));
}

#[test]
fn partial_update_changes_only_supplied_fields() {
    let (service, _) = build_service();
    let original = service.create(&payload()).expect("created");

    let updated = service
        .update(&original.id, &json!({ "price": 399000, "featured": true }))
        .expect("updated");

    assert_eq!(updated.price, Price::Amount(Number::from(399000)));
    assert!(updated.featured);
    assert!(updated.updated_at > original.updated_at);
    assert_eq!(updated.created_at, original.created_at);

    let mut expected = original.clone();
    expected.price = updated.price.clone();
    expected.featured = true;
    expected.updated_at = updated.updated_at;
    assert_eq!(updated, expected);
}

#[test]
fn update_can_clear_the_condo_fee() {
    let (service, _) = build_service();
    let original = service.create(&payload()).expect("created");
    assert!(original.is_condominium());

    let updated = service
        .update(&original.id, &json!({ "condoFee": null }))
        .expect("updated");

    assert_eq!(updated.condo_fee, None);
}

#[test]
fn invalid_update_leaves_the_listing_untouched() {
    let (service, _) = build_service();
    let original = service.create(&payload()).expect("created");

    let err = service
        .update(&original.id, &json!({ "bedrooms": -1, "views": 99 }))
        .expect_err("rejected");

    match err {
        ListingServiceError::Invalid(errors) => {
            assert!(errors.mentions("bedrooms"));
            assert!(errors.mentions("views"));
        }
        other => panic!("expected validation failure, got {other:?}"),
    }
    assert_eq!(service.get(&original.id).expect("fetched"), original);
}

#[test]
fn update_of_unknown_id_does_not_create() {
    let (service, repository) = build_service();
    let missing = ListingId("does-not-exist".to_string());

    let err = service
        .update(&missing, &json!({ "title": "Nao existe" }))
        .expect_err("missing");

    assert!(matches!(err, ListingServiceError::NotFound(id) if id == missing));
    assert!(repository.is_empty().expect("len"));
}

#[test]
fn delete_removes_exactly_once() {
    let (service, _) = build_service();
    let listing = service.create(&payload()).expect("created");

    let removed = service.delete(&listing.id).expect("deleted");
    assert_eq!(removed.id, listing.id);

    assert!(matches!(
        service.get(&listing.id),
        Err(ListingServiceError::NotFound(_))
    ));
    assert!(matches!(
        service.delete(&listing.id),
        Err(ListingServiceError::NotFound(_))
    ));
}

#[test]
fn store_failures_surface_as_repository_errors() {
    let service = ListingService::new(
        Arc::new(UnavailableRepository),
        Arc::new(SteppingClock::new()),
    );

    assert!(matches!(
        service.list(),
        Err(ListingServiceError::Repository(_))
    ));
    assert!(matches!(
        service.update(&ListingId("x".to_string()), &json!({ "featured": true })),
        Err(ListingServiceError::Repository(_))
    ));
}
