//! MongoDB repository tests for the incubations domain
//!
//! Run against a throwaway container; skipped unless Docker is available.

use api_features::{ListQuery, QueryParams};
use domain_incubations::{
    BookingMetadata, GeoPoint, Hospital, Incubation, IncubationRepository, IncubationReservation,
    MongoIncubationRepository,
};
use mongodb::bson::{Document, doc, oid::ObjectId};
use test_utils::{TestDataBuilder, TestMongo};

async fn seed_hospital(
    db: &mongodb::Database,
    id: ObjectId,
    name: &str,
    point: GeoPoint,
    available: i64,
) {
    db.collection::<Hospital>("hospitals")
        .insert_one(Hospital {
            id,
            name: name.to_string(),
            stripe_account_id: Some(format!("acct_{}", name)),
            location: point,
            available_incubations: available,
        })
        .await
        .unwrap();
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_near_hospitals_skips_full_and_distant_hospitals() {
    let mongo = TestMongo::new().await;
    let db = mongo.database("incubations_near");
    let repo = MongoIncubationRepository::new(&db);
    repo.init_indexes().await.unwrap();

    let builder = TestDataBuilder::from_test_name("near_hospitals");
    let close = builder.object_id("close");
    let full = builder.object_id("full");
    let far = builder.object_id("far");
    seed_hospital(&db, close, "close", GeoPoint::new(31.2357, 30.0444), 2).await;
    seed_hospital(&db, full, "full", GeoPoint::new(31.2360, 30.0450), 0).await;
    seed_hospital(&db, far, "far", GeoPoint::new(29.9187, 31.2001), 3).await;

    let ids = repo
        .near_hospital_ids(GeoPoint::new(31.2357, 30.0444), 10_000.0)
        .await
        .unwrap();
    assert_eq!(ids, vec![close]);

    let query = ListQuery::from_params(doc! { "_id": { "$in": ids } }, QueryParams::default());
    let hospitals = repo.list_hospitals(query.clone()).await.unwrap();
    assert_eq!(hospitals.len(), 1);
    assert_eq!(repo.count_hospitals(query.conditions()).await.unwrap(), 1);
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_claim_is_compare_and_set() {
    let mongo = TestMongo::new().await;
    let db = mongo.database("incubations_claim");
    let repo = MongoIncubationRepository::new(&db);
    repo.init_indexes().await.unwrap();

    let hospital = ObjectId::new();
    let incubation = Incubation::new(hospital, 1000.0);
    db.collection::<Incubation>("incubations")
        .insert_one(&incubation)
        .await
        .unwrap();

    assert!(repo.find_available_incubation(incubation.id).await.unwrap().is_some());
    assert_eq!(repo.count_empty_incubations(hospital).await.unwrap(), 1);

    let claimed = repo.claim_incubation(incubation.id, "pi_1").await.unwrap().unwrap();
    assert!(!claimed.empty);
    assert_eq!(claimed.reserved_by.as_deref(), Some("pi_1"));
    assert!(repo.claim_incubation(incubation.id, "pi_2").await.unwrap().is_none());
    assert!(repo.find_available_incubation(incubation.id).await.unwrap().is_none());
    assert_eq!(repo.count_empty_incubations(hospital).await.unwrap(), 0);

    // A redelivery of the holding payment gets its claim back.
    assert!(repo.claim_incubation(incubation.id, "pi_1").await.unwrap().is_some());

    // Only the holder can release.
    repo.release_incubation(incubation.id, "pi_2").await.unwrap();
    assert!(repo.claim_incubation(incubation.id, "pi_2").await.unwrap().is_none());

    repo.release_incubation(incubation.id, "pi_1").await.unwrap();
    let reclaimed = repo.claim_incubation(incubation.id, "pi_2").await.unwrap().unwrap();
    assert_eq!(reclaimed.reserved_by.as_deref(), Some("pi_2"));
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_reservations_are_unique_per_payment_intent() {
    let mongo = TestMongo::new().await;
    let db = mongo.database("incubations_reservations");
    let repo = MongoIncubationRepository::new(&db);
    repo.init_indexes().await.unwrap();

    let metadata = BookingMetadata {
        incubation: ObjectId::new(),
        child: ObjectId::new(),
        user: ObjectId::new(),
        price: 1000.0,
        fee: 50.0,
    };
    let hospital = ObjectId::new();
    let first = IncubationReservation::confirmed(hospital, &metadata, "pi_1");
    repo.insert_reservation(&first).await.unwrap();

    let stored = repo.find_reservation_by_payment_intent("pi_1").await.unwrap();
    assert_eq!(stored.map(|r| r.id), Some(first.id));

    let again = IncubationReservation::confirmed(hospital, &metadata, "pi_1");
    let err = repo.insert_reservation(&again).await.unwrap_err();
    let app_error: axum_helpers::AppError = err.into();
    assert_eq!(app_error.status(), axum::http::StatusCode::CONFLICT);

    let mine = repo
        .find_reservation(doc! { "user": metadata.user, "_id": first.id })
        .await
        .unwrap();
    assert!(mine.is_some());
    let someone_else = repo
        .find_reservation(doc! { "user": ObjectId::new(), "_id": first.id })
        .await
        .unwrap();
    assert!(someone_else.is_none());
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_hospital_availability_is_recorded() {
    let mongo = TestMongo::new().await;
    let db = mongo.database("incubations_available");
    let repo = MongoIncubationRepository::new(&db);
    repo.init_indexes().await.unwrap();

    let hospital = ObjectId::new();
    seed_hospital(&db, hospital, "nile", GeoPoint::new(31.2, 30.0), 1).await;

    repo.set_available_incubations(hospital, 0).await.unwrap();

    let stored = repo.find_hospital(hospital).await.unwrap().unwrap();
    assert_eq!(stored.available_incubations, 0);

    let raw = db
        .collection::<Document>("hospitals")
        .find_one(doc! { "_id": hospital })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(raw.get_i64("availableIncubations").unwrap(), 0);
}
