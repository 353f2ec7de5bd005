use api_features::ListQuery;
use async_trait::async_trait;
use mongodb::bson::{Document, oid::ObjectId};

use crate::error::IncubationResult;
use crate::models::{Child, GeoPoint, Hospital, Incubation, IncubationReservation};

/// Persistence for hospitals, incubations, children and reservations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IncubationRepository: Send + Sync {
    /// Ids of hospitals with at least one empty incubation within
    /// `max_distance` meters of `point`, nearest first.
    async fn near_hospital_ids(
        &self,
        point: GeoPoint,
        max_distance: f64,
    ) -> IncubationResult<Vec<ObjectId>>;

    async fn list_hospitals(&self, query: ListQuery) -> IncubationResult<Vec<Document>>;

    async fn count_hospitals(&self, filter: Document) -> IncubationResult<u64>;

    async fn find_hospital(&self, id: ObjectId) -> IncubationResult<Option<Hospital>>;

    /// The incubation, only while it is still empty.
    async fn find_available_incubation(&self, id: ObjectId) -> IncubationResult<Option<Incubation>>;

    /// The child, only when `user` owns it.
    async fn find_owned_child(&self, id: ObjectId, user: ObjectId) -> IncubationResult<Option<Child>>;

    /// Atomically take the incubation for `payment_intent`: succeeds while it
    /// is empty or already held by the same intent, so a redelivered payment
    /// can resume its own claim. `None` when missing or held by another intent.
    async fn claim_incubation(
        &self,
        id: ObjectId,
        payment_intent: &str,
    ) -> IncubationResult<Option<Incubation>>;

    /// Undo a claim whose reservation could not be stored. Only the intent
    /// holding the claim can release it.
    async fn release_incubation(&self, id: ObjectId, payment_intent: &str) -> IncubationResult<()>;

    async fn count_empty_incubations(&self, hospital: ObjectId) -> IncubationResult<u64>;

    async fn set_available_incubations(&self, hospital: ObjectId, available: u64) -> IncubationResult<()>;

    async fn find_reservation_by_payment_intent(
        &self,
        payment_intent: &str,
    ) -> IncubationResult<Option<IncubationReservation>>;

    async fn insert_reservation(&self, reservation: &IncubationReservation) -> IncubationResult<()>;

    async fn find_reservation(&self, filter: Document) -> IncubationResult<Option<IncubationReservation>>;

    async fn list_reservations(&self, query: ListQuery) -> IncubationResult<Vec<Document>>;

    async fn count_reservations(&self, filter: Document) -> IncubationResult<u64>;
}
