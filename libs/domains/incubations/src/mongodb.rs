//! MongoDB implementation of IncubationRepository

use api_features::ListQuery;
use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::{
    Collection, Database, IndexModel,
    bson::{DateTime, Document, doc, oid::ObjectId},
    options::{IndexOptions, ReturnDocument},
};
use tracing::instrument;

use crate::error::IncubationResult;
use crate::models::{Child, GeoPoint, Hospital, Incubation, IncubationReservation};
use crate::repository::IncubationRepository;

pub struct MongoIncubationRepository {
    hospitals: Collection<Hospital>,
    incubations: Collection<Incubation>,
    children: Collection<Child>,
    reservations: Collection<IncubationReservation>,
}

impl MongoIncubationRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            hospitals: db.collection::<Hospital>("hospitals"),
            incubations: db.collection::<Incubation>("incubations"),
            children: db.collection::<Child>("children"),
            reservations: db.collection::<IncubationReservation>("incubationreservations"),
        }
    }

    /// Initialize indexes; `$near` needs the 2dsphere index on `location`.
    pub async fn init_indexes(&self) -> IncubationResult<()> {
        let hospital_indexes = vec![
            IndexModel::builder()
                .keys(doc! { "location": "2dsphere" })
                .options(
                    IndexOptions::builder()
                        .name("idx_location_2dsphere".to_string())
                        .build(),
                )
                .build(),
            IndexModel::builder()
                .keys(doc! { "availableIncubations": 1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_available_incubations".to_string())
                        .build(),
                )
                .build(),
        ];
        self.hospitals.create_indexes(hospital_indexes).await?;

        self.incubations
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "hospital": 1, "empty": 1 })
                    .options(
                        IndexOptions::builder()
                            .name("idx_hospital_empty".to_string())
                            .build(),
                    )
                    .build(),
            )
            .await?;

        self.children
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "user": 1 })
                    .options(IndexOptions::builder().name("idx_user".to_string()).build())
                    .build(),
            )
            .await?;

        let reservation_indexes = vec![
            IndexModel::builder()
                .keys(doc! { "paymentIntent": 1 })
                .options(
                    IndexOptions::builder()
                        .unique(true)
                        .name("idx_payment_intent_unique".to_string())
                        .build(),
                )
                .build(),
            IndexModel::builder()
                .keys(doc! { "user": 1, "createdAt": -1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_user_created".to_string())
                        .build(),
                )
                .build(),
            IndexModel::builder()
                .keys(doc! { "hospital": 1, "createdAt": -1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_hospital_created".to_string())
                        .build(),
                )
                .build(),
        ];
        self.reservations.create_indexes(reservation_indexes).await?;

        tracing::info!("Incubation indexes created successfully");
        Ok(())
    }
}

fn near_filter(point: &GeoPoint, max_distance: f64) -> Document {
    doc! {
        "location": {
            "$near": {
                "$geometry": point.to_document(),
                "$maxDistance": max_distance,
            }
        },
        "availableIncubations": { "$gt": 0 },
    }
}

fn claim_filter(id: ObjectId, payment_intent: &str) -> Document {
    doc! {
        "_id": id,
        "$or": [
            { "empty": true },
            { "empty": false, "reservedBy": payment_intent },
        ],
    }
}

#[async_trait]
impl IncubationRepository for MongoIncubationRepository {
    #[instrument(skip(self))]
    async fn near_hospital_ids(
        &self,
        point: GeoPoint,
        max_distance: f64,
    ) -> IncubationResult<Vec<ObjectId>> {
        let documents: Vec<Document> = self
            .hospitals
            .clone_with_type::<Document>()
            .find(near_filter(&point, max_distance))
            .projection(doc! { "_id": 1 })
            .await?
            .try_collect()
            .await?;

        Ok(documents
            .iter()
            .filter_map(|document| document.get_object_id("_id").ok())
            .collect())
    }

    #[instrument(skip(self, query))]
    async fn list_hospitals(&self, query: ListQuery) -> IncubationResult<Vec<Document>> {
        Ok(query.execute(&self.hospitals).await?)
    }

    #[instrument(skip(self))]
    async fn count_hospitals(&self, filter: Document) -> IncubationResult<u64> {
        Ok(self.hospitals.count_documents(filter).await?)
    }

    #[instrument(skip(self))]
    async fn find_hospital(&self, id: ObjectId) -> IncubationResult<Option<Hospital>> {
        Ok(self.hospitals.find_one(doc! { "_id": id }).await?)
    }

    #[instrument(skip(self))]
    async fn find_available_incubation(&self, id: ObjectId) -> IncubationResult<Option<Incubation>> {
        Ok(self
            .incubations
            .find_one(doc! { "_id": id, "empty": true })
            .await?)
    }

    #[instrument(skip(self))]
    async fn find_owned_child(&self, id: ObjectId, user: ObjectId) -> IncubationResult<Option<Child>> {
        Ok(self.children.find_one(doc! { "_id": id, "user": user }).await?)
    }

    #[instrument(skip(self), fields(incubation_id = %id))]
    async fn claim_incubation(
        &self,
        id: ObjectId,
        payment_intent: &str,
    ) -> IncubationResult<Option<Incubation>> {
        let claimed = self
            .incubations
            .find_one_and_update(
                claim_filter(id, payment_intent),
                doc! { "$set": {
                    "empty": false,
                    "reservedBy": payment_intent,
                    "updatedAt": DateTime::now(),
                } },
            )
            .return_document(ReturnDocument::After)
            .await?;
        Ok(claimed)
    }

    #[instrument(skip(self), fields(incubation_id = %id))]
    async fn release_incubation(&self, id: ObjectId, payment_intent: &str) -> IncubationResult<()> {
        self.incubations
            .update_one(
                doc! { "_id": id, "empty": false, "reservedBy": payment_intent },
                doc! {
                    "$set": { "empty": true, "updatedAt": DateTime::now() },
                    "$unset": { "reservedBy": "" },
                },
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn count_empty_incubations(&self, hospital: ObjectId) -> IncubationResult<u64> {
        Ok(self
            .incubations
            .count_documents(doc! { "hospital": hospital, "empty": true })
            .await?)
    }

    #[instrument(skip(self), fields(hospital_id = %hospital))]
    async fn set_available_incubations(&self, hospital: ObjectId, available: u64) -> IncubationResult<()> {
        self.hospitals
            .update_one(
                doc! { "_id": hospital },
                doc! { "$set": { "availableIncubations": available as i64 } },
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_reservation_by_payment_intent(
        &self,
        payment_intent: &str,
    ) -> IncubationResult<Option<IncubationReservation>> {
        Ok(self
            .reservations
            .find_one(doc! { "paymentIntent": payment_intent })
            .await?)
    }

    #[instrument(skip(self, reservation), fields(reservation_id = %reservation.id))]
    async fn insert_reservation(&self, reservation: &IncubationReservation) -> IncubationResult<()> {
        self.reservations.insert_one(reservation).await?;
        tracing::info!(
            reservation_id = %reservation.id,
            incubation_id = %reservation.incubation,
            "Incubation reservation created"
        );
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_reservation(&self, filter: Document) -> IncubationResult<Option<IncubationReservation>> {
        Ok(self.reservations.find_one(filter).await?)
    }

    #[instrument(skip(self, query))]
    async fn list_reservations(&self, query: ListQuery) -> IncubationResult<Vec<Document>> {
        Ok(query.execute(&self.reservations).await?)
    }

    #[instrument(skip(self))]
    async fn count_reservations(&self, filter: Document) -> IncubationResult<u64> {
        Ok(self.reservations.count_documents(filter).await?)
    }
}
