use api_features::json::to_api_json;
use axum_helpers::{AuthUser, Role};
use mongodb::bson::{DateTime, Document, doc, oid::ObjectId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use validator::Validate;

use crate::error::{IncubationError, IncubationResult};
use crate::metadata::BookingMetadata;

/// Platform cut of every booking, in percent.
pub const PLATFORM_FEE_PERCENT: i64 = 5;

/// Search radius when the request leaves `distance` out.
pub const DEFAULT_SEARCH_DISTANCE: f64 = 10_000.0;

/// Currency every incubation is charged in.
pub const CURRENCY: &str = "egp";

/// GeoJSON point, `[longitude, latitude]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GeoPoint {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: [f64; 2],
}

impl GeoPoint {
    pub fn new(long: f64, lat: f64) -> Self {
        Self {
            kind: "Point".to_string(),
            coordinates: [long, lat],
        }
    }

    pub fn to_document(&self) -> Document {
        doc! { "type": self.kind.as_str(), "coordinates": [self.coordinates[0], self.coordinates[1]] }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Hospital {
    /// Same id as the hospital's user account
    #[serde(rename = "_id")]
    #[schema(value_type = String)]
    pub id: ObjectId,
    pub name: String,
    /// Connected account receiving booking transfers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stripe_account_id: Option<String>,
    pub location: GeoPoint,
    /// Count of empty incubations, recomputed after each booking
    #[serde(default)]
    pub available_incubations: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Incubation {
    #[serde(rename = "_id")]
    #[schema(value_type = String)]
    pub id: ObjectId,
    #[schema(value_type = String)]
    pub hospital: ObjectId,
    /// Price in major currency units
    pub price: f64,
    pub empty: bool,
    /// Payment intent holding the claim while `empty` is false
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reserved_by: Option<String>,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime,
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTime,
}

impl Incubation {
    pub fn new(hospital: ObjectId, price: f64) -> Self {
        let now = DateTime::now();
        Self {
            id: ObjectId::new(),
            hospital,
            price,
            empty: true,
            reserved_by: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Child {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    /// Owning user
    pub user: ObjectId,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IncubationReservation {
    #[serde(rename = "_id")]
    #[schema(value_type = String)]
    pub id: ObjectId,
    #[schema(value_type = String)]
    pub hospital: ObjectId,
    #[schema(value_type = String)]
    pub user: ObjectId,
    #[schema(value_type = String)]
    pub child: ObjectId,
    #[schema(value_type = String)]
    pub incubation: ObjectId,
    pub price: f64,
    pub fee: f64,
    /// Processor payment intent id; one reservation per intent
    pub payment_intent: String,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime,
}

impl IncubationReservation {
    /// Reservation for a confirmed payment. The hospital comes from the
    /// claimed incubation, not from the processor metadata.
    pub fn confirmed(
        hospital: ObjectId,
        metadata: &BookingMetadata,
        payment_intent: impl Into<String>,
    ) -> Self {
        Self {
            id: ObjectId::new(),
            hospital,
            user: metadata.user,
            child: metadata.child,
            incubation: metadata.incubation,
            price: metadata.price,
            fee: metadata.fee,
            payment_intent: payment_intent.into(),
            created_at: DateTime::now(),
        }
    }

    pub fn to_json(&self) -> IncubationResult<Value> {
        to_api_json(self).map_err(|e| IncubationError::Internal(e.to_string()))
    }
}

/// Amounts for one booking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BookingCharge {
    /// Price in major units
    pub price: f64,
    /// Platform fee in major units
    pub fee: f64,
    /// Amount charged, in minor units
    pub amount: i64,
    /// Platform fee, in minor units
    pub application_fee_amount: i64,
}

impl BookingCharge {
    pub fn for_price(price: f64) -> Self {
        let amount = (price * 100.0).round() as i64;
        Self {
            price,
            fee: price * PLATFORM_FEE_PERCENT as f64 / 100.0,
            amount,
            application_fee_amount: amount * PLATFORM_FEE_PERCENT / 100,
        }
    }
}

/// Base filter restricting which reservations a caller may see.
#[derive(Debug, Clone, PartialEq)]
pub struct ReservationScope(Document);

impl ReservationScope {
    pub fn for_user(user: &AuthUser) -> IncubationResult<Self> {
        match user.role {
            Role::User => Ok(Self(doc! { "user": user.id })),
            Role::Hospital => Ok(Self(doc! { "hospital": user.id })),
            Role::Admin => Ok(Self(Document::new())),
            Role::Doctor => Err(IncubationError::RoleNotAllowed(user.role)),
        }
    }

    pub fn filter(&self) -> Document {
        self.0.clone()
    }

    /// Scope narrowed to a single reservation.
    pub fn with_id(&self, id: ObjectId) -> Document {
        let mut filter = self.filter();
        filter.insert("_id", id);
        filter
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct NearHospitalsRequest {
    #[validate(range(min = -180.0, max = 180.0, message = "longitude must be between -180 and 180"))]
    pub long: f64,
    #[validate(range(min = -90.0, max = 90.0, message = "latitude must be between -90 and 90"))]
    pub lat: f64,
    /// Search radius in meters, 10000 when omitted
    #[validate(range(exclusive_min = 0.0, message = "distance must be positive"))]
    pub distance: Option<f64>,
}

impl NearHospitalsRequest {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.long, self.lat)
    }

    pub fn distance(&self) -> f64 {
        self.distance.unwrap_or(DEFAULT_SEARCH_DISTANCE)
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BookingRequest {
    #[schema(value_type = String)]
    pub incubation: ObjectId,
    #[schema(value_type = String)]
    pub child: ObjectId,
}

/// What the client needs to confirm the card payment.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSession {
    pub payment_intent: String,
    pub client_secret: String,
}
