//! Booking details carried through the payment processor.
//!
//! The processor stores metadata as a flat string map and hands it back on
//! the webhook, so every field is written as text and parsed again on the
//! way back in.

use std::collections::BTreeMap;

use mongodb::bson::oid::ObjectId;

use crate::error::{IncubationError, IncubationResult};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BookingMetadata {
    pub incubation: ObjectId,
    pub child: ObjectId,
    pub user: ObjectId,
    /// Incubation price in major currency units
    pub price: f64,
    /// Platform fee in major currency units
    pub fee: f64,
}

impl BookingMetadata {
    pub fn to_map(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("incubation".to_string(), self.incubation.to_hex()),
            ("child".to_string(), self.child.to_hex()),
            ("user".to_string(), self.user.to_hex()),
            ("price".to_string(), self.price.to_string()),
            ("fee".to_string(), self.fee.to_string()),
        ])
    }

    pub fn from_map(map: &BTreeMap<String, String>) -> IncubationResult<Self> {
        let price = amount(map, "price")?;
        let fee = amount(map, "fee")?;
        if fee > price {
            return Err(IncubationError::InvalidMetadata(
                "fee exceeds price".to_string(),
            ));
        }

        Ok(Self {
            incubation: object_id(map, "incubation")?,
            child: object_id(map, "child")?,
            user: object_id(map, "user")?,
            price,
            fee,
        })
    }
}

fn field<'a>(map: &'a BTreeMap<String, String>, key: &str) -> IncubationResult<&'a str> {
    map.get(key)
        .map(String::as_str)
        .ok_or_else(|| IncubationError::InvalidMetadata(format!("{} is missing", key)))
}

fn object_id(map: &BTreeMap<String, String>, key: &str) -> IncubationResult<ObjectId> {
    ObjectId::parse_str(field(map, key)?)
        .map_err(|_| IncubationError::InvalidMetadata(format!("{} is not a valid id", key)))
}

fn amount(map: &BTreeMap<String, String>, key: &str) -> IncubationResult<f64> {
    field(map, key)?
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value >= 0.0)
        .ok_or_else(|| IncubationError::InvalidMetadata(format!("{} is not a valid amount", key)))
}
