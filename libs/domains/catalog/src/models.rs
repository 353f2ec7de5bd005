use api_features::json::{to_api_json, to_json};
use mongodb::bson::{self, DateTime, Document, doc, oid::ObjectId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};
use utoipa::ToSchema;
use validator::Validate;

use crate::error::{CatalogError, CatalogResult};
use crate::slug::slugify;

/// Entity names as they appear in client-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum CatalogEntity {
    Product,
    Category,
    Brand,
}

impl CatalogEntity {
    pub fn plural(&self) -> &'static str {
        match self {
            CatalogEntity::Product => "products",
            CatalogEntity::Category => "categories",
            CatalogEntity::Brand => "brands",
        }
    }
}

/// Categories and brands share one shape; only the collection and the
/// name of the asset field differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum LabelKind {
    Category,
    Brand,
}

impl LabelKind {
    pub fn entity(&self) -> CatalogEntity {
        match self {
            LabelKind::Category => CatalogEntity::Category,
            LabelKind::Brand => CatalogEntity::Brand,
        }
    }

    pub fn collection(&self) -> &'static str {
        match self {
            LabelKind::Category => "categories",
            LabelKind::Brand => "brands",
        }
    }

    /// `image` for categories, `logo` for brands.
    pub fn asset_field(&self) -> &'static str {
        match self {
            LabelKind::Category => "image",
            LabelKind::Brand => "logo",
        }
    }

    /// Folder under the configured asset root.
    pub fn folder(&self) -> &'static str {
        match self {
            LabelKind::Category => "category",
            LabelKind::Brand => "brand",
        }
    }
}

/// An uploaded image: the store's public id and its HTTPS URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Asset {
    pub id: String,
    pub url: String,
}

impl Asset {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
        }
    }
}

impl From<Asset> for bson::Bson {
    fn from(asset: Asset) -> Self {
        bson::Bson::Document(doc! { "id": asset.id, "url": asset.url })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id")]
    #[schema(value_type = String)]
    pub id: ObjectId,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub price: f64,
    /// Percentage off, 1-100
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating_avg: Option<f64>,
    #[serde(default)]
    pub rating_count: i64,
    pub quantity: i64,
    #[serde(default)]
    pub sold: i64,
    pub image_cover: Asset,
    #[serde(default)]
    pub images: Vec<Asset>,
    /// Random folder holding every image of this product
    pub cloud_folder: String,
    #[schema(value_type = String)]
    pub category: ObjectId,
    #[schema(value_type = String)]
    pub brand: ObjectId,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime,
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTime,
}

impl Product {
    pub fn new(input: CreateProduct, cloud_folder: String, cover: Asset, images: Vec<Asset>) -> Self {
        let now = DateTime::now();
        Self {
            id: ObjectId::new(),
            slug: slugify(&input.title),
            title: input.title,
            description: input.description,
            price: input.price,
            discount: input.discount,
            rating_avg: Some(input.rating_avg),
            rating_count: input.rating_count,
            quantity: input.quantity,
            sold: input.sold,
            image_cover: cover,
            images,
            cloud_folder,
            category: input.category,
            brand: input.brand,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn final_price(&self) -> f64 {
        final_price(self.price, self.discount)
    }

    /// Public ids of the cover and every gallery image.
    pub fn asset_ids(&self) -> Vec<String> {
        std::iter::once(self.image_cover.id.clone())
            .chain(self.images.iter().map(|a| a.id.clone()))
            .collect()
    }

    /// API shape: hex ids, RFC 3339 dates and the derived `finalPrice`.
    pub fn to_json(&self) -> CatalogResult<Value> {
        let mut value = to_api_json(self).map_err(|e| CatalogError::Internal(e.to_string()))?;
        if let Value::Object(map) = &mut value {
            map.insert("finalPrice".to_string(), Value::from(self.final_price()));
        }
        Ok(value)
    }
}

/// `price - price * discount / 100`, rounded to cents.
pub fn final_price(price: f64, discount: Option<f64>) -> f64 {
    let discounted = price - price * discount.unwrap_or(0.0) / 100.0;
    (discounted * 100.0).round() / 100.0
}

/// Convert a raw (possibly projected) product document, adding
/// `finalPrice` whenever `price` survived the projection.
pub fn product_document_to_json(document: Document) -> Value {
    let price = document.get("price").and_then(number);
    let discount = document.get("discount").and_then(number);

    let mut value = to_json(document);
    if let (Some(price), Value::Object(map)) = (price, &mut value) {
        map.insert("finalPrice".to_string(), Value::from(final_price(price, discount)));
    }
    value
}

fn number(value: &bson::Bson) -> Option<f64> {
    match value {
        bson::Bson::Double(f) => Some(*f),
        bson::Bson::Int32(i) => Some(f64::from(*i)),
        bson::Bson::Int64(i) => Some(*i as f64),
        _ => None,
    }
}

/// A category or a brand.
///
/// Stored with the asset under [`LabelKind::asset_field`], so the document
/// mapping is done by hand rather than through serde.
#[derive(Debug, Clone, PartialEq, ToSchema)]
pub struct Label {
    #[schema(value_type = String)]
    pub id: ObjectId,
    pub name: String,
    pub slug: String,
    /// Rendered as `image` for categories and `logo` for brands
    pub asset: Asset,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime,
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTime,
}

impl Label {
    pub fn new(name: impl Into<String>, asset: Asset) -> Self {
        let name = name.into();
        let now = DateTime::now();
        Self {
            id: ObjectId::new(),
            slug: slugify(&name),
            name,
            asset,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn to_document(&self, kind: LabelKind) -> Document {
        doc! {
            "_id": self.id,
            "name": self.name.as_str(),
            "slug": self.slug.as_str(),
            kind.asset_field(): self.asset.clone(),
            "createdAt": self.created_at,
            "updatedAt": self.updated_at,
        }
    }

    pub fn from_document(kind: LabelKind, document: &Document) -> CatalogResult<Self> {
        let malformed = |e: bson::document::ValueAccessError| {
            CatalogError::Internal(format!("malformed {} document: {}", kind, e))
        };
        let asset = document.get_document(kind.asset_field()).map_err(malformed)?;

        Ok(Self {
            id: document.get_object_id("_id").map_err(malformed)?,
            name: document.get_str("name").map_err(malformed)?.to_string(),
            slug: document.get_str("slug").map_err(malformed)?.to_string(),
            asset: Asset::new(
                asset.get_str("id").map_err(malformed)?,
                asset.get_str("url").map_err(malformed)?,
            ),
            created_at: *document.get_datetime("createdAt").map_err(malformed)?,
            updated_at: *document.get_datetime("updatedAt").map_err(malformed)?,
        })
    }

    pub fn to_json(&self, kind: LabelKind) -> Value {
        to_json(self.to_document(kind))
    }
}

/// Fields of a new product, parsed from the multipart form.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProduct {
    #[validate(length(min = 3, max = 50, message = "too short or too long product title"))]
    pub title: String,
    #[validate(length(min = 10, max = 500, message = "too short or too long product description"))]
    pub description: String,
    #[validate(range(min = 1))]
    pub quantity: i64,
    #[validate(range(min = 0))]
    pub sold: i64,
    #[validate(range(min = 1.0))]
    pub price: f64,
    #[validate(range(min = 1.0, max = 100.0))]
    pub discount: Option<f64>,
    #[schema(value_type = String)]
    pub category: ObjectId,
    #[schema(value_type = String)]
    pub brand: ObjectId,
    #[validate(range(min = 1.0, max = 5.0))]
    pub rating_avg: f64,
    #[validate(range(min = 1))]
    pub rating_count: i64,
}

/// Product field changes; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProduct {
    #[validate(length(min = 3, max = 50, message = "too short or too long product title"))]
    pub title: Option<String>,
    #[validate(length(min = 10, max = 500, message = "too short or too long product description"))]
    pub description: Option<String>,
    #[validate(range(min = 1))]
    pub quantity: Option<i64>,
    #[validate(range(min = 1.0))]
    pub price: Option<f64>,
    #[validate(range(min = 1.0, max = 100.0))]
    pub discount: Option<f64>,
    #[schema(value_type = Option<String>)]
    pub category: Option<ObjectId>,
    #[schema(value_type = Option<String>)]
    pub brand: Option<ObjectId>,
}

impl UpdateProduct {
    /// `$set` body for the provided fields; a new title also re-slugs.
    pub fn to_set(&self) -> Document {
        let mut set = doc! { "updatedAt": DateTime::now() };
        if let Some(title) = &self.title {
            set.insert("title", title.as_str());
            set.insert("slug", slugify(title));
        }
        if let Some(description) = &self.description {
            set.insert("description", description.as_str());
        }
        if let Some(quantity) = self.quantity {
            set.insert("quantity", quantity);
        }
        if let Some(price) = self.price {
            set.insert("price", price);
        }
        if let Some(discount) = self.discount {
            set.insert("discount", discount);
        }
        if let Some(category) = self.category {
            set.insert("category", category);
        }
        if let Some(brand) = self.brand {
            set.insert("brand", brand);
        }
        set
    }
}
