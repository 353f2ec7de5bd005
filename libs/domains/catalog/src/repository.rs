use api_features::ListQuery;
use async_trait::async_trait;
use mongodb::bson::{Document, oid::ObjectId};

use crate::error::CatalogResult;
use crate::models::{Label, LabelKind, Product};

/// Persistence for products, categories and brands.
///
/// List methods return raw documents because the caller's projection may
/// drop any field.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn find_product(&self, id: ObjectId) -> CatalogResult<Option<Product>>;

    /// Whether another product (not `except`) already uses `title`.
    async fn product_title_taken(&self, title: &str, except: Option<ObjectId>) -> CatalogResult<bool>;

    async fn insert_product(&self, product: &Product) -> CatalogResult<()>;

    /// Apply `$set` and return the updated product.
    async fn update_product(&self, id: ObjectId, set: Document) -> CatalogResult<Option<Product>>;

    async fn delete_product(&self, id: ObjectId) -> CatalogResult<Option<Product>>;

    async fn list_products(&self, query: ListQuery) -> CatalogResult<Vec<Document>>;

    async fn find_label(&self, kind: LabelKind, id: ObjectId) -> CatalogResult<Option<Label>>;

    async fn label_name_taken(
        &self,
        kind: LabelKind,
        name: &str,
        except: Option<ObjectId>,
    ) -> CatalogResult<bool>;

    async fn insert_label(&self, kind: LabelKind, label: &Label) -> CatalogResult<()>;

    async fn update_label(
        &self,
        kind: LabelKind,
        id: ObjectId,
        set: Document,
    ) -> CatalogResult<Option<Label>>;

    async fn delete_label(&self, kind: LabelKind, id: ObjectId) -> CatalogResult<Option<Label>>;

    async fn list_labels(&self, kind: LabelKind, query: ListQuery) -> CatalogResult<Vec<Document>>;
}
