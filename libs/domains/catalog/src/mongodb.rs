//! MongoDB implementation of CatalogRepository

use api_features::ListQuery;
use async_trait::async_trait;
use mongodb::{
    Collection, Database, IndexModel,
    bson::{Document, doc, oid::ObjectId},
    options::{IndexOptions, ReturnDocument},
};
use tracing::instrument;

use crate::error::CatalogResult;
use crate::models::{Label, LabelKind, Product};
use crate::repository::CatalogRepository;

pub struct MongoCatalogRepository {
    products: Collection<Product>,
    db: Database,
}

impl MongoCatalogRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            products: db.collection::<Product>("products"),
            db: db.clone(),
        }
    }

    fn labels(&self, kind: LabelKind) -> Collection<Document> {
        self.db.collection::<Document>(kind.collection())
    }

    /// Initialize indexes; the unique ones back the existence checks
    pub async fn init_indexes(&self) -> CatalogResult<()> {
        let product_indexes = vec![
            IndexModel::builder()
                .keys(doc! { "title": 1 })
                .options(
                    IndexOptions::builder()
                        .unique(true)
                        .name("idx_title_unique".to_string())
                        .build(),
                )
                .build(),
            IndexModel::builder()
                .keys(doc! { "cloudFolder": 1 })
                .options(
                    IndexOptions::builder()
                        .unique(true)
                        .name("idx_cloud_folder_unique".to_string())
                        .build(),
                )
                .build(),
            IndexModel::builder()
                .keys(doc! { "category": 1, "brand": 1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_category_brand".to_string())
                        .build(),
                )
                .build(),
            IndexModel::builder()
                .keys(doc! { "price": 1 })
                .options(IndexOptions::builder().name("idx_price".to_string()).build())
                .build(),
        ];
        self.products.create_indexes(product_indexes).await?;

        for kind in [LabelKind::Category, LabelKind::Brand] {
            let unique_name = IndexModel::builder()
                .keys(doc! { "name": 1 })
                .options(
                    IndexOptions::builder()
                        .unique(true)
                        .name("idx_name_unique".to_string())
                        .build(),
                )
                .build();
            self.labels(kind).create_index(unique_name).await?;
        }

        tracing::info!("Catalog indexes created successfully");
        Ok(())
    }
}

/// `{field: value}`, excluding one document when it is being updated.
fn uniqueness_filter(field: &str, value: &str, except: Option<ObjectId>) -> Document {
    let mut filter = doc! { field: value };
    if let Some(id) = except {
        filter.insert("_id", doc! { "$ne": id });
    }
    filter
}

#[async_trait]
impl CatalogRepository for MongoCatalogRepository {
    #[instrument(skip(self))]
    async fn find_product(&self, id: ObjectId) -> CatalogResult<Option<Product>> {
        Ok(self.products.find_one(doc! { "_id": id }).await?)
    }

    #[instrument(skip(self))]
    async fn product_title_taken(&self, title: &str, except: Option<ObjectId>) -> CatalogResult<bool> {
        let count = self
            .products
            .count_documents(uniqueness_filter("title", title, except))
            .await?;
        Ok(count > 0)
    }

    #[instrument(skip(self, product), fields(product_id = %product.id))]
    async fn insert_product(&self, product: &Product) -> CatalogResult<()> {
        self.products.insert_one(product).await?;
        tracing::info!(product_id = %product.id, "Product created successfully");
        Ok(())
    }

    #[instrument(skip(self, set))]
    async fn update_product(&self, id: ObjectId, set: Document) -> CatalogResult<Option<Product>> {
        let product = self
            .products
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": set })
            .return_document(ReturnDocument::After)
            .await?;
        Ok(product)
    }

    #[instrument(skip(self))]
    async fn delete_product(&self, id: ObjectId) -> CatalogResult<Option<Product>> {
        Ok(self.products.find_one_and_delete(doc! { "_id": id }).await?)
    }

    #[instrument(skip(self, query))]
    async fn list_products(&self, query: ListQuery) -> CatalogResult<Vec<Document>> {
        Ok(query.execute(&self.products).await?)
    }

    #[instrument(skip(self))]
    async fn find_label(&self, kind: LabelKind, id: ObjectId) -> CatalogResult<Option<Label>> {
        self.labels(kind)
            .find_one(doc! { "_id": id })
            .await?
            .map(|document| Label::from_document(kind, &document))
            .transpose()
    }

    #[instrument(skip(self))]
    async fn label_name_taken(
        &self,
        kind: LabelKind,
        name: &str,
        except: Option<ObjectId>,
    ) -> CatalogResult<bool> {
        let count = self
            .labels(kind)
            .count_documents(uniqueness_filter("name", name, except))
            .await?;
        Ok(count > 0)
    }

    #[instrument(skip(self, label), fields(label_id = %label.id))]
    async fn insert_label(&self, kind: LabelKind, label: &Label) -> CatalogResult<()> {
        self.labels(kind).insert_one(label.to_document(kind)).await?;
        tracing::info!(label_id = %label.id, kind = %kind, "Label created successfully");
        Ok(())
    }

    #[instrument(skip(self, set))]
    async fn update_label(
        &self,
        kind: LabelKind,
        id: ObjectId,
        set: Document,
    ) -> CatalogResult<Option<Label>> {
        self.labels(kind)
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": set })
            .return_document(ReturnDocument::After)
            .await?
            .map(|document| Label::from_document(kind, &document))
            .transpose()
    }

    #[instrument(skip(self))]
    async fn delete_label(&self, kind: LabelKind, id: ObjectId) -> CatalogResult<Option<Label>> {
        self.labels(kind)
            .find_one_and_delete(doc! { "_id": id })
            .await?
            .map(|document| Label::from_document(kind, &document))
            .transpose()
    }

    #[instrument(skip(self, query))]
    async fn list_labels(&self, kind: LabelKind, query: ListQuery) -> CatalogResult<Vec<Document>> {
        Ok(query.execute(&self.labels(kind)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniqueness_filter_for_create() {
        assert_eq!(
            uniqueness_filter("title", "Stroller", None),
            doc! { "title": "Stroller" }
        );
    }

    #[test]
    fn test_uniqueness_filter_excludes_self_on_update() {
        let id = ObjectId::new();
        assert_eq!(
            uniqueness_filter("name", "Toys", Some(id)),
            doc! { "name": "Toys", "_id": { "$ne": id } }
        );
    }
}
