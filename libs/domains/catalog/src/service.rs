//! Catalog Service - product, category and brand mutations

use std::sync::Arc;

use api_features::{ListQuery, QueryParams};
use axum_helpers::FileUpload;
use mongodb::bson::{Bson, DateTime, doc, oid::ObjectId};
use serde_json::Value;
use tracing::{instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::assets::AssetStore;
use crate::error::{CatalogError, CatalogResult};
use crate::models::{
    Asset, CatalogEntity, CreateProduct, Label, LabelKind, Product, UpdateProduct,
    product_document_to_json,
};
use crate::repository::CatalogRepository;
use crate::slug::slugify;
use crate::update::{LabelUpdateIntent, ProductUpdateIntent};

/// One page of a list endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ListPage {
    pub page: u64,
    pub result: Vec<Value>,
}

/// Catalog service
///
/// Existence and uniqueness checks run before any upload, so a rejected
/// request never leaves orphaned images behind.
pub struct CatalogService<R: CatalogRepository, A: AssetStore> {
    repository: Arc<R>,
    assets: Arc<A>,
}

impl<R: CatalogRepository, A: AssetStore> CatalogService<R, A> {
    pub fn new(repository: R, assets: A) -> Self {
        Self {
            repository: Arc::new(repository),
            assets: Arc::new(assets),
        }
    }

    async fn upload_all(&self, folder: &str, files: &[FileUpload]) -> CatalogResult<Vec<Asset>> {
        let mut uploaded = Vec::with_capacity(files.len());
        for file in files {
            uploaded.push(self.assets.upload(folder, file).await?);
        }
        Ok(uploaded)
    }

    /// Delete assets whose owner is already gone; failures only leave
    /// orphans in the store, so they are logged.
    async fn discard_assets(&self, ids: Vec<String>) {
        if let Err(e) = self.assets.delete_many(&ids).await {
            warn!(error = %e, count = ids.len(), "Failed to delete orphaned assets");
        }
    }

    async fn ensure_label(&self, kind: LabelKind, id: ObjectId) -> CatalogResult<()> {
        match self.repository.find_label(kind, id).await? {
            Some(_) => Ok(()),
            None => Err(CatalogError::NotFound(kind.entity())),
        }
    }

    #[instrument(skip(self, input, cover, gallery), fields(title = %input.title))]
    pub async fn create_product(
        &self,
        input: CreateProduct,
        cover: Option<FileUpload>,
        gallery: Vec<FileUpload>,
    ) -> CatalogResult<Product> {
        input.validate()?;

        self.ensure_label(LabelKind::Category, input.category).await?;
        self.ensure_label(LabelKind::Brand, input.brand).await?;

        if self.repository.product_title_taken(&input.title, None).await? {
            return Err(CatalogError::DuplicateTitle);
        }

        let cover = match cover {
            Some(cover) if !gallery.is_empty() => cover,
            _ => return Err(CatalogError::ProductImagesRequired),
        };

        if input.sold < input.rating_count {
            return Err(CatalogError::SoldBelowRatingCount);
        }

        let cloud_folder = Uuid::new_v4().simple().to_string();
        let folder = format!("product/{}", cloud_folder);

        let images = self.upload_all(&folder, &gallery).await?;
        let image_cover = self.assets.upload(&folder, &cover).await?;

        let product = Product::new(input, cloud_folder, image_cover, images);
        if let Err(e) = self.repository.insert_product(&product).await {
            self.discard_assets(product.asset_ids()).await;
            return Err(e);
        }
        Ok(product)
    }

    #[instrument(skip(self))]
    pub async fn list_products(&self, params: QueryParams) -> CatalogResult<ListPage> {
        let query = ListQuery::from_params(doc! {}, params);
        let page = query.page();

        let documents = self.repository.list_products(query).await?;
        if documents.is_empty() {
            return Err(CatalogError::Empty(CatalogEntity::Product));
        }

        Ok(ListPage {
            page,
            result: documents.into_iter().map(product_document_to_json).collect(),
        })
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, id: ObjectId) -> CatalogResult<Product> {
        self.repository
            .find_product(id)
            .await?
            .ok_or(CatalogError::NotFound(CatalogEntity::Product))
    }

    /// Replace images per `intent`, then apply field changes.
    ///
    /// Superseded assets are deleted before the replacements are uploaded;
    /// a failed upload leaves the product pointing at deleted images until
    /// the next successful update.
    #[instrument(skip(self, input, intent))]
    pub async fn update_product(
        &self,
        id: ObjectId,
        input: UpdateProduct,
        intent: ProductUpdateIntent,
    ) -> CatalogResult<Product> {
        input.validate()?;

        let product = self.get_product(id).await?;

        if let Some(title) = &input.title {
            if self.repository.product_title_taken(title, Some(id)).await? {
                return Err(CatalogError::DuplicateTitle);
            }
        }
        if let Some(category) = input.category {
            self.ensure_label(LabelKind::Category, category).await?;
        }
        if let Some(brand) = input.brand {
            self.ensure_label(LabelKind::Brand, brand).await?;
        }

        let superseded = intent.superseded(&product);
        if !superseded.is_empty() {
            self.assets.delete_many(&superseded).await?;
        }

        let folder = format!("product/{}", product.cloud_folder);
        let mut set = input.to_set();

        match intent {
            ProductUpdateIntent::CoverOnly { cover } => {
                set.insert("imageCover", self.assets.upload(&folder, &cover).await?);
            }
            ProductUpdateIntent::GalleryOnly { gallery } => {
                set.insert("images", assets_bson(self.upload_all(&folder, &gallery).await?));
            }
            ProductUpdateIntent::FieldsOnly => {}
            ProductUpdateIntent::CoverAndGallery { cover, gallery } => {
                set.insert("images", assets_bson(self.upload_all(&folder, &gallery).await?));
                set.insert("imageCover", self.assets.upload(&folder, &cover).await?);
            }
        }

        self.repository
            .update_product(id, set)
            .await?
            .ok_or(CatalogError::NotFound(CatalogEntity::Product))
    }

    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: ObjectId) -> CatalogResult<Product> {
        let product = self
            .repository
            .delete_product(id)
            .await?
            .ok_or(CatalogError::NotFound(CatalogEntity::Product))?;

        self.discard_assets(product.asset_ids()).await;
        Ok(product)
    }

    #[instrument(skip(self, image))]
    pub async fn create_label(
        &self,
        kind: LabelKind,
        name: Option<String>,
        image: Option<FileUpload>,
    ) -> CatalogResult<Label> {
        let image = image.ok_or(CatalogError::ImageRequired {
            entity: kind.entity(),
            field: kind.asset_field(),
        })?;
        let name = name.ok_or_else(|| CatalogError::Validation(format!("{} name is required", kind)))?;

        if self.repository.label_name_taken(kind, &name, None).await? {
            return Err(CatalogError::DuplicateName(kind.entity()));
        }

        let asset = self.assets.upload(kind.folder(), &image).await?;
        let label = Label::new(name, asset);

        if let Err(e) = self.repository.insert_label(kind, &label).await {
            self.discard_assets(vec![label.asset.id.clone()]).await;
            return Err(e);
        }
        Ok(label)
    }

    #[instrument(skip(self))]
    pub async fn list_labels(&self, kind: LabelKind, params: QueryParams) -> CatalogResult<ListPage> {
        let query = ListQuery::from_params(doc! {}, params);
        let page = query.page();

        let documents = self.repository.list_labels(kind, query).await?;
        if documents.is_empty() {
            return Err(CatalogError::Empty(kind.entity()));
        }

        Ok(ListPage {
            page,
            result: documents
                .into_iter()
                .map(api_features::json::to_json)
                .collect(),
        })
    }

    #[instrument(skip(self))]
    pub async fn get_label(&self, kind: LabelKind, id: ObjectId) -> CatalogResult<Label> {
        self.repository
            .find_label(kind, id)
            .await?
            .ok_or(CatalogError::NotFound(kind.entity()))
    }

    #[instrument(skip(self, intent))]
    pub async fn update_label(
        &self,
        kind: LabelKind,
        id: ObjectId,
        intent: LabelUpdateIntent,
    ) -> CatalogResult<Label> {
        let existing = self.get_label(kind, id).await?;

        if let Some(name) = intent.name() {
            if self.repository.label_name_taken(kind, name, Some(id)).await? {
                return Err(CatalogError::DuplicateName(kind.entity()));
            }
        }

        let mut set = doc! { "updatedAt": DateTime::now() };
        if let Some(name) = intent.name() {
            set.insert("name", name);
            set.insert("slug", slugify(name));
        }
        if let Some(image) = intent.image() {
            self.assets.delete_many(&[existing.asset.id.clone()]).await?;
            let asset = self.assets.upload(kind.folder(), image).await?;
            set.insert(kind.asset_field(), asset);
        }

        self.repository
            .update_label(kind, id, set)
            .await?
            .ok_or(CatalogError::NotFound(kind.entity()))
    }

    #[instrument(skip(self))]
    pub async fn delete_label(&self, kind: LabelKind, id: ObjectId) -> CatalogResult<Label> {
        let label = self
            .repository
            .delete_label(kind, id)
            .await?
            .ok_or(CatalogError::NotFound(kind.entity()))?;

        self.discard_assets(vec![label.asset.id.clone()]).await;
        Ok(label)
    }
}

fn assets_bson(assets: Vec<Asset>) -> Bson {
    Bson::Array(assets.into_iter().map(Bson::from).collect())
}
