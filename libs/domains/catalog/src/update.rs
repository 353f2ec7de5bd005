//! What an update request replaces, decided once from the uploaded files.

use axum_helpers::FileUpload;

use crate::error::{CatalogError, CatalogResult};
use crate::models::Product;

/// Image replacement carried by a product update. Field changes apply in
/// every case.
#[derive(Debug, Clone)]
pub enum ProductUpdateIntent {
    CoverOnly { cover: FileUpload },
    GalleryOnly { gallery: Vec<FileUpload> },
    FieldsOnly,
    CoverAndGallery {
        cover: FileUpload,
        gallery: Vec<FileUpload>,
    },
}

impl ProductUpdateIntent {
    pub fn from_uploads(cover: Option<FileUpload>, gallery: Vec<FileUpload>) -> Self {
        match (cover, gallery.is_empty()) {
            (Some(cover), true) => Self::CoverOnly { cover },
            (None, false) => Self::GalleryOnly { gallery },
            (None, true) => Self::FieldsOnly,
            (Some(cover), false) => Self::CoverAndGallery { cover, gallery },
        }
    }

    /// Public ids of the stored assets this update replaces.
    pub fn superseded(&self, product: &Product) -> Vec<String> {
        let gallery = || product.images.iter().map(|a| a.id.clone());
        match self {
            Self::CoverOnly { .. } => vec![product.image_cover.id.clone()],
            Self::GalleryOnly { .. } => gallery().collect(),
            Self::FieldsOnly => Vec::new(),
            Self::CoverAndGallery { .. } => gallery()
                .chain(std::iter::once(product.image_cover.id.clone()))
                .collect(),
        }
    }
}

/// Category or brand update; at least one of name and image is required.
#[derive(Debug, Clone)]
pub enum LabelUpdateIntent {
    ImageOnly { image: FileUpload },
    NameOnly { name: String },
    NameAndImage { name: String, image: FileUpload },
}

impl LabelUpdateIntent {
    pub fn new(name: Option<String>, image: Option<FileUpload>) -> CatalogResult<Self> {
        match (name, image) {
            (None, Some(image)) => Ok(Self::ImageOnly { image }),
            (Some(name), None) => Ok(Self::NameOnly { name }),
            (Some(name), Some(image)) => Ok(Self::NameAndImage { name, image }),
            (None, None) => Err(CatalogError::NothingToUpdate),
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::NameOnly { name } | Self::NameAndImage { name, .. } => Some(name.as_str()),
            Self::ImageOnly { .. } => None,
        }
    }

    pub fn image(&self) -> Option<&FileUpload> {
        match self {
            Self::ImageOnly { image } | Self::NameAndImage { image, .. } => Some(image),
            Self::NameOnly { .. } => None,
        }
    }
}
