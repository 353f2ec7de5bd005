//! List-query pipeline shared by every collection endpoint.
//!
//! A flat query string becomes a MongoDB predicate plus find options:
//!
//! ```text
//! ?page=2&price[gte]=10&sort=-price&keyword=phone&fields=title,price
//!      │         │            │            │              │
//!  paginate    filter        sort        search         fields
//!  skip 25     $gte: 10      price: -1   $or regex      projection
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use api_features::{ListQuery, QueryParams, json};
//! use mongodb::bson::{Document, doc};
//!
//! # async fn example(collection: mongodb::Collection<Document>) -> mongodb::error::Result<()> {
//! let params = QueryParams::from_pairs(vec![("keyword", "phone".to_string())]);
//! let query = ListQuery::from_params(doc! {}, params);
//!
//! let page = query.execute(&collection).await?;
//! let total = query.count(&collection).await?;
//! let metadata = query.metadata(total);
//! let result: Vec<_> = page.into_iter().map(json::to_json).collect();
//! # Ok(())
//! # }
//! ```

pub mod json;
pub mod metadata;
pub mod params;
pub mod pipeline;

pub use metadata::{PAGE_SIZE, PageMetadata, calculate_total_and_pages};
pub use params::{ListParams, QueryParams, RESERVED_KEYS};
pub use pipeline::{ListQuery, SEARCH_FIELDS};
