//! HTTP handlers for products, categories and brands
//!
//! Reads are public. Mutations go through the JWT middleware and require
//! the `admin` role.

use std::str::FromStr;
use std::sync::Arc;

use api_features::{ListParams, QueryParams};
use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, post, put},
};
use axum_helpers::{
    AppError, AuthUser, Envelope, JwtAuth, MultipartForm, ObjectIdPath, Role,
    errors::responses::{
        BadGatewayResponse, BadRequestObjectIdResponse, BadRequestUploadResponse,
        BadRequestValidationResponse, ConflictResponse, ForbiddenResponse,
        InternalServerErrorResponse, NotFoundResponse, UnauthorizedResponse,
    },
    jwt_auth_middleware,
};
use utoipa::OpenApi;

use crate::assets::AssetStore;
use crate::models::{Asset, CreateProduct, Label, LabelKind, Product, UpdateProduct};
use crate::repository::CatalogRepository;
use crate::service::CatalogService;
use crate::update::{LabelUpdateIntent, ProductUpdateIntent};

/// OpenAPI documentation for the catalog API
#[derive(OpenApi)]
#[openapi(
    paths(
        list_products,
        create_product,
        get_product,
        update_product,
        delete_product,
        list_categories,
        create_category,
        get_category,
        update_category,
        delete_category,
        list_brands,
        create_brand,
        get_brand,
        update_brand,
        delete_brand,
    ),
    components(
        schemas(Product, CreateProduct, UpdateProduct, Label, Asset),
        responses(
            NotFoundResponse,
            BadRequestValidationResponse,
            BadRequestObjectIdResponse,
            BadRequestUploadResponse,
            UnauthorizedResponse,
            ForbiddenResponse,
            ConflictResponse,
            BadGatewayResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Products", description = "Product catalog"),
        (name = "Categories", description = "Product categories"),
        (name = "Brands", description = "Product brands")
    )
)]
pub struct ApiDoc;

type SharedService<R, A> = Arc<CatalogService<R, A>>;

/// Create the catalog router: `/products`, `/categories` and `/brands`.
pub fn router<R, A>(service: CatalogService<R, A>, auth: JwtAuth) -> Router
where
    R: CatalogRepository + 'static,
    A: AssetStore + 'static,
{
    let shared_service = Arc::new(service);
    let require_login = from_fn_with_state(auth, jwt_auth_middleware);

    let products = Router::new()
        .route("/", get(list_products))
        .route("/{id}", get(get_product))
        .merge(
            Router::new()
                .route("/", post(create_product))
                .route("/{id}", put(update_product).delete(delete_product))
                .route_layer(require_login.clone()),
        );

    let categories = Router::new()
        .route("/", get(list_categories))
        .route("/{id}", get(get_category))
        .merge(
            Router::new()
                .route("/", post(create_category))
                .route("/{id}", put(update_category).delete(delete_category))
                .route_layer(require_login.clone()),
        );

    let brands = Router::new()
        .route("/", get(list_brands))
        .route("/{id}", get(get_brand))
        .merge(
            Router::new()
                .route("/", post(create_brand))
                .route("/{id}", put(update_brand).delete(delete_brand))
                .route_layer(require_login),
        );

    Router::new()
        .nest("/products", products)
        .nest("/categories", categories)
        .nest("/brands", brands)
        .with_state(shared_service)
}

fn required<T: FromStr>(form: &MultipartForm, name: &str) -> Result<T, AppError> {
    form.parse(name)?
        .ok_or_else(|| AppError::BadRequest(format!("{} is required", name)))
}

fn create_product_input(form: &MultipartForm) -> Result<CreateProduct, AppError> {
    Ok(CreateProduct {
        title: required(form, "title")?,
        description: required(form, "description")?,
        quantity: required(form, "quantity")?,
        sold: required(form, "sold")?,
        price: required(form, "price")?,
        discount: form.parse("discount")?,
        category: required(form, "category")?,
        brand: required(form, "brand")?,
        rating_avg: required(form, "ratingAvg")?,
        rating_count: required(form, "ratingCount")?,
    })
}

fn update_product_input(form: &MultipartForm) -> Result<UpdateProduct, AppError> {
    Ok(UpdateProduct {
        title: form.text("title"),
        description: form.text("description"),
        quantity: form.parse("quantity")?,
        price: form.parse("price")?,
        discount: form.parse("discount")?,
        category: form.parse("category")?,
        brand: form.parse("brand")?,
    })
}

/// List products
#[utoipa::path(
    get,
    path = "/products",
    tag = "Products",
    params(ListParams),
    responses(
        (status = 200, description = "`{ message, page, result }` with products (projected by `fields`)"),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_products<R: CatalogRepository, A: AssetStore>(
    State(service): State<SharedService<R, A>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Envelope, AppError> {
    let page = service.list_products(QueryParams::from_pairs(pairs)).await?;
    Ok(Envelope::success()
        .with("page", page.page)
        .with("result", page.result))
}

/// Create a product (admin)
///
/// Multipart form with the product fields, one `imageCover` file and one or
/// more `images` files (PNG or JPEG).
#[utoipa::path(
    post,
    path = "/products",
    tag = "Products",
    request_body(content = CreateProduct, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "`{ message, result }` with the created product", body = Product),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse),
        (status = 502, response = BadGatewayResponse)
    )
)]
async fn create_product<R: CatalogRepository, A: AssetStore>(
    State(service): State<SharedService<R, A>>,
    user: AuthUser,
    form: MultipartForm,
) -> Result<Envelope, AppError> {
    user.require(&[Role::Admin])?;

    let input = create_product_input(&form)?;
    let product = service
        .create_product(input, form.file("imageCover").cloned(), form.files("images"))
        .await?;

    Ok(Envelope::success()
        .status(StatusCode::CREATED)
        .with("result", product.to_json()?))
}

/// Get a product by ID
#[utoipa::path(
    get,
    path = "/products/{id}",
    tag = "Products",
    params(("id" = String, Path, description = "Product ObjectId")),
    responses(
        (status = 200, description = "`{ message, result }`", body = Product),
        (status = 400, response = BadRequestObjectIdResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn get_product<R: CatalogRepository, A: AssetStore>(
    State(service): State<SharedService<R, A>>,
    ObjectIdPath(id): ObjectIdPath,
) -> Result<Envelope, AppError> {
    let product = service.get_product(id).await?;
    Ok(Envelope::success().with("result", product.to_json()?))
}

/// Update a product (admin)
///
/// Any subset of fields. Sending `imageCover` and/or `images` replaces the
/// corresponding stored images.
#[utoipa::path(
    put,
    path = "/products/{id}",
    tag = "Products",
    params(("id" = String, Path, description = "Product ObjectId")),
    request_body(content = UpdateProduct, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "`{ message, result }` with the updated product", body = Product),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse),
        (status = 502, response = BadGatewayResponse)
    )
)]
async fn update_product<R: CatalogRepository, A: AssetStore>(
    State(service): State<SharedService<R, A>>,
    user: AuthUser,
    ObjectIdPath(id): ObjectIdPath,
    form: MultipartForm,
) -> Result<Envelope, AppError> {
    user.require(&[Role::Admin])?;

    let input = update_product_input(&form)?;
    let intent =
        ProductUpdateIntent::from_uploads(form.file("imageCover").cloned(), form.files("images"));
    let product = service.update_product(id, input, intent).await?;

    Ok(Envelope::success().with("result", product.to_json()?))
}

/// Delete a product (admin)
#[utoipa::path(
    delete,
    path = "/products/{id}",
    tag = "Products",
    params(("id" = String, Path, description = "Product ObjectId")),
    responses(
        (status = 200, description = "`{ message, result }` with the deleted product", body = Product),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn delete_product<R: CatalogRepository, A: AssetStore>(
    State(service): State<SharedService<R, A>>,
    user: AuthUser,
    ObjectIdPath(id): ObjectIdPath,
) -> Result<Envelope, AppError> {
    user.require(&[Role::Admin])?;

    let product = service.delete_product(id).await?;
    Ok(Envelope::success().with("result", product.to_json()?))
}

async fn list_labels<R: CatalogRepository, A: AssetStore>(
    service: &CatalogService<R, A>,
    kind: LabelKind,
    pairs: Vec<(String, String)>,
) -> Result<Envelope, AppError> {
    let page = service
        .list_labels(kind, QueryParams::from_pairs(pairs))
        .await?;
    Ok(Envelope::success()
        .with("page", page.page)
        .with("result", page.result))
}

async fn create_label<R: CatalogRepository, A: AssetStore>(
    service: &CatalogService<R, A>,
    kind: LabelKind,
    user: AuthUser,
    form: MultipartForm,
) -> Result<Envelope, AppError> {
    user.require(&[Role::Admin])?;

    let label = service
        .create_label(kind, form.text("name"), form.file(kind.asset_field()).cloned())
        .await?;
    Ok(Envelope::success()
        .status(StatusCode::CREATED)
        .with("result", label.to_json(kind)))
}

async fn get_label<R: CatalogRepository, A: AssetStore>(
    service: &CatalogService<R, A>,
    kind: LabelKind,
    id: mongodb::bson::oid::ObjectId,
) -> Result<Envelope, AppError> {
    let label = service.get_label(kind, id).await?;
    Ok(Envelope::success().with("result", label.to_json(kind)))
}

async fn update_label<R: CatalogRepository, A: AssetStore>(
    service: &CatalogService<R, A>,
    kind: LabelKind,
    user: AuthUser,
    id: mongodb::bson::oid::ObjectId,
    form: MultipartForm,
) -> Result<Envelope, AppError> {
    user.require(&[Role::Admin])?;

    let intent = LabelUpdateIntent::new(form.text("name"), form.file(kind.asset_field()).cloned())?;
    let label = service.update_label(kind, id, intent).await?;
    Ok(Envelope::success().with("result", label.to_json(kind)))
}

async fn delete_label<R: CatalogRepository, A: AssetStore>(
    service: &CatalogService<R, A>,
    kind: LabelKind,
    user: AuthUser,
    id: mongodb::bson::oid::ObjectId,
) -> Result<Envelope, AppError> {
    user.require(&[Role::Admin])?;

    let label = service.delete_label(kind, id).await?;
    Ok(Envelope::success().with("result", label.to_json(kind)))
}

/// List categories
#[utoipa::path(
    get,
    path = "/categories",
    tag = "Categories",
    params(ListParams),
    responses(
        (status = 200, description = "`{ message, page, result }`"),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn list_categories<R: CatalogRepository, A: AssetStore>(
    State(service): State<SharedService<R, A>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Envelope, AppError> {
    list_labels(&service, LabelKind::Category, pairs).await
}

/// Create a category (admin)
///
/// Multipart form with `name` and an `image` file.
#[utoipa::path(
    post,
    path = "/categories",
    tag = "Categories",
    request_body(content_type = "multipart/form-data", description = "`name` field and `image` file"),
    responses(
        (status = 201, description = "`{ message, result }` with the created category", body = Label),
        (status = 400, response = BadRequestUploadResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 409, response = ConflictResponse),
        (status = 502, response = BadGatewayResponse)
    )
)]
async fn create_category<R: CatalogRepository, A: AssetStore>(
    State(service): State<SharedService<R, A>>,
    user: AuthUser,
    form: MultipartForm,
) -> Result<Envelope, AppError> {
    create_label(&service, LabelKind::Category, user, form).await
}

/// Get a category by ID
#[utoipa::path(
    get,
    path = "/categories/{id}",
    tag = "Categories",
    params(("id" = String, Path, description = "Category ObjectId")),
    responses(
        (status = 200, description = "`{ message, result }`", body = Label),
        (status = 400, response = BadRequestObjectIdResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn get_category<R: CatalogRepository, A: AssetStore>(
    State(service): State<SharedService<R, A>>,
    ObjectIdPath(id): ObjectIdPath,
) -> Result<Envelope, AppError> {
    get_label(&service, LabelKind::Category, id).await
}

/// Update a category (admin)
///
/// Send `name`, an `image` file, or both.
#[utoipa::path(
    put,
    path = "/categories/{id}",
    tag = "Categories",
    params(("id" = String, Path, description = "Category ObjectId")),
    request_body(content_type = "multipart/form-data", description = "`name` field and/or `image` file"),
    responses(
        (status = 200, description = "`{ message, result }` with the updated category", body = Label),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse)
    )
)]
async fn update_category<R: CatalogRepository, A: AssetStore>(
    State(service): State<SharedService<R, A>>,
    user: AuthUser,
    ObjectIdPath(id): ObjectIdPath,
    form: MultipartForm,
) -> Result<Envelope, AppError> {
    update_label(&service, LabelKind::Category, user, id, form).await
}

/// Delete a category (admin)
#[utoipa::path(
    delete,
    path = "/categories/{id}",
    tag = "Categories",
    params(("id" = String, Path, description = "Category ObjectId")),
    responses(
        (status = 200, description = "`{ message, result }` with the deleted category", body = Label),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn delete_category<R: CatalogRepository, A: AssetStore>(
    State(service): State<SharedService<R, A>>,
    user: AuthUser,
    ObjectIdPath(id): ObjectIdPath,
) -> Result<Envelope, AppError> {
    delete_label(&service, LabelKind::Category, user, id).await
}

/// List brands
#[utoipa::path(
    get,
    path = "/brands",
    tag = "Brands",
    params(ListParams),
    responses(
        (status = 200, description = "`{ message, page, result }`"),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn list_brands<R: CatalogRepository, A: AssetStore>(
    State(service): State<SharedService<R, A>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Envelope, AppError> {
    list_labels(&service, LabelKind::Brand, pairs).await
}

/// Create a brand (admin)
///
/// Multipart form with `name` and a `logo` file.
#[utoipa::path(
    post,
    path = "/brands",
    tag = "Brands",
    request_body(content_type = "multipart/form-data", description = "`name` field and `logo` file"),
    responses(
        (status = 201, description = "`{ message, result }` with the created brand", body = Label),
        (status = 400, response = BadRequestUploadResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 409, response = ConflictResponse),
        (status = 502, response = BadGatewayResponse)
    )
)]
async fn create_brand<R: CatalogRepository, A: AssetStore>(
    State(service): State<SharedService<R, A>>,
    user: AuthUser,
    form: MultipartForm,
) -> Result<Envelope, AppError> {
    create_label(&service, LabelKind::Brand, user, form).await
}

/// Get a brand by ID
#[utoipa::path(
    get,
    path = "/brands/{id}",
    tag = "Brands",
    params(("id" = String, Path, description = "Brand ObjectId")),
    responses(
        (status = 200, description = "`{ message, result }`", body = Label),
        (status = 400, response = BadRequestObjectIdResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn get_brand<R: CatalogRepository, A: AssetStore>(
    State(service): State<SharedService<R, A>>,
    ObjectIdPath(id): ObjectIdPath,
) -> Result<Envelope, AppError> {
    get_label(&service, LabelKind::Brand, id).await
}

/// Update a brand (admin)
///
/// Send `name`, a `logo` file, or both.
#[utoipa::path(
    put,
    path = "/brands/{id}",
    tag = "Brands",
    params(("id" = String, Path, description = "Brand ObjectId")),
    request_body(content_type = "multipart/form-data", description = "`name` field and/or `logo` file"),
    responses(
        (status = 200, description = "`{ message, result }` with the updated brand", body = Label),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse)
    )
)]
async fn update_brand<R: CatalogRepository, A: AssetStore>(
    State(service): State<SharedService<R, A>>,
    user: AuthUser,
    ObjectIdPath(id): ObjectIdPath,
    form: MultipartForm,
) -> Result<Envelope, AppError> {
    update_label(&service, LabelKind::Brand, user, id, form).await
}

/// Delete a brand (admin)
#[utoipa::path(
    delete,
    path = "/brands/{id}",
    tag = "Brands",
    params(("id" = String, Path, description = "Brand ObjectId")),
    responses(
        (status = 200, description = "`{ message, result }` with the deleted brand", body = Label),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn delete_brand<R: CatalogRepository, A: AssetStore>(
    State(service): State<SharedService<R, A>>,
    user: AuthUser,
    ObjectIdPath(id): ObjectIdPath,
) -> Result<Envelope, AppError> {
    delete_label(&service, LabelKind::Brand, user, id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MockAssetStore;
    use crate::repository::MockCatalogRepository;
    use axum::body::Body;
    use axum::http::Request;
    use axum_helpers::JwtConfig;
    use http_body_util::BodyExt;
    use mongodb::bson::oid::ObjectId;
    use serde_json::Value;
    use tower::ServiceExt; // For oneshot()

    const SECRET: &str = "catalog-handler-tests-secret-0123456789";

    fn auth() -> JwtAuth {
        JwtAuth::new(&JwtConfig::new(SECRET).unwrap())
    }

    fn app(repo: MockCatalogRepository, assets: MockAssetStore) -> Router {
        router(CatalogService::new(repo, assets), auth())
    }

    fn bearer(role: Role) -> String {
        let token = auth()
            .create_access_token(&ObjectId::new().to_hex(), role)
            .unwrap();
        format!("Bearer {}", token)
    }

    fn multipart(fields: &[(&str, &str)]) -> (String, Body) {
        let boundary = "catalog-boundary";
        let mut payload = String::new();
        for (name, value) in fields {
            payload.push_str(&format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            ));
        }
        payload.push_str(&format!("--{boundary}--\r\n"));
        (
            format!("multipart/form-data; boundary={}", boundary),
            Body::from(payload),
        )
    }

    async fn json_body(body: Body) -> Value {
        let bytes = body.collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_list_products_is_public_and_reports_empty() {
        let mut repo = MockCatalogRepository::new();
        repo.expect_list_products().returning(|_| Ok(vec![]));

        let response = app(repo, MockAssetStore::new())
            .oneshot(
                Request::builder()
                    .uri("/products?page=2")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = json_body(response.into_body()).await;
        assert_eq!(body["message"], "Not products added yet");
    }

    #[tokio::test]
    async fn test_create_category_requires_login() {
        let (content_type, body) = multipart(&[("name", "Toys")]);

        let response = app(MockCatalogRepository::new(), MockAssetStore::new())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/categories")
                    .header("content-type", content_type)
                    .body(body)
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_brand_rejects_non_admin() {
        let (content_type, body) = multipart(&[("name", "Chicco")]);

        let response = app(MockCatalogRepository::new(), MockAssetStore::new())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/brands")
                    .header("content-type", content_type)
                    .header("authorization", bearer(Role::User))
                    .body(body)
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_update_category_needs_name_or_image() {
        let (content_type, body) = multipart(&[]);

        let response = app(MockCatalogRepository::new(), MockAssetStore::new())
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri(format!("/categories/{}", ObjectId::new().to_hex()))
                    .header("content-type", content_type)
                    .header("authorization", bearer(Role::Admin))
                    .body(body)
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response.into_body()).await;
        assert_eq!(body["message"], "enter name or upload image");
    }

    #[tokio::test]
    async fn test_update_category_renames() {
        let id = ObjectId::new();
        let mut repo = MockCatalogRepository::new();
        repo.expect_find_label().returning(|_, _| {
            Ok(Some(Label::new(
                "Toys",
                Asset::new("danna/category/a", "https://img/a.png"),
            )))
        });
        repo.expect_label_name_taken()
            .withf(move |_, name, except| name == "Games" && *except == Some(id))
            .returning(|_, _, _| Ok(false));
        repo.expect_update_label().returning(|_, _, _| {
            Ok(Some(Label::new(
                "Games",
                Asset::new("danna/category/a", "https://img/a.png"),
            )))
        });

        let (content_type, body) = multipart(&[("name", "Games")]);
        let response = app(repo, MockAssetStore::new())
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri(format!("/categories/{}", id.to_hex()))
                    .header("content-type", content_type)
                    .header("authorization", bearer(Role::Admin))
                    .body(body)
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response.into_body()).await;
        assert_eq!(body["message"], "success");
        assert_eq!(body["result"]["name"], "Games");
        assert_eq!(body["result"]["slug"], "games");
    }

    #[tokio::test]
    async fn test_get_product_rejects_invalid_id() {
        let response = app(MockCatalogRepository::new(), MockAssetStore::new())
            .oneshot(
                Request::builder()
                    .uri("/products/not-an-id")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_product_reports_missing_field() {
        let (content_type, body) = multipart(&[("title", "Baby stroller")]);

        let response = app(MockCatalogRepository::new(), MockAssetStore::new())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/products")
                    .header("content-type", content_type)
                    .header("authorization", bearer(Role::Admin))
                    .body(body)
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response.into_body()).await;
        assert_eq!(body["message"], "description is required");
    }
}
