//! OpenAPI documentation configuration

use utoipa::OpenApi;

/// Combined OpenAPI documentation for all APIs
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Danna API",
        version = "0.1.0",
        description = "Baby products catalog and incubation booking",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    nest(
        (path = "/api/v1", api = domain_catalog::ApiDoc),
        (path = "/api/v1", api = domain_incubations::ApiDoc)
    ),
    tags(
        (name = "Products", description = "Products with cover and gallery images"),
        (name = "Categories", description = "Product categories"),
        (name = "Brands", description = "Product brands"),
        (name = "Incubation Reservations", description = "Nearby hospitals and incubation booking")
    )
)]
pub struct ApiDoc;
