//! HTTP handlers for incubation reservations and the booking webhook

use std::sync::Arc;

use api_features::{ListParams, PageMetadata, QueryParams};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_helpers::{
    AppError, AuthUser, Envelope, JwtAuth, ObjectIdPath, Role, ValidatedJson,
    errors::responses::{
        BadGatewayResponse, BadRequestObjectIdResponse, BadRequestValidationResponse,
        ConflictResponse, ForbiddenResponse, InternalServerErrorResponse, NotFoundResponse,
        UnauthorizedResponse,
    },
    jwt_auth_middleware,
};
use serde_json::json;
use utoipa::OpenApi;

use crate::models::{
    BookingRequest, CheckoutSession, GeoPoint, Hospital, IncubationReservation,
    NearHospitalsRequest,
};
use crate::payments::PaymentGateway;
use crate::payments::webhook::SIGNATURE_HEADER;
use crate::repository::IncubationRepository;
use crate::service::{IncubationService, WebhookOutcome};

/// Path the processor delivers booking events to, outside `/api/v1`.
pub const WEBHOOK_PATH: &str = "/bookIncubationOnlineWebhook";

/// OpenAPI documentation for the incubation reservation API
#[derive(OpenApi)]
#[openapi(
    paths(
        near_hospitals,
        create_checkout_session,
        list_reservations,
        get_reservation,
    ),
    components(
        schemas(
            NearHospitalsRequest,
            BookingRequest,
            CheckoutSession,
            Hospital,
            GeoPoint,
            IncubationReservation,
            PageMetadata
        ),
        responses(
            NotFoundResponse,
            BadRequestValidationResponse,
            BadRequestObjectIdResponse,
            UnauthorizedResponse,
            ForbiddenResponse,
            ConflictResponse,
            BadGatewayResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Incubation Reservations", description = "Nearby search, booking and reservation history")
    )
)]
pub struct ApiDoc;

type SharedService<R, P> = Arc<IncubationService<R, P>>;

/// Create the `/incubation-reservations` router; every route needs a login.
pub fn router<R, P>(service: SharedService<R, P>, auth: JwtAuth) -> Router
where
    R: IncubationRepository + 'static,
    P: PaymentGateway + 'static,
{
    let reservations = Router::new()
        .route("/", get(list_reservations))
        .route("/near-hospitals", post(near_hospitals))
        .route("/checkout-session", post(create_checkout_session))
        .route("/{id}", get(get_reservation))
        .route_layer(from_fn_with_state(auth, jwt_auth_middleware));

    Router::new()
        .nest("/incubation-reservations", reservations)
        .with_state(service)
}

/// Create the raw-body webhook router. Mount it outside any JSON or auth
/// middleware so the signature covers the exact bytes received.
pub fn webhook_router<R, P>(service: SharedService<R, P>) -> Router
where
    R: IncubationRepository + 'static,
    P: PaymentGateway + 'static,
{
    Router::new()
        .route(WEBHOOK_PATH, post(booking_webhook))
        .with_state(service)
}

/// Hospitals near a point with at least one empty incubation
#[utoipa::path(
    post,
    path = "/incubation-reservations/near-hospitals",
    tag = "Incubation Reservations",
    params(ListParams),
    request_body = NearHospitalsRequest,
    responses(
        (status = 200, description = "`{ message, totalNearHospitals, metadata, result }`"),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn near_hospitals<R: IncubationRepository, P: PaymentGateway>(
    State(service): State<SharedService<R, P>>,
    Query(pairs): Query<Vec<(String, String)>>,
    ValidatedJson(request): ValidatedJson<NearHospitalsRequest>,
) -> Result<Envelope, AppError> {
    let page = service
        .near_hospitals(request, QueryParams::from_pairs(pairs))
        .await?;

    Ok(Envelope::success()
        .with("totalNearHospitals", page.total)
        .with("metadata", page.metadata)
        .with("result", page.result))
}

/// Start booking an incubation (user)
///
/// Creates a card payment intent; the incubation is only reserved once the
/// processor confirms the payment through the webhook.
#[utoipa::path(
    post,
    path = "/incubation-reservations/checkout-session",
    tag = "Incubation Reservations",
    request_body = BookingRequest,
    responses(
        (status = 200, description = "`{ message, clientSecret }`"),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse),
        (status = 502, response = BadGatewayResponse)
    )
)]
async fn create_checkout_session<R: IncubationRepository, P: PaymentGateway>(
    State(service): State<SharedService<R, P>>,
    user: AuthUser,
    ValidatedJson(request): ValidatedJson<BookingRequest>,
) -> Result<Envelope, AppError> {
    user.require(&[Role::User])?;

    let session = service.create_checkout_session(user.id, request).await?;
    Ok(Envelope::success()
        .with("clientSecret", session.client_secret)
        .with("paymentIntent", session.payment_intent))
}

/// List reservations visible to the caller
///
/// Users see their own bookings, hospitals the bookings made with them and
/// admins everything.
#[utoipa::path(
    get,
    path = "/incubation-reservations",
    tag = "Incubation Reservations",
    params(ListParams),
    responses(
        (status = 200, description = "`{ message, totalIncubationReservations, metadata, result }`"),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn list_reservations<R: IncubationRepository, P: PaymentGateway>(
    State(service): State<SharedService<R, P>>,
    user: AuthUser,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Envelope, AppError> {
    let page = service
        .list_reservations(&user, QueryParams::from_pairs(pairs))
        .await?;

    Ok(Envelope::success()
        .with("totalIncubationReservations", page.total)
        .with("metadata", page.metadata)
        .with("result", page.result))
}

/// Get one reservation visible to the caller
#[utoipa::path(
    get,
    path = "/incubation-reservations/{id}",
    tag = "Incubation Reservations",
    params(("id" = String, Path, description = "Reservation ObjectId")),
    responses(
        (status = 200, description = "`{ message, result }`", body = IncubationReservation),
        (status = 400, response = BadRequestObjectIdResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn get_reservation<R: IncubationRepository, P: PaymentGateway>(
    State(service): State<SharedService<R, P>>,
    user: AuthUser,
    ObjectIdPath(id): ObjectIdPath,
) -> Result<Envelope, AppError> {
    let reservation = service.get_reservation(&user, id).await?;
    Ok(Envelope::success().with("result", reservation.to_json()?))
}

async fn booking_webhook<R: IncubationRepository, P: PaymentGateway>(
    State(service): State<SharedService<R, P>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    let response = match service.handle_webhook(&body, signature).await? {
        WebhookOutcome::Created(reservation) => Envelope::success()
            .status(StatusCode::CREATED)
            .with("result", reservation.to_json()?)
            .into_response(),
        WebhookOutcome::Duplicate(reservation) => Envelope::success()
            .with("result", reservation.to_json()?)
            .into_response(),
        WebhookOutcome::Refunded {
            payment_intent,
            refund,
        } => Json(json!({
            "received": true,
            "refunded": { "paymentIntent": payment_intent, "refund": refund.id, "status": refund.status },
        }))
        .into_response(),
        WebhookOutcome::Ignored { .. } => Json(json!({ "received": true })).into_response(),
    };
    Ok(response)
}
