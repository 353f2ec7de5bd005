//! Incubation Service - nearby search, booking and payment confirmation
//!
//! A booking spans two requests connected only by the payment intent
//! metadata:
//!
//! ```text
//! AVAILABLE ──checkout──► PAYMENT_PENDING ──payment_intent.succeeded──► RESERVED
//! ```
//!
//! The `empty` flag only flips on the confirmed payment, through a
//! compare-and-set, so two confirmations for one incubation cannot both win.

use std::sync::Arc;

use api_features::{ListQuery, PageMetadata, QueryParams, json::to_json};
use axum_helpers::AuthUser;
use database::{RetryConfig, retry_with_backoff};
use mongodb::bson::{doc, oid::ObjectId};
use serde_json::Value;
use tracing::{error, info, instrument};
use validator::Validate;

use crate::error::{IncubationError, IncubationResult};
use crate::metadata::BookingMetadata;
use crate::models::{
    BookingCharge, BookingRequest, CURRENCY, CheckoutSession, IncubationReservation,
    NearHospitalsRequest, ReservationScope,
};
use crate::payments::{
    PaymentGateway, PaymentIntentObject, PaymentIntentRequest, Refund, WebhookVerifier,
};
use crate::repository::IncubationRepository;

/// A page of results with the total across all pages.
#[derive(Debug, Clone, PartialEq)]
pub struct CountedPage {
    pub total: u64,
    pub metadata: PageMetadata,
    pub result: Vec<Value>,
}

/// What a webhook delivery did.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookOutcome {
    /// First confirmation: reservation stored and incubation taken.
    Created(IncubationReservation),
    /// Redelivery of an already recorded payment.
    Duplicate(IncubationReservation),
    /// Paid for an incubation another payment already holds; the money went
    /// back to the customer.
    Refunded {
        payment_intent: String,
        refund: Refund,
    },
    /// Event type this service does not act on.
    Ignored { kind: String },
}

pub struct IncubationService<R: IncubationRepository, P: PaymentGateway> {
    repository: Arc<R>,
    payments: Arc<P>,
    webhooks: WebhookVerifier,
    reconcile_retry: RetryConfig,
}

impl<R: IncubationRepository, P: PaymentGateway> IncubationService<R, P> {
    pub fn new(repository: R, payments: P, webhooks: WebhookVerifier) -> Self {
        Self {
            repository: Arc::new(repository),
            payments: Arc::new(payments),
            webhooks,
            reconcile_retry: RetryConfig::default(),
        }
    }

    pub fn with_reconcile_retry(mut self, config: RetryConfig) -> Self {
        self.reconcile_retry = config;
        self
    }

    /// Hospitals with a free incubation within the requested radius, then
    /// narrowed and paged by the query string.
    #[instrument(skip(self, request, params), fields(long = request.long, lat = request.lat))]
    pub async fn near_hospitals(
        &self,
        request: NearHospitalsRequest,
        params: QueryParams,
    ) -> IncubationResult<CountedPage> {
        request.validate()?;
        let distance = request.distance();

        let ids = self
            .repository
            .near_hospital_ids(request.point(), distance)
            .await?;
        if ids.is_empty() {
            return Err(IncubationError::NoneNearby(distance));
        }

        let query = ListQuery::from_params(doc! { "_id": { "$in": ids } }, params);
        let documents = self.repository.list_hospitals(query.clone()).await?;
        if documents.is_empty() {
            return Err(IncubationError::NoneNearby(distance));
        }

        let total = self.repository.count_hospitals(query.conditions()).await?;
        Ok(CountedPage {
            total,
            metadata: query.metadata(total),
            result: documents.into_iter().map(to_json).collect(),
        })
    }

    /// Create the payment intent for a booking. Nothing is reserved yet.
    #[instrument(skip(self, request), fields(incubation_id = %request.incubation, user_id = %user))]
    pub async fn create_checkout_session(
        &self,
        user: ObjectId,
        request: BookingRequest,
    ) -> IncubationResult<CheckoutSession> {
        let incubation = self
            .repository
            .find_available_incubation(request.incubation)
            .await?
            .ok_or(IncubationError::IncubationUnavailable)?;

        let child = self
            .repository
            .find_owned_child(request.child, user)
            .await?
            .ok_or(IncubationError::ChildNotOwned)?;

        let hospital = self
            .repository
            .find_hospital(incubation.hospital)
            .await?
            .ok_or(IncubationError::HospitalNotFound)?;
        let destination = hospital
            .stripe_account_id
            .ok_or(IncubationError::PayoutAccountMissing)?;

        let charge = BookingCharge::for_price(incubation.price);
        let metadata = BookingMetadata {
            incubation: incubation.id,
            child: child.id,
            user,
            price: charge.price,
            fee: charge.fee,
        };

        let intent = self
            .payments
            .create_payment_intent(&PaymentIntentRequest {
                amount: charge.amount,
                currency: CURRENCY.to_string(),
                application_fee_amount: charge.application_fee_amount,
                destination,
                metadata: metadata.to_map(),
            })
            .await?;

        info!(payment_intent = %intent.id, amount = charge.amount, "Checkout session created");
        Ok(CheckoutSession {
            payment_intent: intent.id,
            client_secret: intent.client_secret,
        })
    }

    /// Verify and apply a processor webhook delivered as raw bytes.
    #[instrument(skip(self, payload, signature), fields(size = payload.len()))]
    pub async fn handle_webhook(
        &self,
        payload: &[u8],
        signature: Option<&str>,
    ) -> IncubationResult<WebhookOutcome> {
        let event = self.webhooks.construct_event(payload, signature)?;

        match event.succeeded_payment()? {
            Some(intent) => self.confirm_booking(&intent).await,
            None => {
                info!(event_id = %event.id, event_type = %event.kind, "Ignoring webhook event");
                Ok(WebhookOutcome::Ignored { kind: event.kind })
            }
        }
    }

    #[instrument(skip(self, intent), fields(payment_intent = %intent.id))]
    async fn confirm_booking(&self, intent: &PaymentIntentObject) -> IncubationResult<WebhookOutcome> {
        if let Some(existing) = self
            .repository
            .find_reservation_by_payment_intent(&intent.id)
            .await?
        {
            info!(reservation_id = %existing.id, "Payment already recorded");
            self.reconcile_hospital(existing.hospital).await;
            return Ok(WebhookOutcome::Duplicate(existing));
        }

        let metadata = BookingMetadata::from_map(&intent.metadata)?;

        // Claim before insert; a redelivery after a crash between the two
        // finds the claim under its own intent and carries on.
        let incubation = match self
            .repository
            .claim_incubation(metadata.incubation, &intent.id)
            .await?
        {
            Some(incubation) => incubation,
            None => return self.refund_lost_booking(intent, &metadata).await,
        };

        let reservation =
            IncubationReservation::confirmed(incubation.hospital, &metadata, intent.id.as_str());
        if let Err(e) = self.repository.insert_reservation(&reservation).await {
            if let Err(release_error) = self
                .repository
                .release_incubation(incubation.id, &intent.id)
                .await
            {
                error!(
                    incubation_id = %incubation.id,
                    error = %release_error,
                    "Failed to release incubation after reservation insert failed"
                );
            }
            return Err(e);
        }

        self.reconcile_hospital(incubation.hospital).await;
        Ok(WebhookOutcome::Created(reservation))
    }

    /// The incubation went to another payment (or no longer exists) after
    /// this one was captured. Refund it; on failure the error goes back to
    /// the processor so the delivery, and the refund, are retried.
    async fn refund_lost_booking(
        &self,
        intent: &PaymentIntentObject,
        metadata: &BookingMetadata,
    ) -> IncubationResult<WebhookOutcome> {
        error!(
            payment_intent = %intent.id,
            incubation_id = %metadata.incubation,
            user_id = %metadata.user,
            "Incubation already taken by another payment, refunding"
        );

        match self.payments.refund_payment_intent(&intent.id).await {
            Ok(refund) => {
                info!(refund_id = %refund.id, status = %refund.status, "Lost booking refunded");
                Ok(WebhookOutcome::Refunded {
                    payment_intent: intent.id.clone(),
                    refund,
                })
            }
            Err(e) => {
                error!(
                    payment_intent = %intent.id,
                    incubation_id = %metadata.incubation,
                    user_id = %metadata.user,
                    amount = metadata.price,
                    error = %e,
                    "Captured payment for a taken incubation could not be refunded"
                );
                Err(e)
            }
        }
    }

    /// Recount the hospital's empty incubations. A final failure is only
    /// logged; the next booking recounts again.
    async fn reconcile_hospital(&self, hospital: ObjectId) {
        let repository = &self.repository;
        let result = retry_with_backoff(
            || async move {
                let available = repository.count_empty_incubations(hospital).await?;
                repository
                    .set_available_incubations(hospital, available)
                    .await?;
                Ok::<_, IncubationError>(available)
            },
            self.reconcile_retry.clone(),
        )
        .await;

        match result {
            Ok(available) => {
                info!(hospital_id = %hospital, available, "Hospital availability updated")
            }
            Err(e) => {
                error!(hospital_id = %hospital, error = %e, "Failed to update hospital availability")
            }
        }
    }

    #[instrument(skip(self, user, params), fields(user_id = %user.id, role = %user.role))]
    pub async fn list_reservations(
        &self,
        user: &AuthUser,
        params: QueryParams,
    ) -> IncubationResult<CountedPage> {
        let scope = ReservationScope::for_user(user)?;
        let query = ListQuery::from_params(scope.filter(), params);

        let documents = self.repository.list_reservations(query.clone()).await?;
        if documents.is_empty() {
            return Err(IncubationError::NoReservations);
        }

        let total = self.repository.count_reservations(query.conditions()).await?;
        Ok(CountedPage {
            total,
            metadata: query.metadata(total),
            result: documents.into_iter().map(to_json).collect(),
        })
    }

    #[instrument(skip(self, user), fields(user_id = %user.id, role = %user.role))]
    pub async fn get_reservation(
        &self,
        user: &AuthUser,
        id: ObjectId,
    ) -> IncubationResult<IncubationReservation> {
        let scope = ReservationScope::for_user(user)?;
        self.repository
            .find_reservation(scope.with_id(id))
            .await?
            .ok_or(IncubationError::ReservationNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Child, GeoPoint, Hospital, Incubation};
    use crate::payments::{MockPaymentGateway, PaymentIntent, webhook};
    use crate::repository::MockIncubationRepository;
    use axum_helpers::Role;
    use mockall::predicate::eq;
    use serde_json::json;

    const SECRET: &str = "whsec_test";

    struct Fixture {
        hospital: ObjectId,
        user: ObjectId,
        incubation: Incubation,
        child: Child,
    }

    impl Fixture {
        fn new() -> Self {
            let hospital = ObjectId::new();
            let user = ObjectId::new();
            Self {
                hospital,
                user,
                incubation: Incubation::new(hospital, 1000.0),
                child: Child {
                    id: ObjectId::new(),
                    user,
                    name: "Mariam".to_string(),
                },
            }
        }

        fn hospital(&self, payout: Option<&str>) -> Hospital {
            Hospital {
                id: self.hospital,
                name: "Cairo Children's Hospital".to_string(),
                stripe_account_id: payout.map(str::to_string),
                location: GeoPoint::new(31.2, 30.0),
                available_incubations: 1,
            }
        }

        fn request(&self) -> BookingRequest {
            BookingRequest {
                incubation: self.incubation.id,
                child: self.child.id,
            }
        }

        fn metadata(&self) -> BookingMetadata {
            BookingMetadata {
                incubation: self.incubation.id,
                child: self.child.id,
                user: self.user,
                price: 1000.0,
                fee: 50.0,
            }
        }

        fn claimed(&self, payment_intent: &str) -> Incubation {
            Incubation {
                empty: false,
                reserved_by: Some(payment_intent.to_string()),
                ..self.incubation.clone()
            }
        }
    }

    fn service(
        repo: MockIncubationRepository,
        payments: MockPaymentGateway,
    ) -> IncubationService<MockIncubationRepository, MockPaymentGateway> {
        IncubationService::new(repo, payments, WebhookVerifier::new(SECRET)).with_reconcile_retry(
            RetryConfig::new()
                .with_max_retries(2)
                .with_initial_delay(1)
                .without_jitter(),
        )
    }

    fn signed_event(kind: &str, intent_id: &str, metadata: &BookingMetadata) -> (Vec<u8>, String) {
        let body = serde_json::to_vec(&json!({
            "id": "evt_1",
            "type": kind,
            "data": { "object": { "id": intent_id, "metadata": metadata.to_map() } }
        }))
        .unwrap();
        let header = webhook::sign(&body, SECRET, chrono::Utc::now().timestamp()).unwrap();
        (body, header)
    }

    fn expect_reconcile(repo: &mut MockIncubationRepository, hospital: ObjectId, available: u64) {
        repo.expect_count_empty_incubations()
            .with(eq(hospital))
            .returning(move |_| Ok(available));
        repo.expect_set_available_incubations()
            .with(eq(hospital), eq(available))
            .times(1)
            .returning(|_, _| Ok(()));
    }

    #[tokio::test]
    async fn test_checkout_charges_price_with_platform_fee() {
        let fx = Fixture::new();
        let mut repo = MockIncubationRepository::new();
        let incubation = fx.incubation.clone();
        repo.expect_find_available_incubation()
            .with(eq(fx.incubation.id))
            .returning(move |_| Ok(Some(incubation.clone())));
        let child = fx.child.clone();
        repo.expect_find_owned_child()
            .with(eq(fx.child.id), eq(fx.user))
            .returning(move |_, _| Ok(Some(child.clone())));
        let hospital = fx.hospital(Some("acct_hospital"));
        repo.expect_find_hospital()
            .returning(move |_| Ok(Some(hospital.clone())));

        let expected_metadata = fx.metadata().to_map();
        let mut payments = MockPaymentGateway::new();
        payments
            .expect_create_payment_intent()
            .withf(move |request| {
                request.amount == 100_000
                    && request.application_fee_amount == 5_000
                    && request.currency == "egp"
                    && request.destination == "acct_hospital"
                    && request.metadata == expected_metadata
            })
            .times(1)
            .returning(|_| {
                Ok(PaymentIntent {
                    id: "pi_1".to_string(),
                    client_secret: "pi_1_secret".to_string(),
                })
            });

        let session = service(repo, payments)
            .create_checkout_session(fx.user, fx.request())
            .await
            .unwrap();
        assert_eq!(session.client_secret, "pi_1_secret");
    }

    #[tokio::test]
    async fn test_checkout_rejects_taken_incubation_before_child_check() {
        let fx = Fixture::new();
        let mut repo = MockIncubationRepository::new();
        repo.expect_find_available_incubation().returning(|_| Ok(None));
        repo.expect_find_owned_child().never();
        let mut payments = MockPaymentGateway::new();
        payments.expect_create_payment_intent().never();

        let err = service(repo, payments)
            .create_checkout_session(fx.user, fx.request())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Incubation isn't empty or not found");
    }

    #[tokio::test]
    async fn test_checkout_rejects_foreign_child() {
        let fx = Fixture::new();
        let mut repo = MockIncubationRepository::new();
        let incubation = fx.incubation.clone();
        repo.expect_find_available_incubation()
            .returning(move |_| Ok(Some(incubation.clone())));
        repo.expect_find_owned_child().returning(|_, _| Ok(None));
        let mut payments = MockPaymentGateway::new();
        payments.expect_create_payment_intent().never();

        let err = service(repo, payments)
            .create_checkout_session(fx.user, fx.request())
            .await
            .unwrap_err();
        assert!(matches!(err, IncubationError::ChildNotOwned));
    }

    #[tokio::test]
    async fn test_checkout_needs_hospital_payout_account() {
        let fx = Fixture::new();
        let mut repo = MockIncubationRepository::new();
        let incubation = fx.incubation.clone();
        repo.expect_find_available_incubation()
            .returning(move |_| Ok(Some(incubation.clone())));
        let child = fx.child.clone();
        repo.expect_find_owned_child()
            .returning(move |_, _| Ok(Some(child.clone())));
        let hospital = fx.hospital(None);
        repo.expect_find_hospital()
            .returning(move |_| Ok(Some(hospital.clone())));

        let err = service(repo, MockPaymentGateway::new())
            .create_checkout_session(fx.user, fx.request())
            .await
            .unwrap_err();
        assert!(matches!(err, IncubationError::PayoutAccountMissing));
    }

    #[tokio::test]
    async fn test_webhook_with_bad_signature_changes_nothing() {
        let fx = Fixture::new();
        let (body, _) = signed_event("payment_intent.succeeded", "pi_1", &fx.metadata());
        let forged = webhook::sign(&body, "not_the_secret", chrono::Utc::now().timestamp()).unwrap();

        let mut repo = MockIncubationRepository::new();
        repo.expect_find_reservation_by_payment_intent().never();
        repo.expect_claim_incubation().never();

        let err = service(repo, MockPaymentGateway::new())
            .handle_webhook(&body, Some(&forged))
            .await
            .unwrap_err();
        assert!(matches!(err, IncubationError::InvalidSignature(_)));
    }

    #[tokio::test]
    async fn test_webhook_ignores_other_events() {
        let fx = Fixture::new();
        let (body, header) = signed_event("payment_intent.created", "pi_1", &fx.metadata());

        let mut repo = MockIncubationRepository::new();
        repo.expect_claim_incubation().never();

        let outcome = service(repo, MockPaymentGateway::new())
            .handle_webhook(&body, Some(&header))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            WebhookOutcome::Ignored {
                kind: "payment_intent.created".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_webhook_confirms_booking_and_recounts_hospital() {
        let fx = Fixture::new();
        let (body, header) = signed_event("payment_intent.succeeded", "pi_1", &fx.metadata());

        let mut repo = MockIncubationRepository::new();
        repo.expect_find_reservation_by_payment_intent()
            .withf(|id| id == "pi_1")
            .returning(|_| Ok(None));
        let claimed = fx.claimed("pi_1");
        let incubation_id = fx.incubation.id;
        repo.expect_claim_incubation()
            .withf(move |id, intent| *id == incubation_id && intent == "pi_1")
            .times(1)
            .returning(move |_, _| Ok(Some(claimed.clone())));
        let (hospital, user, child) = (fx.hospital, fx.user, fx.child.id);
        repo.expect_insert_reservation()
            .withf(move |r| {
                r.hospital == hospital
                    && r.user == user
                    && r.child == child
                    && r.payment_intent == "pi_1"
                    && r.fee == 50.0
            })
            .times(1)
            .returning(|_| Ok(()));
        expect_reconcile(&mut repo, fx.hospital, 0);

        let outcome = service(repo, MockPaymentGateway::new())
            .handle_webhook(&body, Some(&header))
            .await
            .unwrap();
        match outcome {
            WebhookOutcome::Created(reservation) => {
                assert_eq!(reservation.incubation, fx.incubation.id)
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_webhook_redelivery_is_idempotent() {
        let fx = Fixture::new();
        let (body, header) = signed_event("payment_intent.succeeded", "pi_1", &fx.metadata());
        let existing = IncubationReservation::confirmed(fx.hospital, &fx.metadata(), "pi_1");

        let mut repo = MockIncubationRepository::new();
        let stored = existing.clone();
        repo.expect_find_reservation_by_payment_intent()
            .returning(move |_| Ok(Some(stored.clone())));
        repo.expect_claim_incubation().never();
        repo.expect_insert_reservation().never();
        expect_reconcile(&mut repo, fx.hospital, 0);

        let outcome = service(repo, MockPaymentGateway::new())
            .handle_webhook(&body, Some(&header))
            .await
            .unwrap();
        assert_eq!(outcome, WebhookOutcome::Duplicate(existing));
    }

    #[tokio::test]
    async fn test_redelivery_after_crash_resumes_own_claim() {
        // The first delivery claimed the incubation but died before storing
        // the reservation, so the claim is still held by pi_1.
        let fx = Fixture::new();
        let (body, header) = signed_event("payment_intent.succeeded", "pi_1", &fx.metadata());

        let mut repo = MockIncubationRepository::new();
        repo.expect_find_reservation_by_payment_intent()
            .returning(|_| Ok(None));
        let held = fx.claimed("pi_1");
        repo.expect_claim_incubation()
            .withf(|_, intent| intent == "pi_1")
            .times(1)
            .returning(move |_, _| Ok(Some(held.clone())));
        repo.expect_insert_reservation()
            .withf(|r| r.payment_intent == "pi_1")
            .times(1)
            .returning(|_| Ok(()));
        expect_reconcile(&mut repo, fx.hospital, 0);
        let mut payments = MockPaymentGateway::new();
        payments.expect_refund_payment_intent().never();

        let outcome = service(repo, payments)
            .handle_webhook(&body, Some(&header))
            .await
            .unwrap();
        assert!(matches!(outcome, WebhookOutcome::Created(_)));
    }

    #[tokio::test]
    async fn test_payment_for_taken_incubation_is_refunded() {
        let fx = Fixture::new();
        let (body, header) = signed_event("payment_intent.succeeded", "pi_2", &fx.metadata());

        let mut repo = MockIncubationRepository::new();
        repo.expect_find_reservation_by_payment_intent()
            .returning(|_| Ok(None));
        repo.expect_claim_incubation().returning(|_, _| Ok(None));
        repo.expect_insert_reservation().never();
        let mut payments = MockPaymentGateway::new();
        payments
            .expect_refund_payment_intent()
            .withf(|intent| intent == "pi_2")
            .times(1)
            .returning(|_| {
                Ok(Refund {
                    id: "re_1".to_string(),
                    status: "succeeded".to_string(),
                })
            });

        let outcome = service(repo, payments)
            .handle_webhook(&body, Some(&header))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            WebhookOutcome::Refunded {
                payment_intent: "pi_2".to_string(),
                refund: Refund {
                    id: "re_1".to_string(),
                    status: "succeeded".to_string(),
                },
            }
        );
    }

    #[tokio::test]
    async fn test_failed_refund_is_returned_for_redelivery() {
        let fx = Fixture::new();
        let (body, header) = signed_event("payment_intent.succeeded", "pi_2", &fx.metadata());

        let mut repo = MockIncubationRepository::new();
        repo.expect_find_reservation_by_payment_intent()
            .returning(|_| Ok(None));
        repo.expect_claim_incubation().returning(|_, _| Ok(None));
        let mut payments = MockPaymentGateway::new();
        payments
            .expect_refund_payment_intent()
            .returning(|_| Err(IncubationError::PaymentGateway("timed out".to_string())));

        let err = service(repo, payments)
            .handle_webhook(&body, Some(&header))
            .await
            .unwrap_err();
        assert!(matches!(err, IncubationError::PaymentGateway(_)));
    }

    #[tokio::test]
    async fn test_failed_insert_releases_claim() {
        let fx = Fixture::new();
        let (body, header) = signed_event("payment_intent.succeeded", "pi_1", &fx.metadata());

        let mut repo = MockIncubationRepository::new();
        repo.expect_find_reservation_by_payment_intent()
            .returning(|_| Ok(None));
        let claimed = fx.claimed("pi_1");
        repo.expect_claim_incubation()
            .returning(move |_, _| Ok(Some(claimed.clone())));
        repo.expect_insert_reservation()
            .returning(|_| Err(IncubationError::Internal("write failed".to_string())));
        let incubation_id = fx.incubation.id;
        repo.expect_release_incubation()
            .withf(move |id, intent| *id == incubation_id && intent == "pi_1")
            .times(1)
            .returning(|_, _| Ok(()));
        repo.expect_count_empty_incubations().never();

        let err = service(repo, MockPaymentGateway::new())
            .handle_webhook(&body, Some(&header))
            .await
            .unwrap_err();
        assert!(matches!(err, IncubationError::Internal(_)));
    }

    #[tokio::test]
    async fn test_reconcile_failure_does_not_fail_confirmation() {
        let fx = Fixture::new();
        let (body, header) = signed_event("payment_intent.succeeded", "pi_1", &fx.metadata());

        let mut repo = MockIncubationRepository::new();
        repo.expect_find_reservation_by_payment_intent()
            .returning(|_| Ok(None));
        let claimed = fx.claimed("pi_1");
        repo.expect_claim_incubation()
            .returning(move |_, _| Ok(Some(claimed.clone())));
        repo.expect_insert_reservation().returning(|_| Ok(()));
        // One attempt plus two retries.
        repo.expect_count_empty_incubations()
            .times(3)
            .returning(|_| Err(IncubationError::Internal("primary stepped down".to_string())));

        let outcome = service(repo, MockPaymentGateway::new())
            .handle_webhook(&body, Some(&header))
            .await
            .unwrap();
        assert!(matches!(outcome, WebhookOutcome::Created(_)));
    }

    #[tokio::test]
    async fn test_webhook_with_invalid_metadata_changes_nothing() {
        let fx = Fixture::new();
        let body = serde_json::to_vec(&json!({
            "id": "evt_1",
            "type": "payment_intent.succeeded",
            "data": { "object": { "id": "pi_1", "metadata": { "incubation": fx.incubation.id.to_hex() } } }
        }))
        .unwrap();
        let header = webhook::sign(&body, SECRET, chrono::Utc::now().timestamp()).unwrap();

        let mut repo = MockIncubationRepository::new();
        repo.expect_find_reservation_by_payment_intent()
            .returning(|_| Ok(None));
        repo.expect_claim_incubation().never();

        let err = service(repo, MockPaymentGateway::new())
            .handle_webhook(&body, Some(&header))
            .await
            .unwrap_err();
        assert!(matches!(err, IncubationError::InvalidMetadata(_)));
    }

    #[tokio::test]
    async fn test_near_hospitals_reports_radius_when_empty() {
        let mut repo = MockIncubationRepository::new();
        repo.expect_near_hospital_ids()
            .withf(|_, distance| *distance == 10_000.0)
            .returning(|_, _| Ok(vec![]));
        repo.expect_list_hospitals().never();

        let request = NearHospitalsRequest {
            long: 31.2,
            lat: 30.0,
            distance: None,
        };
        let err = service(repo, MockPaymentGateway::new())
            .near_hospitals(request, QueryParams::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "No Incubation Available within 10000 meters");
    }

    #[tokio::test]
    async fn test_near_hospitals_pages_the_identity_set() {
        let ids = vec![ObjectId::new(), ObjectId::new()];
        let mut repo = MockIncubationRepository::new();
        let found = ids.clone();
        repo.expect_near_hospital_ids()
            .returning(move |_, _| Ok(found.clone()));
        let scoped = ids.clone();
        repo.expect_list_hospitals()
            .withf(move |query| {
                query.conditions() == doc! { "$and": [ { "_id": { "$in": scoped.clone() } }, { "name": "Nile" } ] }
            })
            .returning(|_| Ok(vec![doc! { "name": "Nile" }]));
        repo.expect_count_hospitals().returning(|_| Ok(1));

        let request = NearHospitalsRequest {
            long: 31.2,
            lat: 30.0,
            distance: Some(2500.0),
        };
        let page = service(repo, MockPaymentGateway::new())
            .near_hospitals(request, QueryParams::from_pairs([("name", "Nile")]))
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.metadata, PageMetadata { total: 1, pages: 1 });
        assert_eq!(page.result, vec![json!({ "name": "Nile" })]);
    }

    #[tokio::test]
    async fn test_reservations_are_scoped_to_the_caller() {
        let user = AuthUser::new(ObjectId::new(), Role::User);
        let mut repo = MockIncubationRepository::new();
        let owner = user.id;
        repo.expect_list_reservations()
            .withf(move |query| query.conditions() == doc! { "user": owner })
            .returning(|_| Ok(vec![doc! { "price": 1000.0 }]));
        repo.expect_count_reservations()
            .with(eq(doc! { "user": owner }))
            .returning(|_| Ok(26));

        let page = service(repo, MockPaymentGateway::new())
            .list_reservations(&user, QueryParams::default())
            .await
            .unwrap();
        assert_eq!(page.total, 26);
        assert_eq!(page.metadata.pages, 2);
    }

    #[tokio::test]
    async fn test_doctors_cannot_list_reservations() {
        let doctor = AuthUser::new(ObjectId::new(), Role::Doctor);
        let mut repo = MockIncubationRepository::new();
        repo.expect_list_reservations().never();

        let err = service(repo, MockPaymentGateway::new())
            .list_reservations(&doctor, QueryParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, IncubationError::RoleNotAllowed(Role::Doctor)));
    }

    #[tokio::test]
    async fn test_empty_reservation_list_is_not_found() {
        let admin = AuthUser::new(ObjectId::new(), Role::Admin);
        let mut repo = MockIncubationRepository::new();
        repo.expect_list_reservations().returning(|_| Ok(vec![]));

        let err = service(repo, MockPaymentGateway::new())
            .list_reservations(&admin, QueryParams::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Not Incubation Reservations added yet");
    }

    #[tokio::test]
    async fn test_hospital_only_sees_its_own_reservation() {
        let hospital = AuthUser::new(ObjectId::new(), Role::Hospital);
        let id = ObjectId::new();
        let mut repo = MockIncubationRepository::new();
        let owner = hospital.id;
        repo.expect_find_reservation()
            .with(eq(doc! { "hospital": owner, "_id": id }))
            .returning(|_| Ok(None));

        let err = service(repo, MockPaymentGateway::new())
            .get_reservation(&hospital, id)
            .await
            .unwrap_err();
        assert!(matches!(err, IncubationError::ReservationNotFound));
    }
}
