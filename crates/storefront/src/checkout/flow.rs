//! Checkout state machine.
//!
//! ```text
//! Editing ──submit──▶ Submitting ──▶ SucceededInline
//!    ▲                    │      └─▶ SucceededRedirect(url)
//!    └──── Failed(msg) ◀──┘
//! ```
//!
//! A failed submission leaves the form editable and can be submitted again.
//! The two success states are terminal and empty the cart.

use petal_core::CurrencyCode;
use rust_decimal::Decimal;
use tracing::instrument;
use url::Url;

use crate::backend::{CheckoutRequest, OrderLine, PaymentConfirmation};
use crate::cart::{CartStorage, CartStore};
use crate::checkout::form::{CheckoutForm, FormError};
use crate::checkout::gateway::PaymentGateway;
use crate::config::CheckoutConfig;

/// Where the checkout currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutState {
    Editing,
    Submitting,
    SucceededInline,
    SucceededRedirect(Url),
    Failed(String),
}

/// Result of a checkout as seen by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    /// Not submitted yet, or a submit attempt was refused.
    Pending,
    SucceededInline,
    SucceededRedirect(Url),
    Failed(String),
}

/// One checkout attempt: the shopper's form plus the submission state.
#[derive(Debug, Clone)]
pub struct CheckoutFlow {
    form: CheckoutForm,
    state: CheckoutState,
    shipping: Decimal,
    currency: CurrencyCode,
}

impl CheckoutFlow {
    /// Fresh checkout with the configured default country pre-filled.
    #[must_use]
    pub fn new(config: &CheckoutConfig) -> Self {
        Self::with_form(config, CheckoutForm::with_country(&config.default_country))
    }

    /// Checkout for an already filled-in form.
    #[must_use]
    pub fn with_form(config: &CheckoutConfig, form: CheckoutForm) -> Self {
        Self {
            form,
            state: CheckoutState::Editing,
            shipping: config.shipping_cost,
            currency: config.currency,
        }
    }

    // =========================================================================
    // State
    // =========================================================================

    #[must_use]
    pub const fn state(&self) -> &CheckoutState {
        &self.state
    }

    #[must_use]
    pub fn outcome(&self) -> CheckoutOutcome {
        match &self.state {
            CheckoutState::Editing | CheckoutState::Submitting => CheckoutOutcome::Pending,
            CheckoutState::SucceededInline => CheckoutOutcome::SucceededInline,
            CheckoutState::SucceededRedirect(url) => CheckoutOutcome::SucceededRedirect(url.clone()),
            CheckoutState::Failed(message) => CheckoutOutcome::Failed(message.clone()),
        }
    }

    #[must_use]
    pub const fn form(&self) -> &CheckoutForm {
        &self.form
    }

    /// Mutable access to the fields while the form is editable.
    pub const fn form_mut(&mut self) -> Option<&mut CheckoutForm> {
        if self.is_editable() {
            Some(&mut self.form)
        } else {
            None
        }
    }

    /// Editing, or failed and waiting for another try.
    #[must_use]
    pub const fn is_editable(&self) -> bool {
        matches!(self.state, CheckoutState::Editing | CheckoutState::Failed(_))
    }

    /// Closing the checkout is refused while a request is in flight.
    #[must_use]
    pub const fn can_close(&self) -> bool {
        !matches!(self.state, CheckoutState::Submitting)
    }

    /// Whether [`Self::submit`] would send a request for this cart.
    #[must_use]
    pub fn can_submit<S: CartStorage>(&self, cart: &CartStore<S>) -> bool {
        self.is_editable() && !cart.is_empty() && self.form.is_complete()
    }

    // =========================================================================
    // Totals
    // =========================================================================

    #[must_use]
    pub const fn shipping(&self) -> Decimal {
        self.shipping
    }

    #[must_use]
    pub const fn currency(&self) -> CurrencyCode {
        self.currency
    }

    /// Cart subtotal plus shipping.
    #[must_use]
    pub fn grand_total<S: CartStorage>(&self, cart: &CartStore<S>) -> Decimal {
        cart.total() + self.shipping
    }

    /// Snapshot the cart and form into an order request.
    ///
    /// # Errors
    ///
    /// Returns the first form validation problem.
    pub fn build_request<S: CartStorage>(
        &self,
        cart: &CartStore<S>,
    ) -> Result<CheckoutRequest, FormError> {
        let customer = self.form.validate()?;

        Ok(CheckoutRequest {
            name: customer.name,
            email: customer.email,
            address: customer.address,
            city: customer.city,
            zip: customer.zip,
            country: customer.country,
            order_details: cart
                .lines()
                .iter()
                .map(|line| OrderLine {
                    id: line.id.clone(),
                    quantity: line.quantity,
                    price: line.price,
                    name: line.name.clone(),
                })
                .collect(),
            total_amount: self.grand_total(cart),
            currency: self.currency,
        })
    }

    // =========================================================================
    // Submission
    // =========================================================================

    /// Submit the order once.
    ///
    /// Does nothing (no request, state unchanged) unless the form is editable,
    /// complete and the cart has items. On success the cart is emptied before
    /// the outcome is recorded, so a redirect never leaves a stale cart
    /// behind. Errors become [`CheckoutOutcome::Failed`] with a message fit
    /// for the shopper.
    #[instrument(skip_all, fields(lines = cart.len()))]
    pub async fn submit<S, G>(&mut self, cart: &mut CartStore<S>, gateway: &G) -> CheckoutOutcome
    where
        S: CartStorage,
        G: PaymentGateway,
    {
        if !self.is_editable() || cart.is_empty() {
            tracing::debug!(state = ?self.state, "Checkout submit ignored");
            return self.outcome();
        }
        let request = match self.build_request(cart) {
            Ok(request) => request,
            Err(e) => {
                tracing::debug!(error = %e, "Checkout form incomplete");
                return self.outcome();
            }
        };

        self.state = CheckoutState::Submitting;

        self.state = match gateway.submit_order(&request).await {
            Ok(confirmation) => {
                if let Err(e) = cart.clear().await {
                    tracing::warn!(error = %e, "Order accepted but clearing the cart failed; retrying");
                    if let Err(e) = cart.persist().await {
                        tracing::error!(
                            error = %e,
                            "Order accepted but the emptied cart could not be saved; persisted cart may be stale"
                        );
                    }
                }
                match confirmation {
                    PaymentConfirmation::Inline => CheckoutState::SucceededInline,
                    PaymentConfirmation::Redirect(url) => CheckoutState::SucceededRedirect(url),
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Checkout failed");
                CheckoutState::Failed(e.user_message())
            }
        };

        self.outcome()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use petal_core::ProductId;

    use super::*;
    use crate::backend::BackendError;
    use crate::cart::events::drain;
    use crate::cart::{CartEvent, MemoryCartStorage, NewCartItem, StorageError};

    /// Gateway returning canned answers and recording what it was sent.
    struct FakeGateway {
        answer: Mutex<Option<Result<PaymentConfirmation, BackendError>>>,
        calls: AtomicUsize,
        last_request: Mutex<Option<CheckoutRequest>>,
    }

    impl FakeGateway {
        fn answering(answer: Result<PaymentConfirmation, BackendError>) -> Self {
            Self {
                answer: Mutex::new(Some(answer)),
                calls: AtomicUsize::new(0),
                last_request: Mutex::new(None),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl PaymentGateway for FakeGateway {
        async fn submit_order(
            &self,
            request: &CheckoutRequest,
        ) -> Result<PaymentConfirmation, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().unwrap() = Some(request.clone());
            self.answer
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Err(BackendError::Rejected("no more answers".to_string())))
        }
    }

    fn form() -> CheckoutForm {
        CheckoutForm {
            name: "Ada Obi".to_string(),
            email: "ada@example.com".to_string(),
            address: "1 Marina Rd".to_string(),
            city: "Lagos".to_string(),
            zip: "100001".to_string(),
            country: "NG".to_string(),
        }
    }

    async fn cart_with_items() -> CartStore<MemoryCartStorage> {
        let mut cart = CartStore::load(MemoryCartStorage::new()).await;
        for (id, price) in [("a", 10), ("a", 10), ("b", 5)] {
            cart.add_item(NewCartItem {
                id: ProductId::new(id),
                name: format!("Product {id}"),
                price: Decimal::from(price),
                image: String::new(),
            })
            .await
            .unwrap();
        }
        cart
    }

    #[tokio::test]
    async fn test_grand_total_adds_shipping() {
        let cart = cart_with_items().await;
        let flow = CheckoutFlow::with_form(&CheckoutConfig::default(), form());
        assert_eq!(cart.total(), Decimal::new(2500, 2));
        assert_eq!(flow.grand_total(&cart), Decimal::new(4000, 2));

        let request = flow.build_request(&cart).unwrap();
        assert_eq!(request.total_amount, Decimal::from(40));
        assert_eq!(request.order_details.len(), 2);
        assert_eq!(request.order_details[0].quantity, 2);
        assert_eq!(request.currency, CurrencyCode::USD);
    }

    #[tokio::test]
    async fn test_empty_cart_submit_has_no_effect() {
        let mut cart = CartStore::load(MemoryCartStorage::new()).await;
        let gateway = FakeGateway::answering(Ok(PaymentConfirmation::Inline));
        let mut flow = CheckoutFlow::with_form(&CheckoutConfig::default(), form());

        assert!(!flow.can_submit(&cart));
        let outcome = flow.submit(&mut cart, &gateway).await;

        assert_eq!(outcome, CheckoutOutcome::Pending);
        assert_eq!(flow.state(), &CheckoutState::Editing);
        assert_eq!(gateway.calls(), 0);
    }

    #[tokio::test]
    async fn test_incomplete_form_submit_has_no_effect() {
        let mut cart = cart_with_items().await;
        let gateway = FakeGateway::answering(Ok(PaymentConfirmation::Inline));
        let mut flow = CheckoutFlow::new(&CheckoutConfig::default());

        assert!(!flow.can_submit(&cart));
        assert_eq!(flow.submit(&mut cart, &gateway).await, CheckoutOutcome::Pending);
        assert_eq!(gateway.calls(), 0);
        assert_eq!(cart.len(), 2);
    }

    #[tokio::test]
    async fn test_rejection_keeps_cart_and_allows_retry() {
        let mut cart = cart_with_items().await;
        let gateway =
            FakeGateway::answering(Err(BackendError::Rejected("card declined".to_string())));
        let mut flow = CheckoutFlow::with_form(&CheckoutConfig::default(), form());

        let outcome = flow.submit(&mut cart, &gateway).await;

        assert_eq!(outcome, CheckoutOutcome::Failed("card declined".to_string()));
        assert_eq!(cart.len(), 2);
        assert!(flow.is_editable());
        assert!(flow.can_close());
        assert!(flow.form_mut().is_some());
        assert!(flow.can_submit(&cart));
    }

    #[tokio::test]
    async fn test_redirect_clears_cart() {
        let mut cart = cart_with_items().await;
        let target = Url::parse("https://pay.example/abc").unwrap();
        let gateway = FakeGateway::answering(Ok(PaymentConfirmation::Redirect(target.clone())));
        let mut flow = CheckoutFlow::with_form(&CheckoutConfig::default(), form());

        let outcome = flow.submit(&mut cart, &gateway).await;

        assert_eq!(outcome, CheckoutOutcome::SucceededRedirect(target));
        assert!(cart.is_empty());
        assert_eq!(cart.storage().payload().await.as_deref(), Some("[]"));
        assert!(!flow.is_editable());
        assert!(flow.form_mut().is_none());

        let sent = gateway.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(sent.total_amount, Decimal::from(40));
    }

    #[tokio::test]
    async fn test_inline_success_clears_cart_and_is_terminal() {
        let mut cart = cart_with_items().await;
        let gateway = FakeGateway::answering(Ok(PaymentConfirmation::Inline));
        let mut flow = CheckoutFlow::with_form(&CheckoutConfig::default(), form());

        assert_eq!(
            flow.submit(&mut cart, &gateway).await,
            CheckoutOutcome::SucceededInline
        );
        assert!(cart.is_empty());

        // Terminal: a second submit sends nothing
        flow.submit(&mut cart, &gateway).await;
        assert_eq!(gateway.calls(), 1);
        assert_eq!(flow.state(), &CheckoutState::SucceededInline);
    }

    /// Storage whose first `fail_first` writes fail.
    #[derive(Clone, Default)]
    struct FlakyStorage {
        inner: MemoryCartStorage,
        fail_first: Arc<AtomicUsize>,
        saves: Arc<AtomicUsize>,
    }

    impl CartStorage for FlakyStorage {
        async fn load(&self) -> Result<Option<String>, StorageError> {
            self.inner.load().await
        }

        async fn save(&self, payload: String) -> Result<(), StorageError> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            let remaining = self.fail_first.load(Ordering::SeqCst);
            if remaining > 0 {
                self.fail_first.store(remaining - 1, Ordering::SeqCst);
                return Err(std::io::Error::other("session store unavailable").into());
            }
            self.inner.save(payload).await
        }
    }

    async fn flaky_cart_with_item(storage: &FlakyStorage) -> CartStore<FlakyStorage> {
        let mut cart = CartStore::load(storage.clone()).await;
        cart.add_item(NewCartItem {
            id: ProductId::new("a"),
            name: "Product a".to_string(),
            price: Decimal::from(10),
            image: String::new(),
        })
        .await
        .unwrap();
        cart
    }

    #[tokio::test]
    async fn test_failed_clear_is_retried_once() {
        let storage = FlakyStorage::default();
        let mut cart = flaky_cart_with_item(&storage).await;
        let mut events = cart.subscribe();
        storage.fail_first.store(1, Ordering::SeqCst);
        let saves_before = storage.saves.load(Ordering::SeqCst);

        let gateway = FakeGateway::answering(Ok(PaymentConfirmation::Inline));
        let mut flow = CheckoutFlow::with_form(&CheckoutConfig::default(), form());

        assert_eq!(
            flow.submit(&mut cart, &gateway).await,
            CheckoutOutcome::SucceededInline
        );
        assert!(cart.is_empty());
        assert_eq!(storage.saves.load(Ordering::SeqCst) - saves_before, 2);
        assert_eq!(storage.inner.payload().await.as_deref(), Some("[]"));
        assert_eq!(drain(&mut events), vec![CartEvent::Cleared]);
    }

    #[tokio::test]
    async fn test_order_succeeds_even_if_cart_cannot_be_saved() {
        let storage = FlakyStorage::default();
        let mut cart = flaky_cart_with_item(&storage).await;
        storage.fail_first.store(usize::MAX, Ordering::SeqCst);

        let target = Url::parse("https://pay.example/abc").unwrap();
        let gateway = FakeGateway::answering(Ok(PaymentConfirmation::Redirect(target.clone())));
        let mut flow = CheckoutFlow::with_form(&CheckoutConfig::default(), form());

        assert_eq!(
            flow.submit(&mut cart, &gateway).await,
            CheckoutOutcome::SucceededRedirect(target)
        );
        assert!(cart.is_empty());
        assert_eq!(gateway.calls(), 1);
        // The stored copy still holds the pre-order line
        let stored = storage.inner.payload().await.unwrap();
        assert!(stored.contains("\"a\""), "{stored}");
    }

    #[tokio::test]
    async fn test_transport_style_failures_use_fixed_messages() {
        let mut cart = cart_with_items().await;
        let gateway = FakeGateway::answering(Err(BackendError::NotConfigured));
        let mut flow = CheckoutFlow::with_form(&CheckoutConfig::default(), form());

        let CheckoutOutcome::Failed(message) = flow.submit(&mut cart, &gateway).await else {
            panic!("expected failure");
        };
        assert_eq!(message, BackendError::NotConfigured.user_message());
        assert_eq!(cart.len(), 2);
    }
}
