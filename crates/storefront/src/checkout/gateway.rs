//! Seam between the checkout flow and whatever accepts orders.

use std::future::Future;

use crate::backend::{BackendClient, BackendError, CheckoutRequest, PaymentConfirmation};

/// Accepts an order and says how payment continues.
pub trait PaymentGateway: Send + Sync {
    /// Send one order. Implementations must not retry.
    fn submit_order(
        &self,
        request: &CheckoutRequest,
    ) -> impl Future<Output = Result<PaymentConfirmation, BackendError>> + Send;
}

impl PaymentGateway for BackendClient {
    async fn submit_order(
        &self,
        request: &CheckoutRequest,
    ) -> Result<PaymentConfirmation, BackendError> {
        self.create_order(request).await
    }
}
