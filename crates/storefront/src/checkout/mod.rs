//! Checkout: form validation and order submission.
//!
//! A [`CheckoutFlow`] snapshots the cart and the shopper's details into one
//! [`CheckoutRequest`](crate::backend::CheckoutRequest), hands it to a
//! [`PaymentGateway`] and resolves to an inline confirmation, a redirect to a
//! hosted payment page, or a failure the shopper can retry.

mod flow;
mod form;
mod gateway;

pub use flow::{CheckoutFlow, CheckoutOutcome, CheckoutState};
pub use form::{CheckoutForm, CustomerDetails, FormError};
pub use gateway::PaymentGateway;
