//! Pure checkout domain: fee schedule resolution and the buyer-facing
//! checkout form state machine. No IO lives here; the services layer feeds
//! these with authoritative data.

pub mod fees;
pub mod form;

pub use fees::{resolve_delivery_fee, DeliverySettings};
pub use form::{AreaOption, CheckoutForm, FormError, FormTotals, PaymentOption};
