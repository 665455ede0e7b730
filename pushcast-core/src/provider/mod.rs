//! Messaging providers: multicast delivery of one payload to many device tokens
//!
//! Delivery, retries and failure classification belong to the provider. This
//! module only turns a [`MulticastMessage`](crate::models::MulticastMessage)
//! into provider calls and reports one response per token.

mod credentials;
mod fcm;
mod lazy;
mod oauth;
mod sender;

pub use credentials::FcmCredentials;
pub use fcm::{FcmSender, MAX_MULTICAST_TOKENS};
pub use lazy::LazySender;
pub use oauth::{ServiceAccountKey, ServiceAccountTokens, FCM_SCOPE};
pub use sender::{MulticastSender, ProviderError};
