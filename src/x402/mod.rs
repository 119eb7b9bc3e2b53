//! x402 payment protocol client for the noLimit paid endpoints
//!
//! The flow for every paid call:
//! 1. POST the request without payment
//! 2. On 402, parse the payment requirements from the challenge body
//! 3. Build the payment payload, sign it EIP-191 with the local wallet
//! 4. Retry once with the signed token in the X-Payment header
//!
//! An API key short-circuits all of this: the request goes out once with
//! X-API-Key and no payment is made.

mod authorizer;
mod client;
mod types;

pub use authorizer::PaymentAuthorizer;
pub use client::{Paid, X402Client};
pub use types::*;
