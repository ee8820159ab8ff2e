//! Client for the admin dashboard that receives orders and emergency
//! requests.
//!
//! Transient failures are retried with capped exponential back-off, and the
//! non-`try_` methods fall back to a synthesized local success so that a
//! dashboard outage never blocks the customer.

pub mod client;
pub mod error;
pub mod retry;
pub mod types;

pub use client::DashboardClient;
pub use error::DashboardError;
pub use retry::{backoff_delay, RetryPolicy};
pub use types::{
    CreateOrderRequest, DashboardResponse, EmergencyRequest, OrderLine, OrderStatus,
    UpdateOrderStatusRequest,
};
