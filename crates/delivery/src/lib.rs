//! Outbound delivery of submitted segments to the collector endpoint.

pub mod client;

pub use client::{DeliveryClient, DeliveryRecord, DeliveryStatus};
