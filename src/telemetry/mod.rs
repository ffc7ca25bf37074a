//! Telemetry for gateway decisions.
//!
//! Components emit structured [`GatewayEvent`]s describing what they decided.
//! Events flow through `TelemetrySink` implementations which can log,
//! aggregate, or forward them to external systems.
//!
//! # Event Types
//!
//! - **Admission**: `Allowed`, `Rejected`
//! - **Cache**: `Hit`, `Miss`, `Coalesced`, `Stored`, `Swept`
//! - **Backend**: `Success`, `Failure`, `TimedOut`
//!
//! # Telemetry Sinks
//!
//! The `TelemetrySink` trait defines how events are consumed. It's implemented
//! as a `tower::Service<GatewayEvent>` for composability.

pub mod events;
pub mod sinks;

pub use events::{event_to_json, AdmissionEvent, BackendEvent, CacheEvent, GatewayEvent};
pub use sinks::{emit_best_effort, LogSink, MemorySink, NullSink, TelemetrySink};
