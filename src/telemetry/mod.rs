//! Routing telemetry.
//!
//! # SAFETY INVARIANT
//! Telemetry is a READ-ONLY side-effect layer. It is never read inside
//! routing, classification or extraction decisions.
//!
//! # PRIVACY INVARIANT
//! Events never contain user content (utterances, parameter values,
//! payloads). Only script ids, kinds, counts and status codes are allowed.

pub mod event;
pub mod metrics;
pub mod recorder;
