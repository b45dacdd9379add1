//! # Lens Types
//!
//! Shared types and traits for the API Lens gateway.
//! This crate provides common type definitions used across every
//! admission and metering crate, particularly to break circular
//! dependencies between the pipeline orchestrator and the components
//! it composes.
//!
//! ## Organization
//!
//! - `error`: Unified error type and the seven error kinds
//! - `secrets`: Secure secret handling with automatic Debug redaction
//! - `domain`: Shared vocabulary (tenant tier, pricing model, vendor tag)
//! - `cancellation`: Deadline + cooperative cancellation token
//! - `ports`: Backend-agnostic collaborator traits (K/V substrate, durable
//!   store, vendor proxy)

pub mod cancellation;
pub mod domain;
pub mod error;
pub mod ports;
pub mod secrets;

pub use domain::{PricingModel, Tier, VendorTag, WindowClass};
pub use error::{ErrorKind, LensError, Result};
