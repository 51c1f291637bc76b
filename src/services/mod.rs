//! # Services Module
//!
//! Business logic services for margin account provisioning.

pub mod provisioner;

pub use provisioner::{ProvisionSettings, Provisioner};
