//! Hardware Abstraction Layer (HAL) - Timer and Capture classes
//!
//! This module defines the peripheral-class contracts and the machinery
//! that routes class API calls to concrete drivers.
//!
//! # Building Blocks
//!
//! - [`registry`]: index-addressed, build-time device registries
//! - [`instance`]: header embedded in every driver instance, generic init
//! - [`lock`]: build-selected per-instance serialisation
//! - [`callback`]: interrupt-context callback contract
//! - [`error`]: status codes shared by all classes
//!
//! # Peripheral Classes
//!
//! - [`timer`]: one-shot / periodic hardware timers
//! - [`capture`]: edge timestamping

pub mod callback;
pub mod capture;
pub mod error;
pub mod instance;
pub mod lock;
pub mod registry;
pub mod timer;
