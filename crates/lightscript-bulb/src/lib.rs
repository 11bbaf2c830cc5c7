//! Bulb capability interface
//!
//! The player never talks to hardware directly. It drives a [`Bulb`] handle
//! obtained from a [`BulbConnector`], and replaces the handle whenever an
//! operation fails with [`BulbError::Connectivity`].
//!
//! # Drivers
//!
//! - [`hue`] - Philips Hue bridge (REST API v1) over HTTP
//! - [`simulated`] - In-memory bulb that records every call

mod bulb;
mod color;
mod error;
pub mod hue;
pub mod simulated;

pub use bulb::{Bulb, BulbConnector, BulbSnapshot};
pub use color::{Hsb, Rgb, HUE_MAX};
pub use error::{BulbError, BulbResult};
pub use hue::{HueBulb, HueConnector};
pub use simulated::{BulbCall, SimulatedBulb, SimulatedConnector};
