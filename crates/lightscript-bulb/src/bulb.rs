//! Bulb capability traits

use crate::color::{Hsb, Rgb};
use crate::error::BulbResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Saved bulb settings, restored when playback ends
///
/// A snapshot is a plain value so it outlives the handle that produced it;
/// handles are thrown away on every reconnect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BulbSnapshot {
    /// Whether the bulb was on
    pub on: bool,
    /// Colour at the time of the snapshot
    pub hsb: Hsb,
    /// Transition time in seconds, if one had been set
    pub transition_secs: Option<f64>,
}

/// A connected bulb
///
/// All operations may fail with [`crate::BulbError::Connectivity`], in which
/// case the handle should be dropped and a new one obtained from its
/// [`BulbConnector`].
#[async_trait]
pub trait Bulb: Send {
    /// Current colour as RGB
    async fn rgb(&mut self) -> BulbResult<Rgb>;

    /// Set the colour from RGB
    async fn set_rgb(&mut self, rgb: Rgb) -> BulbResult<()>;

    /// Current hue (0..=65535)
    async fn hue(&mut self) -> BulbResult<u16>;

    /// Current saturation
    async fn saturation(&mut self) -> BulbResult<u8>;

    /// Current brightness
    async fn brightness(&mut self) -> BulbResult<u8>;

    async fn set_hue(&mut self, hue: u16) -> BulbResult<()>;

    async fn set_saturation(&mut self, saturation: u8) -> BulbResult<()>;

    async fn set_brightness(&mut self, brightness: u8) -> BulbResult<()>;

    /// Set hue, saturation and brightness together
    ///
    /// Drivers that can write all three in one request should override this.
    async fn set_hsb(&mut self, hsb: Hsb) -> BulbResult<()> {
        self.set_hue(hsb.hue).await?;
        self.set_saturation(hsb.saturation).await?;
        self.set_brightness(hsb.brightness).await
    }

    /// Transition time applied to subsequent changes, in seconds
    async fn transition_time(&mut self) -> BulbResult<f64>;

    async fn set_transition_time(&mut self, seconds: f64) -> BulbResult<()>;

    async fn turn_on(&mut self) -> BulbResult<()>;

    async fn turn_off(&mut self) -> BulbResult<()>;

    /// Capture the current settings
    async fn save_snapshot(&mut self) -> BulbResult<BulbSnapshot>;

    /// Put back settings captured by [`Bulb::save_snapshot`]
    async fn restore_snapshot(&mut self, snapshot: &BulbSnapshot) -> BulbResult<()>;
}

/// Opens bulb handles for one bulb identifier
#[async_trait]
pub trait BulbConnector: Send + Sync {
    type Bulb: Bulb;

    /// Identifier of the bulb this connector opens
    fn identifier(&self) -> &str;

    /// Open a fresh handle
    async fn connect(&self) -> BulbResult<Self::Bulb>;
}
