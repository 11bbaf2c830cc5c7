//! In-memory simulated bulb
//!
//! Every handle opened by a [`SimulatedConnector`] drives the same shared
//! light, the way reconnecting to a real bulb reaches the same hardware.
//! Calls are recorded in order, and connectivity failures can be injected
//! for both connects and operations.

use crate::bulb::{Bulb, BulbConnector, BulbSnapshot};
use crate::color::{Hsb, Rgb};
use crate::error::{BulbError, BulbResult};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// A recorded bulb operation
#[derive(Debug, Clone, PartialEq)]
pub enum BulbCall {
    GetRgb,
    SetRgb(Rgb),
    GetHue,
    GetSaturation,
    GetBrightness,
    SetHue(u16),
    SetSaturation(u8),
    SetBrightness(u8),
    SetHsb(Hsb),
    GetTransition,
    SetTransition(f64),
    TurnOn,
    TurnOff,
    SaveSnapshot,
    RestoreSnapshot(BulbSnapshot),
}

impl BulbCall {
    /// Whether the call changes the light
    pub fn is_write(&self) -> bool {
        !matches!(
            self,
            Self::GetRgb
                | Self::GetHue
                | Self::GetSaturation
                | Self::GetBrightness
                | Self::GetTransition
                | Self::SaveSnapshot
        )
    }
}

/// State of the simulated light
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SimulatedLight {
    pub on: bool,
    pub hsb: Hsb,
    pub rgb: Rgb,
    pub transition_secs: Option<f64>,
}

impl SimulatedLight {
    fn set_rgb(&mut self, rgb: Rgb) {
        self.rgb = rgb;
        self.hsb = rgb.to_hsb();
    }

    fn set_hsb(&mut self, hsb: Hsb) {
        self.hsb = hsb;
        self.rgb = hsb.to_rgb();
    }
}

#[derive(Debug, Default)]
struct Shared {
    light: SimulatedLight,
    calls: Vec<BulbCall>,
    connects: usize,
    failing_connects: usize,
    failing_operations: usize,
    rejected_operations: usize,
}

/// Opens handles to a shared simulated light
#[derive(Debug, Clone)]
pub struct SimulatedConnector {
    identifier: String,
    shared: Arc<Mutex<Shared>>,
}

impl SimulatedConnector {
    /// Create a connector for a light that starts off and black
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            shared: Arc::new(Mutex::new(Shared::default())),
        }
    }

    /// Set the initial light state
    pub fn with_light(self, on: bool, rgb: Rgb) -> Self {
        {
            let mut shared = self.lock();
            shared.light.on = on;
            shared.light.set_rgb(rgb);
        }
        self
    }

    /// Make the next `count` connect attempts fail
    pub fn fail_connects(&self, count: usize) {
        self.lock().failing_connects = count;
    }

    /// Make the next `count` bulb operations fail
    pub fn fail_operations(&self, count: usize) {
        self.lock().failing_operations = count;
    }

    /// Make the next `count` bulb operations fail with a bridge rejection
    pub fn reject_operations(&self, count: usize) {
        self.lock().rejected_operations = count;
    }

    /// Current light state
    pub fn light(&self) -> SimulatedLight {
        self.lock().light
    }

    /// Successful operations so far, in order
    pub fn calls(&self) -> Vec<BulbCall> {
        self.lock().calls.clone()
    }

    /// Successful operations that changed the light
    pub fn writes(&self) -> Vec<BulbCall> {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.is_write())
            .cloned()
            .collect()
    }

    /// Forget recorded calls
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Number of successful connects
    pub fn connects(&self) -> usize {
        self.lock().connects
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl BulbConnector for SimulatedConnector {
    type Bulb = SimulatedBulb;

    fn identifier(&self) -> &str {
        &self.identifier
    }

    async fn connect(&self) -> BulbResult<SimulatedBulb> {
        let mut shared = self.lock();
        if shared.failing_connects > 0 {
            shared.failing_connects -= 1;
            return Err(BulbError::Connectivity(format!(
                "simulated bulb {} unreachable",
                self.identifier
            )));
        }

        shared.connects += 1;
        debug!(bulb = %self.identifier, "Simulated bulb connected");

        Ok(SimulatedBulb {
            identifier: self.identifier.clone(),
            shared: self.shared.clone(),
        })
    }
}

/// Handle to the shared simulated light
#[derive(Debug)]
pub struct SimulatedBulb {
    identifier: String,
    shared: Arc<Mutex<Shared>>,
}

impl SimulatedBulb {
    /// Run one operation, unless a failure is pending
    fn apply<T>(
        &self,
        call: BulbCall,
        op: impl FnOnce(&mut SimulatedLight) -> T,
    ) -> BulbResult<T> {
        let mut shared = self.shared.lock().unwrap_or_else(PoisonError::into_inner);

        if shared.failing_operations > 0 {
            shared.failing_operations -= 1;
            return Err(BulbError::Connectivity(format!(
                "simulated bulb {} dropped {:?}",
                self.identifier, call
            )));
        }

        if shared.rejected_operations > 0 {
            shared.rejected_operations -= 1;
            return Err(BulbError::Rejected {
                address: format!("/lights/{}", self.identifier),
                description: format!("simulated rejection of {:?}", call),
            });
        }

        debug!(bulb = %self.identifier, ?call, "Simulated bulb call");
        let result = op(&mut shared.light);
        shared.calls.push(call);
        Ok(result)
    }
}

#[async_trait]
impl Bulb for SimulatedBulb {
    async fn rgb(&mut self) -> BulbResult<Rgb> {
        self.apply(BulbCall::GetRgb, |light| light.rgb)
    }

    async fn set_rgb(&mut self, rgb: Rgb) -> BulbResult<()> {
        self.apply(BulbCall::SetRgb(rgb), |light| light.set_rgb(rgb))
    }

    async fn hue(&mut self) -> BulbResult<u16> {
        self.apply(BulbCall::GetHue, |light| light.hsb.hue)
    }

    async fn saturation(&mut self) -> BulbResult<u8> {
        self.apply(BulbCall::GetSaturation, |light| light.hsb.saturation)
    }

    async fn brightness(&mut self) -> BulbResult<u8> {
        self.apply(BulbCall::GetBrightness, |light| light.hsb.brightness)
    }

    async fn set_hue(&mut self, hue: u16) -> BulbResult<()> {
        self.apply(BulbCall::SetHue(hue), |light| {
            light.set_hsb(Hsb { hue, ..light.hsb })
        })
    }

    async fn set_saturation(&mut self, saturation: u8) -> BulbResult<()> {
        self.apply(BulbCall::SetSaturation(saturation), |light| {
            light.set_hsb(Hsb {
                saturation,
                ..light.hsb
            })
        })
    }

    async fn set_brightness(&mut self, brightness: u8) -> BulbResult<()> {
        self.apply(BulbCall::SetBrightness(brightness), |light| {
            light.set_hsb(Hsb {
                brightness,
                ..light.hsb
            })
        })
    }

    async fn set_hsb(&mut self, hsb: Hsb) -> BulbResult<()> {
        self.apply(BulbCall::SetHsb(hsb), |light| light.set_hsb(hsb))
    }

    async fn transition_time(&mut self) -> BulbResult<f64> {
        self.apply(BulbCall::GetTransition, |light| {
            light.transition_secs.unwrap_or_default()
        })
    }

    async fn set_transition_time(&mut self, seconds: f64) -> BulbResult<()> {
        self.apply(BulbCall::SetTransition(seconds), |light| {
            light.transition_secs = Some(seconds)
        })
    }

    async fn turn_on(&mut self) -> BulbResult<()> {
        self.apply(BulbCall::TurnOn, |light| light.on = true)
    }

    async fn turn_off(&mut self) -> BulbResult<()> {
        self.apply(BulbCall::TurnOff, |light| light.on = false)
    }

    async fn save_snapshot(&mut self) -> BulbResult<BulbSnapshot> {
        self.apply(BulbCall::SaveSnapshot, |light| BulbSnapshot {
            on: light.on,
            hsb: light.hsb,
            transition_secs: light.transition_secs,
        })
    }

    async fn restore_snapshot(&mut self, snapshot: &BulbSnapshot) -> BulbResult<()> {
        self.apply(BulbCall::RestoreSnapshot(*snapshot), |light| {
            light.on = snapshot.on;
            light.set_hsb(snapshot.hsb);
            light.transition_secs = snapshot.transition_secs;
        })
    }
}
