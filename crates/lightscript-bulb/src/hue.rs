//! Philips Hue bridge driver
//!
//! Talks to a bridge over its REST API (v1). The bridge address and API
//! username come from configuration; discovery and pairing are not handled
//! here.
//!
//! - `GET  /api/<username>/lights/<id>` reads the light state
//! - `PUT  /api/<username>/lights/<id>/state` changes it
//!
//! Hue transitions are per request, so the transition time is kept on the
//! handle and sent with every state change.

use crate::bulb::{Bulb, BulbConnector, BulbSnapshot};
use crate::color::{Hsb, Rgb};
use crate::error::{BulbError, BulbResult};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::{debug, trace};

/// Largest brightness and saturation the bridge accepts
const HUE_LEVEL_MAX: u8 = 254;

/// Bridge default transition time, used until one is set
const DEFAULT_TRANSITION_SECS: f64 = 0.4;

/// Light resource as returned by the bridge
#[derive(Debug, Deserialize)]
struct LightResource {
    #[serde(default)]
    name: String,
    state: LightState,
}

/// The `state` object of a light
#[derive(Debug, Deserialize)]
struct LightState {
    on: bool,
    #[serde(default)]
    bri: u8,
    #[serde(default)]
    hue: u16,
    #[serde(default)]
    sat: u8,
}

impl LightState {
    fn hsb(&self) -> Hsb {
        Hsb::new(self.hue, self.sat, self.bri)
    }
}

/// Opens handles to one light on a Hue bridge
#[derive(Clone)]
pub struct HueConnector {
    client: Client,
    base_url: String,
    light_id: String,
}

impl HueConnector {
    /// Create a connector for `light_id` on the bridge at `bridge`
    ///
    /// `bridge` is a host (`192.168.1.2`), `host:port`, or a full base URL.
    pub fn new(
        bridge: &str,
        username: &str,
        light_id: impl Into<String>,
        timeout: Duration,
    ) -> BulbResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        let bridge = bridge.trim_end_matches('/');
        let base = if bridge.starts_with("http://") || bridge.starts_with("https://") {
            bridge.to_string()
        } else {
            format!("http://{}", bridge)
        };

        Ok(Self {
            client,
            base_url: format!("{}/api/{}", base, username),
            light_id: light_id.into(),
        })
    }
}

#[async_trait]
impl BulbConnector for HueConnector {
    type Bulb = HueBulb;

    fn identifier(&self) -> &str {
        &self.light_id
    }

    async fn connect(&self) -> BulbResult<HueBulb> {
        let bulb = HueBulb {
            client: self.client.clone(),
            light_url: format!("{}/lights/{}", self.base_url, self.light_id),
            transition: None,
        };

        let light = bulb.fetch().await?;
        debug!("Connected to Hue light {} ({})", self.light_id, light.name);

        Ok(bulb)
    }
}

/// Handle to one Hue light
pub struct HueBulb {
    client: Client,
    light_url: String,
    /// Transition time in bridge units (100 ms)
    transition: Option<u16>,
}

impl HueBulb {
    async fn fetch(&self) -> BulbResult<LightResource> {
        let response = self.client.get(&self.light_url).send().await?;
        let body = read_body(response).await?;
        check_errors(&body)?;

        serde_json::from_value(body).map_err(|e| BulbError::Protocol(e.to_string()))
    }

    async fn state(&self) -> BulbResult<LightState> {
        self.fetch().await.map(|light| light.state)
    }

    async fn put_state(&self, mut body: Map<String, Value>) -> BulbResult<()> {
        if let Some(transition) = self.transition {
            body.insert("transitiontime".to_string(), json!(transition));
        }

        let body = Value::Object(body);
        trace!("PUT {}/state {}", self.light_url, body);

        let response = self
            .client
            .put(format!("{}/state", self.light_url))
            .json(&body)
            .send()
            .await?;

        let reply = read_body(response).await?;
        check_errors(&reply)
    }

    async fn put_fields(&self, fields: Value) -> BulbResult<()> {
        match fields {
            Value::Object(map) => self.put_state(map).await,
            other => Err(BulbError::Protocol(format!("not a state object: {}", other))),
        }
    }
}

#[async_trait]
impl Bulb for HueBulb {
    async fn rgb(&mut self) -> BulbResult<Rgb> {
        Ok(self.state().await?.hsb().to_rgb())
    }

    async fn set_rgb(&mut self, rgb: Rgb) -> BulbResult<()> {
        self.set_hsb(rgb.to_hsb()).await
    }

    async fn hue(&mut self) -> BulbResult<u16> {
        Ok(self.state().await?.hue)
    }

    async fn saturation(&mut self) -> BulbResult<u8> {
        Ok(self.state().await?.sat)
    }

    async fn brightness(&mut self) -> BulbResult<u8> {
        Ok(self.state().await?.bri)
    }

    async fn set_hue(&mut self, hue: u16) -> BulbResult<()> {
        self.put_fields(json!({ "hue": hue })).await
    }

    async fn set_saturation(&mut self, saturation: u8) -> BulbResult<()> {
        self.put_fields(json!({ "sat": saturation.min(HUE_LEVEL_MAX) }))
            .await
    }

    async fn set_brightness(&mut self, brightness: u8) -> BulbResult<()> {
        self.put_fields(json!({ "bri": brightness.min(HUE_LEVEL_MAX) }))
            .await
    }

    async fn set_hsb(&mut self, hsb: Hsb) -> BulbResult<()> {
        self.put_fields(hsb_fields(hsb)).await
    }

    async fn transition_time(&mut self) -> BulbResult<f64> {
        Ok(self
            .transition
            .map(from_deciseconds)
            .unwrap_or(DEFAULT_TRANSITION_SECS))
    }

    async fn set_transition_time(&mut self, seconds: f64) -> BulbResult<()> {
        self.transition = Some(to_deciseconds(seconds));
        Ok(())
    }

    async fn turn_on(&mut self) -> BulbResult<()> {
        self.put_fields(json!({ "on": true })).await
    }

    async fn turn_off(&mut self) -> BulbResult<()> {
        self.put_fields(json!({ "on": false })).await
    }

    async fn save_snapshot(&mut self) -> BulbResult<BulbSnapshot> {
        let state = self.state().await?;
        Ok(BulbSnapshot {
            on: state.on,
            hsb: state.hsb(),
            transition_secs: self.transition.map(from_deciseconds),
        })
    }

    async fn restore_snapshot(&mut self, snapshot: &BulbSnapshot) -> BulbResult<()> {
        self.transition = snapshot.transition_secs.map(to_deciseconds);

        // Colour can only be changed while the light is on
        let mut fields = hsb_fields(snapshot.hsb);
        fields["on"] = json!(true);
        self.put_fields(fields).await?;

        if !snapshot.on {
            self.put_fields(json!({ "on": false })).await?;
        }
        Ok(())
    }
}

fn hsb_fields(hsb: Hsb) -> Value {
    json!({
        "hue": hsb.hue,
        "sat": hsb.saturation.min(HUE_LEVEL_MAX),
        "bri": hsb.brightness.min(HUE_LEVEL_MAX),
    })
}

fn to_deciseconds(seconds: f64) -> u16 {
    // `as` saturates, and NaN maps to 0
    (seconds * 10.0).round().max(0.0) as u16
}

fn from_deciseconds(deciseconds: u16) -> f64 {
    f64::from(deciseconds) / 10.0
}

async fn read_body(response: Response) -> BulbResult<Value> {
    let status = response.status();
    if status.is_server_error() {
        return Err(BulbError::Connectivity(format!("bridge returned {}", status)));
    }
    if !status.is_success() {
        return Err(BulbError::Protocol(format!("bridge returned {}", status)));
    }

    Ok(response.json().await?)
}

/// Bridge errors come back as `[{"error": {...}}]` with a 200 status
fn check_errors(body: &Value) -> BulbResult<()> {
    let Some(entries) = body.as_array() else {
        return Ok(());
    };

    for entry in entries {
        if let Some(error) = entry.get("error") {
            return Err(BulbError::Rejected {
                address: error["address"].as_str().unwrap_or_default().to_string(),
                description: error["description"]
                    .as_str()
                    .unwrap_or_default()
                    .to_string(),
            });
        }
    }

    Ok(())
}
