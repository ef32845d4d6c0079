//! Driving distance and time between two places via the Google Routes API.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use umbra_core::error::ToolError;
use umbra_core::tool::{Arity, Tool};
use crate::http;

const NAME: &str = "distance";
const DEFAULT_BASE_URL: &str = "https://routes.googleapis.com/directions/v2:computeRoutes";
const MILES_PER_METER: f64 = 0.000621371;

pub struct DistanceTool {
    api_key: Option<String>,
    base_url: String,
    client: reqwest::Client,
}

impl DistanceTool {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.into(),
            client: http::client(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

#[async_trait]
impl Tool for DistanceTool {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Driving distance and travel time. Args: [origin, destination], \
         e.g. [\"Boston, MA\", \"New York, NY\"]."
    }

    fn arity(&self) -> Arity {
        Arity::Exact(2)
    }

    async fn execute(&self, args: Vec<String>) -> Result<Option<String>, ToolError> {
        let api_key = http::require_key(&self.api_key, "Google Maps")?;
        let [origin, destination] = args.as_slice() else {
            return Err(ToolError::InvalidArguments(
                "distance needs an origin and a destination".into(),
            ));
        };
        debug!(origin = %origin, destination = %destination, "Computing route");

        let body = serde_json::json!({
            "origin": { "address": origin },
            "destination": { "address": destination },
            "travelMode": "DRIVE",
            "routingPreference": "TRAFFIC_AWARE",
        });

        let response = self
            .client
            .post(&self.base_url)
            .header("X-Goog-Api-Key", api_key)
            .header("X-Goog-FieldMask", "routes.duration,routes.distanceMeters")
            .json(&body)
            .send()
            .await
            .map_err(|e| http::request_failed(NAME, e))?;
        let response = http::check_status(NAME, response).await?;

        let data: RoutesResponse = response
            .json()
            .await
            .map_err(|e| http::bad_payload(NAME, e))?;

        let Some(route) = data.routes.first() else {
            return Ok(Some(
                "Could not find a route between the specified locations.".into(),
            ));
        };

        let seconds = parse_duration(&route.duration)
            .ok_or_else(|| http::bad_payload(NAME, format!("duration '{}'", route.duration)))?;
        Ok(Some(format_route(route.distance_meters, seconds)))
    }
}

#[derive(Debug, Deserialize)]
struct RoutesResponse {
    #[serde(default)]
    routes: Vec<Route>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Route {
    #[serde(default)]
    distance_meters: u64,
    #[serde(default = "zero_duration")]
    duration: String,
}

fn zero_duration() -> String {
    "0s".into()
}

/// "3600s" → 3600
fn parse_duration(raw: &str) -> Option<u64> {
    raw.trim().trim_end_matches('s').parse().ok()
}

fn meters_to_miles(meters: u64) -> u64 {
    (meters as f64 * MILES_PER_METER).round() as u64
}

fn plural(n: u64, unit: &str) -> String {
    if n == 1 {
        format!("{n} {unit}")
    } else {
        format!("{n} {unit}s")
    }
}

/// Days, hours and minutes, skipping zero parts.
fn humanize_duration(seconds: u64) -> String {
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3_600;
    let minutes = (seconds % 3_600) / 60;

    let parts: Vec<String> = [(days, "day"), (hours, "hour"), (minutes, "minute")]
        .into_iter()
        .filter(|(n, _)| *n > 0)
        .map(|(n, unit)| plural(n, unit))
        .collect();

    if parts.is_empty() {
        "less than a minute".into()
    } else {
        parts.join(" ")
    }
}

/// 1234567 → "1,234,567"
fn with_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn format_route(distance_meters: u64, seconds: u64) -> String {
    format!(
        "Route Information:\n- Distance: {} mi\n- Est. Duration: {}",
        with_thousands(meters_to_miles(distance_meters)),
        humanize_duration(seconds)
    )
}
