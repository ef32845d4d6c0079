//! Current weather via the OpenWeatherMap API.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use umbra_core::error::ToolError;
use umbra_core::tool::{Arity, Tool};
use crate::http;

const NAME: &str = "weather";
const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

pub struct WeatherTool {
    api_key: Option<String>,
    default_location: String,
    units: String,
    base_url: String,
    client: reqwest::Client,
}

impl WeatherTool {
    pub fn new(
        api_key: Option<String>,
        default_city: &str,
        default_country: &str,
        units: impl Into<String>,
    ) -> Self {
        Self {
            api_key,
            default_location: format!("{default_city},{default_country}"),
            units: units.into(),
            base_url: DEFAULT_BASE_URL.into(),
            client: http::client(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// The location to query; blank or "here"-style requests use the default.
    fn resolve_location<'a>(&'a self, requested: &'a str) -> &'a str {
        let trimmed = requested.trim();
        let lower = trimmed.to_lowercase();
        if trimmed.is_empty()
            || matches!(lower.as_str(), "here" | "current location" | "my location" | "local")
        {
            &self.default_location
        } else {
            trimmed
        }
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Current weather for a city. Args: [location], e.g. [\"Boston\"]. \
         Use \"current location\" for the user's home city."
    }

    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }

    async fn execute(&self, args: Vec<String>) -> Result<Option<String>, ToolError> {
        let api_key = http::require_key(&self.api_key, "OpenWeatherMap")?;
        let location = self.resolve_location(args.first().map(String::as_str).unwrap_or(""));
        debug!(location, "Fetching weather");

        let response = self
            .client
            .get(&self.base_url)
            .query(&[("q", location), ("appid", api_key), ("units", self.units.as_str())])
            .send()
            .await
            .map_err(|e| http::request_failed(NAME, e))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ToolError::ExecutionFailed {
                tool_name: NAME.into(),
                reason: format!("the city '{location}' might not be found"),
            });
        }

        let response = http::check_status(NAME, response).await?;
        let data: WeatherResponse = response
            .json()
            .await
            .map_err(|e| http::bad_payload(NAME, e))?;

        format_weather(&data, &self.units)
            .map(Some)
            .ok_or_else(|| http::bad_payload(NAME, "no weather conditions in response"))
    }
}

#[derive(Debug, Deserialize)]
struct WeatherResponse {
    name: String,
    weather: Vec<Condition>,
    main: Readings,
}

#[derive(Debug, Deserialize)]
struct Condition {
    description: String,
}

#[derive(Debug, Deserialize)]
struct Readings {
    temp: f64,
}

fn format_weather(data: &WeatherResponse, units: &str) -> Option<String> {
    let condition = data.weather.first()?;
    let symbol = if units == "metric" { "°C" } else { "°F" };
    Some(format!(
        "The weather in {} is {}{} with {}.",
        data.name, data.main.temp, symbol, condition.description
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool() -> WeatherTool {
        WeatherTool::new(Some("owm-test".into()), "Boston", "US", "imperial")
    }

    #[test]
    fn formats_imperial_reading() {
        let data: WeatherResponse = serde_json::from_str(
            r#"{"name":"Boston","weather":[{"main":"Clear","description":"clear sky"}],"main":{"temp":61.3,"humidity":40}}"#,
        )
        .unwrap();
        assert_eq!(
            format_weather(&data, "imperial").unwrap(),
            "The weather in Boston is 61.3°F with clear sky."
        );
        assert!(format_weather(&data, "metric").unwrap().contains("61.3°C"));
    }

    #[test]
    fn missing_conditions_is_none() {
        let data: WeatherResponse =
            serde_json::from_str(r#"{"name":"X","weather":[],"main":{"temp":1.0}}"#).unwrap();
        assert!(format_weather(&data, "imperial").is_none());
    }

    #[test]
    fn current_location_uses_default() {
        let tool = tool();
        assert_eq!(tool.resolve_location("current location"), "Boston,US");
        assert_eq!(tool.resolve_location("  "), "Boston,US");
        assert_eq!(tool.resolve_location("Paris"), "Paris");
    }

    #[tokio::test]
    async fn missing_key_is_not_configured() {
        let tool = WeatherTool::new(None, "Boston", "US", "imperial");
        let err = tool.execute(vec!["Boston".into()]).await.unwrap_err();
        assert!(matches!(err, ToolError::NotConfigured(_)));
    }

    #[tokio::test]
    async fn unreachable_api_fails_execution() {
        let tool = tool().with_base_url("http://127.0.0.1:1/weather");
        let err = tool.execute(vec!["Boston".into()]).await.unwrap_err();
        assert!(matches!(err, ToolError::ExecutionFailed { ref tool_name, .. } if tool_name == "weather"));
    }

    #[test]
    fn declares_one_argument() {
        assert_eq!(tool().arity(), Arity::Exact(1));
    }
}
