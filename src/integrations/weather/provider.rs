//! Rider insights provider.
//!
//! Fetches weather and air quality from Open-Meteo and the city name from
//! BigDataCloud's reverse geocoder. The three requests are independent and
//! run concurrently; any one failing fails the whole fetch.

use super::{
    AirQuality, AqiLevel, CurrentWeather, RiderInsights, WeatherCondition, WeatherConfig,
    WeatherError,
};
use chrono::{DateTime, FixedOffset, Offset, Timelike, Utc};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// City shown when the geocoder knows no name for the location.
pub const UNKNOWN_AREA: &str = "Unknown Area";

/// Trait for rider insights providers
pub trait InsightsProvider: Send + Sync {
    /// Fetch current insights (uses cache if valid)
    fn get_insights(
        &self,
    ) -> impl std::future::Future<Output = Result<RiderInsights, WeatherError>> + Send;

    /// Force refresh (ignore cache)
    fn refresh(
        &self,
    ) -> impl std::future::Future<Output = Result<RiderInsights, WeatherError>> + Send;

    /// Get cached data (even if stale)
    fn get_cached(&self) -> Option<RiderInsights>;

    /// Get last fetch time
    fn last_updated(&self) -> Option<DateTime<Utc>>;
}

/// Open-Meteo forecast response (the fields we use)
#[derive(Debug, serde::Deserialize)]
pub(crate) struct ForecastResponse {
    /// Offset of the location's timezone; the hourly series starts at local midnight
    #[serde(default)]
    utc_offset_seconds: i32,
    current: ForecastCurrent,
    hourly: Option<ForecastHourly>,
}

#[derive(Debug, serde::Deserialize)]
struct ForecastCurrent {
    temperature_2m: Option<f64>,
    weather_code: Option<u16>,
}

#[derive(Debug, serde::Deserialize)]
struct ForecastHourly {
    #[serde(default)]
    precipitation_probability: Vec<Option<f64>>,
}

/// Open-Meteo air quality response
#[derive(Debug, serde::Deserialize)]
pub(crate) struct AirQualityResponse {
    current: AirQualityCurrent,
}

#[derive(Debug, serde::Deserialize)]
struct AirQualityCurrent {
    us_aqi: Option<f64>,
}

/// BigDataCloud reverse geocode response
#[derive(Debug, Default, serde::Deserialize)]
pub(crate) struct GeocodeResponse {
    city: Option<String>,
    locality: Option<String>,
}

/// Base URLs of the three upstream APIs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub forecast: String,
    pub air_quality: String,
    pub geocode: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            forecast: "https://api.open-meteo.com".to_string(),
            air_quality: "https://air-quality-api.open-meteo.com".to_string(),
            geocode: "https://api.bigdatacloud.net".to_string(),
        }
    }
}

impl Endpoints {
    fn forecast_url(&self, lat: f64, lon: f64) -> String {
        format!(
            "{}/v1/forecast?latitude={}&longitude={}&current=temperature_2m,weather_code&hourly=precipitation_probability&forecast_days=1&timezone=auto",
            self.forecast, lat, lon
        )
    }

    fn air_quality_url(&self, lat: f64, lon: f64) -> String {
        format!(
            "{}/v1/air-quality?latitude={}&longitude={}&current=us_aqi",
            self.air_quality, lat, lon
        )
    }

    fn geocode_url(&self, lat: f64, lon: f64) -> String {
        format!(
            "{}/data/reverse-geocode-client?latitude={}&longitude={}&localityLanguage=en",
            self.geocode, lat, lon
        )
    }
}

/// Combine the three responses into display data.
///
/// The rain probability is read from the slot for the current hour at the
/// location, not on this machine.
pub(crate) fn build_insights(
    forecast: ForecastResponse,
    air: AirQualityResponse,
    geocode: GeocodeResponse,
    fetched_at: DateTime<Utc>,
) -> RiderInsights {
    let code = forecast.current.weather_code.unwrap_or(0);
    let offset = FixedOffset::east_opt(forecast.utc_offset_seconds).unwrap_or(Utc.fix());
    let local_hour = fetched_at.with_timezone(&offset).hour();
    let rain_probability = forecast
        .hourly
        .and_then(|h| h.precipitation_probability.get(local_hour as usize).copied().flatten())
        .unwrap_or(0.0)
        .clamp(0.0, 100.0)
        .round() as u8;

    let aqi = air.current.us_aqi.unwrap_or(0.0);

    let city = [geocode.city, geocode.locality]
        .into_iter()
        .flatten()
        .find(|name| !name.trim().is_empty())
        .unwrap_or_else(|| UNKNOWN_AREA.to_string());

    RiderInsights {
        weather: CurrentWeather {
            temperature: forecast.current.temperature_2m.unwrap_or(0.0).round() as i32,
            code,
            condition: WeatherCondition::from_wmo_code(code),
            rain_probability,
        },
        air_quality: AirQuality {
            value: aqi,
            level: AqiLevel::from_us_aqi(aqi),
        },
        city,
        fetched_at,
    }
}

/// Default provider backed by Open-Meteo and BigDataCloud.
#[derive(Clone)]
pub struct OpenMeteoProvider {
    client: reqwest::Client,
    endpoints: Endpoints,
    config: Arc<RwLock<WeatherConfig>>,
    cached_data: Arc<RwLock<Option<RiderInsights>>>,
}

impl OpenMeteoProvider {
    /// Create a new provider against the public APIs
    pub fn new(config: WeatherConfig) -> Result<Self, WeatherError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| WeatherError::NetworkError(e.to_string()))?;

        Ok(Self::with_client(config, Endpoints::default(), client))
    }

    /// Create a provider with a prepared client and alternative API hosts
    pub fn with_client(config: WeatherConfig, endpoints: Endpoints, client: reqwest::Client) -> Self {
        Self {
            client,
            endpoints,
            config: Arc::new(RwLock::new(config)),
            cached_data: Arc::new(RwLock::new(None)),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, WeatherError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| WeatherError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WeatherError::RequestFailed(format!("{} returned {}", url, status)));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| WeatherError::InvalidResponse(e.to_string()))
    }

    /// Fetch from the APIs
    async fn fetch_from_api(&self) -> Result<RiderInsights, WeatherError> {
        let (lat, lon) = {
            let config = self.config.read().await;
            if !config.enabled {
                return Err(WeatherError::Disabled);
            }
            config.location().ok_or(WeatherError::LocationMissing)?
        };

        tracing::debug!("Fetching rider insights for {:.3},{:.3}", lat, lon);

        let forecast_url = self.endpoints.forecast_url(lat, lon);
        let air_url = self.endpoints.air_quality_url(lat, lon);
        let geocode_url = self.endpoints.geocode_url(lat, lon);

        let (forecast, air, geocode) = tokio::try_join!(
            self.get_json::<ForecastResponse>(&forecast_url),
            self.get_json::<AirQualityResponse>(&air_url),
            self.get_json::<GeocodeResponse>(&geocode_url),
        )?;

        let insights = build_insights(forecast, air, geocode, Utc::now());

        // Cache the result
        *self.cached_data.write().await = Some(insights.clone());

        Ok(insights)
    }

    /// Check if cache is valid
    async fn fresh_cache(&self) -> Option<RiderInsights> {
        let max_age = self.config.read().await.refresh_interval_minutes;
        let cached = self.cached_data.read().await;

        cached
            .as_ref()
            .filter(|data| !data.is_stale(max_age, Utc::now()))
            .cloned()
    }
}

impl InsightsProvider for OpenMeteoProvider {
    async fn get_insights(&self) -> Result<RiderInsights, WeatherError> {
        // Check cache first
        if let Some(data) = self.fresh_cache().await {
            return Ok(data);
        }

        // Fetch fresh data
        self.fetch_from_api().await
    }

    async fn refresh(&self) -> Result<RiderInsights, WeatherError> {
        self.fetch_from_api().await
    }

    fn get_cached(&self) -> Option<RiderInsights> {
        self.cached_data.try_read().ok()?.clone()
    }

    fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.get_cached().map(|data| data.fetched_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const FORECAST_JSON: &str = r#"{
        "utc_offset_seconds": 19800,
        "current": {"temperature_2m": 24.4, "weather_code": 2},
        "hourly": {"precipitation_probability": [30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
                                                 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30]}
    }"#;
    const AIR_JSON: &str = r#"{"current": {"us_aqi": 64}}"#;
    const GEOCODE_JSON: &str = r#"{"city": "Pune", "locality": "Shivajinagar"}"#;

    fn forecast(json: &str) -> ForecastResponse {
        serde_json::from_str(json).unwrap()
    }

    fn air(value: f64) -> AirQualityResponse {
        serde_json::from_str(&format!(r#"{{"current": {{"us_aqi": {}}}}}"#, value)).unwrap()
    }

    fn at_utc_hour(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, hour, 10, 0).unwrap()
    }

    /// Local HTTP server answering each API path with a canned status and body.
    struct Upstream {
        base: String,
        forecast_hits: Arc<AtomicUsize>,
    }

    async fn serve(routes: Vec<(&'static str, u16, &'static str)>) -> Upstream {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let forecast_hits = Arc::new(AtomicUsize::new(0));
        let hits = forecast_hits.clone();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let routes = routes.clone();
                let hits = hits.clone();
                tokio::spawn(async move {
                    let mut request = Vec::new();
                    let mut buf = [0u8; 1024];
                    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                        match socket.read(&mut buf).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => request.extend_from_slice(&buf[..n]),
                        }
                    }

                    let request = String::from_utf8_lossy(&request).to_string();
                    let path = request.split_whitespace().nth(1).unwrap_or("/");
                    if path.starts_with("/v1/forecast") {
                        hits.fetch_add(1, Ordering::SeqCst);
                    }

                    let (status, body) = routes
                        .iter()
                        .find(|(prefix, _, _)| path.starts_with(prefix))
                        .map(|(_, status, body)| (*status, *body))
                        .unwrap_or((404, "{}"));
                    let reason = match status {
                        200 => "OK",
                        503 => "Service Unavailable",
                        _ => "Not Found",
                    };
                    let response = format!(
                        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status,
                        reason,
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        Upstream { base, forecast_hits }
    }

    fn healthy_routes() -> Vec<(&'static str, u16, &'static str)> {
        vec![
            ("/v1/forecast", 200, FORECAST_JSON),
            ("/v1/air-quality", 200, AIR_JSON),
            ("/data/reverse-geocode-client", 200, GEOCODE_JSON),
        ]
    }

    fn provider_for(upstream: &Upstream) -> OpenMeteoProvider {
        let config = WeatherConfig {
            latitude: Some(18.52),
            longitude: Some(73.86),
            ..Default::default()
        };
        let endpoints = Endpoints {
            forecast: upstream.base.clone(),
            air_quality: upstream.base.clone(),
            geocode: upstream.base.clone(),
        };
        let client = reqwest::Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();

        OpenMeteoProvider::with_client(config, endpoints, client)
    }

    #[test]
    fn test_build_insights() {
        let forecast = forecast(
            r#"{
                "current": {"temperature_2m": 27.6, "weather_code": 61},
                "hourly": {"precipitation_probability": [0, 5, 10, 40, 80]}
            }"#,
        );
        let geocode: GeocodeResponse =
            serde_json::from_str(r#"{"city": "Bengaluru", "locality": "Indiranagar"}"#).unwrap();

        let insights = build_insights(forecast, air(112.0), geocode, at_utc_hour(3));

        assert_eq!(insights.weather.temperature, 28);
        assert_eq!(insights.weather.condition, WeatherCondition::Rain);
        assert_eq!(insights.weather.rain_probability, 40);
        assert_eq!(insights.air_quality.level, AqiLevel::Unhealthy);
        assert_eq!(insights.city, "Bengaluru");
    }

    #[test]
    fn test_rain_probability_uses_location_hour() {
        // 22:40 UTC is 04:10 the next morning at +05:30
        let forecast = forecast(
            r#"{
                "utc_offset_seconds": 19800,
                "current": {"weather_code": 0},
                "hourly": {"precipitation_probability": [0, 0, 0, 0, 65, 0]}
            }"#,
        );
        let fetched_at = Utc.with_ymd_and_hms(2025, 6, 15, 22, 40, 0).unwrap();

        let insights = build_insights(forecast, air(10.0), GeocodeResponse::default(), fetched_at);

        assert_eq!(insights.weather.rain_probability, 65);
    }

    #[test]
    fn test_missing_values_default() {
        let forecast = forecast(r#"{"current": {}}"#);
        let air: AirQualityResponse = serde_json::from_str(r#"{"current": {"us_aqi": null}}"#).unwrap();

        let insights = build_insights(forecast, air, GeocodeResponse::default(), at_utc_hour(14));

        assert_eq!(insights.weather.temperature, 0);
        assert_eq!(insights.weather.condition, WeatherCondition::Clear);
        assert_eq!(insights.weather.rain_probability, 0);
        assert_eq!(insights.air_quality.value, 0.0);
        assert_eq!(insights.air_quality.level, AqiLevel::Good);
        assert_eq!(insights.city, UNKNOWN_AREA);
    }

    #[test]
    fn test_city_falls_back_to_locality() {
        let geocode: GeocodeResponse =
            serde_json::from_str(r#"{"city": "", "locality": "Lonavala"}"#).unwrap();
        let insights = build_insights(forecast(r#"{"current": {}}"#), air(10.0), geocode, at_utc_hour(0));

        assert_eq!(insights.city, "Lonavala");
    }

    #[test]
    fn test_rain_probability_out_of_range_hour() {
        let sparse = forecast(
            r#"{"current": {"weather_code": 0}, "hourly": {"precipitation_probability": [20, null]}}"#,
        );
        let insights = build_insights(sparse, air(10.0), GeocodeResponse::default(), at_utc_hour(1));
        assert_eq!(insights.weather.rain_probability, 0);

        let short = forecast(r#"{"current": {}, "hourly": {"precipitation_probability": [20]}}"#);
        let insights = build_insights(short, air(10.0), GeocodeResponse::default(), at_utc_hour(9));
        assert_eq!(insights.weather.rain_probability, 0);
    }

    #[test]
    fn test_build_urls() {
        let endpoints = Endpoints::default();

        assert_eq!(
            endpoints.air_quality_url(18.52, 73.86),
            "https://air-quality-api.open-meteo.com/v1/air-quality?latitude=18.52&longitude=73.86&current=us_aqi"
        );
        assert!(endpoints
            .forecast_url(18.52, 73.86)
            .contains("hourly=precipitation_probability&forecast_days=1"));
        assert!(endpoints
            .geocode_url(18.52, 73.86)
            .starts_with("https://api.bigdatacloud.net/data/reverse-geocode-client?latitude=18.52"));
    }

    #[tokio::test]
    async fn test_missing_location() {
        let provider = OpenMeteoProvider::new(WeatherConfig::default()).unwrap();

        let result = provider.get_insights().await;

        assert!(matches!(result, Err(WeatherError::LocationMissing)));
        assert!(provider.get_cached().is_none());
        assert!(provider.last_updated().is_none());
    }

    #[tokio::test]
    async fn test_disabled() {
        let config = WeatherConfig {
            enabled: false,
            latitude: Some(1.0),
            longitude: Some(1.0),
            ..Default::default()
        };
        let provider = OpenMeteoProvider::new(config).unwrap();

        assert!(matches!(provider.refresh().await, Err(WeatherError::Disabled)));
    }

    #[tokio::test]
    async fn test_fetch_combines_all_sources() {
        let upstream = serve(healthy_routes()).await;
        let provider = provider_for(&upstream);

        let insights = provider.get_insights().await.unwrap();

        assert_eq!(insights.city, "Pune");
        assert_eq!(insights.weather.temperature, 24);
        assert_eq!(insights.weather.condition, WeatherCondition::PartlyCloudy);
        assert_eq!(insights.weather.rain_probability, 30);
        assert_eq!(insights.air_quality.value, 64.0);
        assert_eq!(insights.air_quality.level, AqiLevel::Moderate);
        assert_eq!(provider.last_updated(), Some(insights.fetched_at));
    }

    #[tokio::test]
    async fn test_cache_serves_repeat_requests() {
        let upstream = serve(healthy_routes()).await;
        let provider = provider_for(&upstream);

        let first = provider.get_insights().await.unwrap();
        let second = provider.get_insights().await.unwrap();

        assert_eq!(upstream.forecast_hits.load(Ordering::SeqCst), 1);
        assert_eq!(second.fetched_at, first.fetched_at);

        // Refresh skips the cache
        provider.refresh().await.unwrap();
        assert_eq!(upstream.forecast_hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_one_failed_source_fails_fetch() {
        let upstream = serve(vec![
            ("/v1/forecast", 200, FORECAST_JSON),
            ("/v1/air-quality", 503, r#"{"error": true}"#),
            ("/data/reverse-geocode-client", 200, GEOCODE_JSON),
        ])
        .await;
        let provider = provider_for(&upstream);

        let result = provider.get_insights().await;

        assert!(matches!(result, Err(WeatherError::RequestFailed(_))));
        assert!(provider.get_cached().is_none());
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let upstream = serve(vec![
            ("/v1/forecast", 200, "<html>maintenance</html>"),
            ("/v1/air-quality", 200, AIR_JSON),
            ("/data/reverse-geocode-client", 200, GEOCODE_JSON),
        ])
        .await;
        let provider = provider_for(&upstream);

        let result = provider.refresh().await;

        assert!(matches!(result, Err(WeatherError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_cache() {
        let upstream = serve(healthy_routes()).await;
        let provider = provider_for(&upstream);
        let fetched = provider.get_insights().await.unwrap();

        let mut broken = provider.clone();
        broken.endpoints.air_quality = format!("{}/offline", upstream.base);

        assert!(broken.refresh().await.is_err());
        // Clones share the cache
        assert_eq!(provider.get_cached(), Some(fetched));
    }
}
