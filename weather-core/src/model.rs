use serde::Serialize;

/// One decoded weather observation for a location.
///
/// Serializes back into the wire shape the decoder reads, so the
/// encoder and decoder agree on field names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherReport {
    #[serde(rename = "name")]
    pub location_name: String,

    /// Observation time, in whatever epoch unit the source used.
    #[serde(rename = "dt")]
    pub timestamp: i64,

    #[serde(rename = "cod")]
    pub status_code: i64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sys: Option<SysInfo>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub main: Option<MainInfo>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind: Option<WindInfo>,

    #[serde(rename = "weather")]
    pub conditions: Vec<Condition>,
}

impl WeatherReport {
    /// The first reported condition, which providers treat as the primary one.
    pub fn primary_condition(&self) -> Option<&Condition> {
        self.conditions.first()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SysInfo {
    pub sunrise: i64,
    pub sunset: i64,
    #[serde(rename = "country")]
    pub country_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MainInfo {
    #[serde(rename = "temp")]
    pub temperature: f64,
    pub humidity: i64,
    pub pressure: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindInfo {
    pub speed: f64,
    #[serde(rename = "deg")]
    pub degree: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Condition {
    pub id: i64,
    pub main: String,
    pub description: String,
    pub icon: String,
}

impl Condition {
    /// Id assigned when the document carries no `id` for a condition.
    pub const UNKNOWN_ID: i64 = -1;
}
