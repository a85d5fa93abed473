//! Wire format of the weather service.
//!
//! The service answers with a JSON document that is walked member by member
//! through `serde_json` and turned into [`WeatherReport`]s by
//! [`decode_reports`]. The report types implement `Deserialize` with the same
//! lenient rules, so [`read_reports`] works over any serde deserializer.
//! [`encode_reports`] writes the same shape back out.
//!
//! [`WeatherReport`]: crate::model::WeatherReport

mod decode;
mod encode;

pub use decode::{decode_reports, read_reports};
pub use encode::encode_reports;

/// Member names of the wire document.
pub(crate) mod keys {
    pub const NAME: &str = "name";
    pub const DT: &str = "dt";
    pub const COD: &str = "cod";
    pub const WEATHER: &str = "weather";
    pub const SYS: &str = "sys";
    pub const MAIN: &str = "main";
    pub const WIND: &str = "wind";

    pub const ID: &str = "id";
    pub const DESCRIPTION: &str = "description";
    pub const ICON: &str = "icon";

    pub const SUNRISE: &str = "sunrise";
    pub const SUNSET: &str = "sunset";
    pub const COUNTRY: &str = "country";

    pub const TEMP: &str = "temp";
    pub const TEMP_MAX: &str = "temp_max";
    pub const TEMP_MIN: &str = "temp_min";
    pub const TEMP_MAX_ALIAS: &str = "tempMax";
    pub const TEMP_MIN_ALIAS: &str = "tempMin";
    pub const HUMIDITY: &str = "humidity";
    pub const PRESSURE: &str = "pressure";

    pub const SPEED: &str = "speed";
    pub const DEG: &str = "deg";
}
