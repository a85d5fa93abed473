use std::fmt;
use std::marker::PhantomData;

use chrono::Utc;
use serde::de::{
    self, Deserialize, Deserializer, IgnoredAny, MapAccess, SeqAccess, Unexpected, Visitor,
};
use tracing::trace;

use crate::error::DecodeError;
use crate::model::{Condition, MainInfo, SysInfo, WeatherReport, WindInfo};

use super::keys;

/// Decode a complete wire document into its reports.
///
/// The document is either an array of report objects or a single report
/// object; `{}` and `[]` both decode to an empty list. Anything after the
/// document other than whitespace is an error.
pub fn decode_reports(text: &str) -> Result<Vec<WeatherReport>, DecodeError> {
    let mut deserializer = serde_json::Deserializer::from_str(text);
    let reports = read_reports(&mut deserializer)?;
    deserializer.end()?;
    Ok(reports)
}

/// Read the reports of the next value in `deserializer`.
pub fn read_reports<'de, D>(deserializer: D) -> Result<Vec<WeatherReport>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(DocumentVisitor)
}

struct DocumentVisitor;

impl<'de> Visitor<'de> for DocumentVisitor {
    type Value = Vec<WeatherReport>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a weather report or an array of weather reports")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut reports = Vec::new();
        while let Some(report) = seq.next_element()? {
            reports.push(report);
        }
        Ok(reports)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        match map.next_key::<String>()? {
            None => Ok(Vec::new()),
            first => Ok(vec![read_members(first, &mut map)?]),
        }
    }
}

/// An object of the wire document, filled in member by member from its
/// defaults.
trait Section: Sized {
    const EXPECTING: &'static str;

    fn empty() -> Self;

    /// Read the value of `name`. Returns `false` for members this section
    /// does not know, leaving the value unread.
    fn read_member<'de, A: MapAccess<'de>>(
        &mut self,
        name: &str,
        map: &mut A,
    ) -> Result<bool, A::Error>;
}

/// Members of an already opened object, starting at `key`.
fn read_members<'de, T, A>(mut key: Option<String>, map: &mut A) -> Result<T, A::Error>
where
    T: Section,
    A: MapAccess<'de>,
{
    let mut section = T::empty();
    while let Some(name) = key {
        if !section.read_member(&name, map)? {
            trace!(%name, "skipping unknown member");
            map.next_value::<IgnoredAny>()?;
        }
        key = map.next_key()?;
    }
    Ok(section)
}

struct SectionVisitor<T>(PhantomData<T>);

impl<'de, T: Section> Visitor<'de> for SectionVisitor<T> {
    type Value = T;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(T::EXPECTING)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<T, A::Error> {
        let first = map.next_key()?;
        read_members(first, &mut map)
    }
}

macro_rules! deserialize_section {
    ($($ty:ty),* $(,)?) => {
        $(
            impl<'de> Deserialize<'de> for $ty {
                fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                    deserializer.deserialize_map(SectionVisitor(PhantomData))
                }
            }
        )*
    };
}

deserialize_section!(WeatherReport, Condition, SysInfo, MainInfo, WindInfo);

impl Section for WeatherReport {
    const EXPECTING: &'static str = "a weather report object";

    fn empty() -> Self {
        WeatherReport {
            location_name: String::new(),
            timestamp: Utc::now().timestamp_millis(),
            status_code: 0,
            sys: None,
            main: None,
            wind: None,
            conditions: Vec::new(),
        }
    }

    fn read_member<'de, A: MapAccess<'de>>(
        &mut self,
        name: &str,
        map: &mut A,
    ) -> Result<bool, A::Error> {
        match name {
            keys::NAME => self.location_name = next_string(map)?,
            keys::DT => self.timestamp = next_i64(map)?,
            keys::COD => self.status_code = next_i64(map)?,
            // `null` stands for an absent section.
            keys::WEATHER => {
                self.conditions = map.next_value::<Option<Vec<Condition>>>()?.unwrap_or_default();
            }
            keys::SYS => self.sys = map.next_value()?,
            keys::MAIN => self.main = map.next_value()?,
            keys::WIND => self.wind = map.next_value()?,
            _ => return Ok(false),
        }
        Ok(true)
    }
}

impl Section for Condition {
    const EXPECTING: &'static str = "a weather condition object";

    fn empty() -> Self {
        Condition {
            id: Condition::UNKNOWN_ID,
            main: String::new(),
            description: String::new(),
            icon: String::new(),
        }
    }

    fn read_member<'de, A: MapAccess<'de>>(
        &mut self,
        name: &str,
        map: &mut A,
    ) -> Result<bool, A::Error> {
        match name {
            keys::ID => self.id = next_i64(map)?,
            keys::MAIN => self.main = next_string(map)?,
            keys::DESCRIPTION => self.description = next_string(map)?,
            keys::ICON => self.icon = next_string(map)?,
            _ => return Ok(false),
        }
        Ok(true)
    }
}

impl Section for SysInfo {
    const EXPECTING: &'static str = "a sys object";

    fn empty() -> Self {
        SysInfo {
            sunrise: 0,
            sunset: 0,
            country_code: String::new(),
        }
    }

    fn read_member<'de, A: MapAccess<'de>>(
        &mut self,
        name: &str,
        map: &mut A,
    ) -> Result<bool, A::Error> {
        match name {
            keys::SUNRISE => self.sunrise = next_i64(map)?,
            keys::SUNSET => self.sunset = next_i64(map)?,
            keys::COUNTRY => self.country_code = next_string(map)?,
            _ => return Ok(false),
        }
        Ok(true)
    }
}

impl Section for MainInfo {
    const EXPECTING: &'static str = "a main object";

    fn empty() -> Self {
        MainInfo {
            temperature: 0.0,
            humidity: 0,
            pressure: 0.0,
        }
    }

    fn read_member<'de, A: MapAccess<'de>>(
        &mut self,
        name: &str,
        map: &mut A,
    ) -> Result<bool, A::Error> {
        match name {
            // All temperature variants land in the one field; the last one read wins.
            keys::TEMP
            | keys::TEMP_MAX
            | keys::TEMP_MIN
            | keys::TEMP_MAX_ALIAS
            | keys::TEMP_MIN_ALIAS => self.temperature = next_f64(map)?,
            keys::HUMIDITY => self.humidity = next_i64(map)?,
            keys::PRESSURE => self.pressure = next_f64(map)?,
            _ => return Ok(false),
        }
        Ok(true)
    }
}

impl Section for WindInfo {
    const EXPECTING: &'static str = "a wind object";

    fn empty() -> Self {
        WindInfo {
            speed: 0.0,
            degree: 0.0,
        }
    }

    fn read_member<'de, A: MapAccess<'de>>(
        &mut self,
        name: &str,
        map: &mut A,
    ) -> Result<bool, A::Error> {
        match name {
            keys::SPEED => self.speed = next_f64(map)?,
            keys::DEG => self.degree = next_f64(map)?,
            _ => return Ok(false),
        }
        Ok(true)
    }
}

fn next_string<'de, A: MapAccess<'de>>(map: &mut A) -> Result<String, A::Error> {
    map.next_value::<LenientString>().map(|value| value.0)
}

fn next_i64<'de, A: MapAccess<'de>>(map: &mut A) -> Result<i64, A::Error> {
    map.next_value::<LenientI64>().map(|value| value.0)
}

fn next_f64<'de, A: MapAccess<'de>>(map: &mut A) -> Result<f64, A::Error> {
    map.next_value::<LenientF64>().map(|value| value.0)
}

/// A string; bare numbers are taken as their text.
struct LenientString(String);

/// An integer; integral floats and quoted numbers are accepted.
struct LenientI64(i64);

/// A finite number, bare or quoted.
struct LenientF64(f64);

fn integral(value: f64) -> Option<i64> {
    let in_range = value >= i64::MIN as f64 && value < i64::MAX as f64;
    (value.is_finite() && value.fract() == 0.0 && in_range).then_some(value as i64)
}

impl<'de> Deserialize<'de> for LenientString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct StringVisitor;

        impl Visitor<'_> for StringVisitor {
            type Value = String;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a string or a number")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
                Ok(v.to_owned())
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<String, E> {
                Ok(v)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
                Ok(v.to_string())
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
                Ok(v.to_string())
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<String, E> {
                Ok(v.to_string())
            }
        }

        deserializer.deserialize_any(StringVisitor).map(LenientString)
    }
}

impl<'de> Deserialize<'de> for LenientI64 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct I64Visitor;

        impl Visitor<'_> for I64Visitor {
            type Value = i64;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an integer")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<i64, E> {
                Ok(v)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<i64, E> {
                i64::try_from(v).map_err(|_| E::invalid_value(Unexpected::Unsigned(v), &self))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<i64, E> {
                integral(v).ok_or_else(|| E::invalid_value(Unexpected::Float(v), &self))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<i64, E> {
                if let Ok(parsed) = v.parse::<i64>() {
                    return Ok(parsed);
                }
                v.parse::<f64>()
                    .ok()
                    .and_then(integral)
                    .ok_or_else(|| E::invalid_value(Unexpected::Str(v), &self))
            }
        }

        deserializer.deserialize_any(I64Visitor).map(LenientI64)
    }
}

impl<'de> Deserialize<'de> for LenientF64 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct F64Visitor;

        impl Visitor<'_> for F64Visitor {
            type Value = f64;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a number")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
                Ok(v as f64)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
                Ok(v as f64)
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
                Ok(v)
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
                v.parse::<f64>()
                    .ok()
                    .filter(|parsed| parsed.is_finite())
                    .ok_or_else(|| E::invalid_value(Unexpected::Str(v), &self))
            }
        }

        deserializer.deserialize_any(F64Visitor).map(LenientF64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeErrorKind;
    use crate::wire::encode_reports;

    #[test]
    fn decodes_single_report_object() {
        let doc = r#"{"name":"Nashville","dt":1000,"cod":200,"weather":[{"id":1,"main":"Clear","description":"clear sky","icon":"01d"}]}"#;

        let reports = decode_reports(doc).expect("document should decode");
        assert_eq!(reports.len(), 1);

        let report = &reports[0];
        assert_eq!(report.location_name, "Nashville");
        assert_eq!(report.timestamp, 1000);
        assert_eq!(report.status_code, 200);
        assert_eq!(
            report.conditions,
            vec![Condition {
                id: 1,
                main: "Clear".into(),
                description: "clear sky".into(),
                icon: "01d".into(),
            }]
        );
        assert!(report.sys.is_none());
        assert!(report.main.is_none());
        assert!(report.wind.is_none());
    }

    #[test]
    fn empty_documents_decode_to_empty_list() {
        assert!(decode_reports("{}").unwrap().is_empty());
        assert!(decode_reports(" [ ] ").unwrap().is_empty());
    }

    #[test]
    fn decodes_array_of_reports_in_order() {
        let doc = r#"[{"name":"A","dt":1},{"name":"B","dt":2}]"#;
        let names: Vec<_> = decode_reports(doc)
            .unwrap()
            .into_iter()
            .map(|r| r.location_name)
            .collect();
        assert_eq!(names, ["A", "B"]);
    }

    #[test]
    fn decodes_nested_sections_and_skips_unknown_members() {
        let doc = r#"{
            "coord": {"lon": -86.78, "lat": 36.17},
            "weather": [{"id": 800, "main": "Clear", "description": "clear sky", "icon": "01n", "extra": [1, 2]}],
            "base": "stations",
            "main": {"temp": 21.5, "feels_like": 20.9, "pressure": 1017, "humidity": 40},
            "visibility": 10000,
            "wind": {"speed": 3.6, "deg": 190, "gust": 5.1},
            "sys": {"type": 2, "id": 2031, "country": "US", "sunrise": 1600000000, "sunset": 1600044000},
            "name": "Nashville",
            "dt": 1600020000,
            "cod": 200
        }"#;

        let report = decode_reports(doc).unwrap().remove(0);

        assert_eq!(
            report.sys,
            Some(SysInfo {
                sunrise: 1_600_000_000,
                sunset: 1_600_044_000,
                country_code: "US".into(),
            })
        );
        assert_eq!(
            report.main,
            Some(MainInfo {
                temperature: 21.5,
                humidity: 40,
                pressure: 1017.0,
            })
        );
        assert_eq!(
            report.wind,
            Some(WindInfo {
                speed: 3.6,
                degree: 190.0,
            })
        );
        assert_eq!(report.conditions[0].id, 800);
        assert_eq!(report.timestamp, 1_600_020_000);
    }

    #[test]
    fn temperature_aliases_last_one_wins() {
        let doc = r#"{"main":{"temp":10.0,"temp_max":12.5,"humidity":1,"tempMin":8.25}}"#;
        let main = decode_reports(doc).unwrap().remove(0).main.unwrap();
        assert_eq!(main.temperature, 8.25);
        assert_eq!(main.humidity, 1);
    }

    #[test]
    fn absent_fields_take_defaults() {
        let before = Utc::now().timestamp_millis();
        let doc = r#"{"cod":"404","weather":[{"main":"Rain"}],"sys":null,"wind":null}"#;
        let report = decode_reports(doc).unwrap().remove(0);

        assert_eq!(report.location_name, "");
        assert_eq!(report.status_code, 404);
        assert!(report.timestamp >= before);
        assert_eq!(report.conditions[0].id, Condition::UNKNOWN_ID);
        assert_eq!(report.conditions[0].description, "");
        assert!(report.sys.is_none());
        assert!(report.wind.is_none());
    }

    #[test]
    fn null_weather_is_empty() {
        let report = decode_reports(r#"{"name":"X","weather":null}"#)
            .unwrap()
            .remove(0);
        assert!(report.conditions.is_empty());
    }

    #[test]
    fn truncated_document_fails_without_partial_report() {
        let err = decode_reports(r#"{"name":"Nashville","main":{"temp":1"#).unwrap_err();
        assert_eq!(err.kind, DecodeErrorKind::Eof);
    }

    #[test]
    fn wrong_shape_for_known_member_fails() {
        let err = decode_reports(r#"{"name":"X","main":[1,2]}"#).unwrap_err();
        assert_eq!(err.kind, DecodeErrorKind::Data);
    }

    #[test]
    fn malformed_numbers_in_skipped_members_fail() {
        for doc in [
            r#"{"name":"X","visibility":1-2-3}"#,
            r#"{"name":"X","visibility":-}"#,
            r#"{"name":"X","visibility":1.2.3e+-}"#,
            r#"{"name":"X","coord":{"lon":01}}"#,
        ] {
            let err = decode_reports(doc).expect_err(doc);
            assert_eq!(err.kind, DecodeErrorKind::Syntax, "{doc}");
        }
    }

    #[test]
    fn malformed_numbers_in_known_members_fail() {
        for doc in [
            r#"{"name":"X","dt":01}"#,
            r#"{"name":"X","dt":1.2.3}"#,
            r#"{"main":{"temp":+1}}"#,
            r#"{"wind":{"speed":.5}}"#,
        ] {
            assert!(decode_reports(doc).is_err(), "{doc} should not decode");
        }
    }

    #[test]
    fn unusable_scalars_in_known_members_fail() {
        for doc in [
            r#"{"dt":1.5}"#,
            r#"{"dt":"soon"}"#,
            r#"{"cod":true}"#,
            r#"{"main":{"temp":"warm"}}"#,
            r#"{"name":["X"]}"#,
        ] {
            let err = decode_reports(doc).expect_err(doc);
            assert_eq!(err.kind, DecodeErrorKind::Data, "{doc}");
        }
    }

    #[test]
    fn lenient_numbers_are_accepted() {
        let doc = r#"{"name":42,"dt":"1000","cod":200.0,"main":{"temp":"1.5","humidity":"7","pressure":1013}}"#;
        let report = decode_reports(doc).unwrap().remove(0);

        assert_eq!(report.location_name, "42");
        assert_eq!(report.timestamp, 1000);
        assert_eq!(report.status_code, 200);
        let main = report.main.unwrap();
        assert_eq!(main.temperature, 1.5);
        assert_eq!(main.humidity, 7);
        assert_eq!(main.pressure, 1013.0);
    }

    #[test]
    fn string_escapes_are_decoded() {
        let doc = r#"{"name":"a\"b\\c\/d\n\u00e9\ud83d\ude00"}"#;
        let report = decode_reports(doc).unwrap().remove(0);
        assert_eq!(report.location_name, "a\"b\\c/d\n\u{e9}\u{1f600}");
    }

    #[test]
    fn trailing_data_is_rejected() {
        let err = decode_reports("{}\n  x").unwrap_err();
        assert_eq!(err.kind, DecodeErrorKind::Syntax);
        assert_eq!(err.line, 2);

        assert!(decode_reports(r#"[{"name":"X"},]"#).is_err());
    }

    #[test]
    fn non_document_values_are_rejected() {
        for doc in ["\"Nashville\"", "42", "null", ""] {
            assert!(decode_reports(doc).is_err(), "{doc:?} should not decode");
        }
    }

    #[test]
    fn reports_deserialize_through_serde() {
        let report: WeatherReport =
            serde_json::from_str(r#"{"name":"X","dt":"5","weather":[{"icon":"01d"}]}"#).unwrap();
        assert_eq!(report.timestamp, 5);
        assert_eq!(report.conditions[0].id, Condition::UNKNOWN_ID);

        let value = serde_json::json!([{"name": "A"}, {"name": "B"}]);
        assert_eq!(read_reports(value).unwrap().len(), 2);
    }

    #[test]
    fn encoded_report_decodes_to_same_values() {
        let report = WeatherReport {
            location_name: "Zürich \"Altstadt\"".into(),
            timestamp: 1_700_000_000,
            status_code: 200,
            sys: Some(SysInfo {
                sunrise: 1_699_990_000,
                sunset: 1_700_030_000,
                country_code: "CH".into(),
            }),
            main: Some(MainInfo {
                temperature: -3.75,
                humidity: 87,
                pressure: 1021.5,
            }),
            wind: Some(WindInfo {
                speed: 12.25,
                degree: 275.0,
            }),
            conditions: vec![
                Condition {
                    id: 600,
                    main: "Snow".into(),
                    description: "light snow".into(),
                    icon: "13d".into(),
                },
                Condition {
                    id: 701,
                    main: "Mist".into(),
                    description: "mist".into(),
                    icon: "50d".into(),
                },
            ],
        };

        let text = encode_reports(std::slice::from_ref(&report)).unwrap();
        let decoded = decode_reports(&text).unwrap();

        assert_eq!(decoded, vec![report]);
    }
}
