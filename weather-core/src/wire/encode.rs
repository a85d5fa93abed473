use crate::model::WeatherReport;

/// Write reports as a wire document: a JSON array of report objects.
pub fn encode_reports(reports: &[WeatherReport]) -> serde_json::Result<String> {
    serde_json::to_string(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MainInfo, WindInfo};

    #[test]
    fn uses_wire_member_names() {
        let report = WeatherReport {
            location_name: "Oslo".into(),
            timestamp: 42,
            status_code: 200,
            sys: None,
            main: Some(MainInfo {
                temperature: 1.5,
                humidity: 70,
                pressure: 1000.0,
            }),
            wind: Some(WindInfo {
                speed: 2.0,
                degree: 90.0,
            }),
            conditions: Vec::new(),
        };

        let value: serde_json::Value =
            serde_json::from_str(&encode_reports(&[report]).unwrap()).unwrap();

        let entry = &value[0];
        assert_eq!(entry["name"], "Oslo");
        assert_eq!(entry["dt"], 42);
        assert_eq!(entry["cod"], 200);
        assert_eq!(entry["main"]["temp"], 1.5);
        assert_eq!(entry["wind"]["deg"], 90.0);
        assert!(entry.get("sys").is_none());
        assert!(entry["weather"].as_array().unwrap().is_empty());
    }
}
