use std::fmt;

use anyhow::Context;
use chrono::{DateTime, Utc};
use weather_core::{WeatherReport, encode_reports};

pub fn print_reports(reports: &[WeatherReport], json: bool) -> anyhow::Result<()> {
    if json {
        let doc = encode_reports(reports).context("Failed to encode weather reports")?;
        println!("{doc}");
        return Ok(());
    }

    for (idx, report) in reports.iter().enumerate() {
        if idx > 0 {
            println!();
        }
        print!("{}", ReportView(report));
    }
    Ok(())
}

/// Human-readable rendering of one report.
pub struct ReportView<'a>(pub &'a WeatherReport);

impl fmt::Display for ReportView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;

        match &report.sys {
            Some(sys) if !sys.country_code.is_empty() => {
                writeln!(f, "{}, {}", report.location_name, sys.country_code)?
            }
            _ => writeln!(f, "{}", report.location_name)?,
        }
        writeln!(
            f,
            "  observed:    {}",
            format_epoch(report.timestamp, "%Y-%m-%d %H:%M UTC")
        )?;

        if let Some(condition) = report.primary_condition() {
            writeln!(
                f,
                "  conditions:  {} ({})",
                condition.main, condition.description
            )?;
        }

        if let Some(main) = &report.main {
            writeln!(f, "  temperature: {:.1} °C", main.temperature)?;
            writeln!(f, "  humidity:    {} %", main.humidity)?;
            writeln!(f, "  pressure:    {} hPa", main.pressure)?;
        }

        if let Some(wind) = &report.wind {
            writeln!(f, "  wind:        {:.1} m/s from {}°", wind.speed, wind.degree)?;
        }

        if let Some(sys) = &report.sys {
            writeln!(f, "  sunrise:     {}", format_epoch(sys.sunrise, "%H:%M UTC"))?;
            writeln!(f, "  sunset:      {}", format_epoch(sys.sunset, "%H:%M UTC"))?;
        }

        Ok(())
    }
}

/// Format epoch seconds; values chrono cannot place are shown raw.
fn format_epoch(ts: i64, pattern: &str) -> String {
    DateTime::<Utc>::from_timestamp(ts, 0)
        .map(|dt| dt.format(pattern).to_string())
        .unwrap_or_else(|| ts.to_string())
}
