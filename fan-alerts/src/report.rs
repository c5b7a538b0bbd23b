use crate::processor::RoiAlert;
use chrono::NaiveDateTime;
use fan_model::forecast::ForecastEntry;

const BANNER: &str = "Flood Forecast Alert";
const WIDTH: usize = 75;
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DAY_FORMAT: &str = "%d-%b-%Y";

/// Compose the per-recipient forecast alert report.
///
/// The timestamp is caller-supplied so report text is deterministic. The
/// `Locations` summary line is sorted and title-cased; the detail sections
/// below it keep the payload's insertion order.
pub fn compose_forecast_report(
    locations: &[(String, Vec<ForecastEntry>)],
    generated_at: NaiveDateTime,
) -> String {
    let mut affected: Vec<String> = locations
        .iter()
        .map(|(name, _)| title_case(name))
        .collect();
    affected.sort();
    affected.dedup();
    let summary = if affected.is_empty() {
        "NO NEW ALERTS".to_string()
    } else {
        affected.join(", ")
    };

    let mut lines = vec![
        format!(" {:=^WIDTH$} ", ""),
        String::new(),
        format!(" {BANNER: ^WIDTH$} "),
        String::new(),
        format!(" {: <16}: {} ", "Generated on", generated_at.format(TIMESTAMP_FORMAT)),
        format!(" {: <16}: {summary} ", "Locations"),
        String::new(),
        format!(" {:=^WIDTH$} ", ""),
        String::new(),
    ];

    for (idx, (name, forecasts)) in locations.iter().enumerate() {
        if idx > 0 {
            lines.push(format!("{:-<WIDTH$}", ""));
            lines.push(String::new());
        }
        lines.push(format!(" {: <16}: {}", "Location", title_case(name)));
        if let Some(max) = forecasts.iter().max_by(|a, b| {
            a.corrected
                .partial_cmp(&b.corrected)
                .unwrap_or(std::cmp::Ordering::Equal)
        }) {
            lines.push(format!(
                " {: <16}: {} ({:.2})  on {}",
                "Max Alert Level",
                max.alert_level(),
                max.corrected,
                max.date.format(DAY_FORMAT)
            ));
        }
        lines.push(String::new());
        lines.push(format!(" {: <11} | {: >11} | {: <14}", "Date", "Discharge", "Alert Level"));
        lines.push(format!("-{:-<11}-|-{:->11}-|-{:-<14}", "", "", ""));
        for forecast in forecasts {
            lines.push(format!(
                " {: <11} | {: >11.2} | {: <14}",
                forecast.date.format(DAY_FORMAT).to_string(),
                forecast.corrected,
                forecast.alert_level().to_string()
            ));
        }
        lines.push(String::new());
    }

    lines.push(format!(" {:=^WIDTH$} ", ""));
    lines.join("\n")
}

/// Compose the ROI alert report for the raster pipeline.
///
/// Lists the peak masked reading for the ROI and an affected-communities
/// table of per-town peaks, sorted by town name.
pub fn compose_roi_report(alert: &RoiAlert, generated_at: NaiveDateTime) -> String {
    let mut lines = vec![
        format!(" {:=^WIDTH$} ", ""),
        String::new(),
        format!(" {BANNER: ^WIDTH$} "),
        String::new(),
        format!(" {: <16}: {} ", "Generated on", generated_at.format(TIMESTAMP_FORMAT)),
        format!(" {: <16}: {}", "Location", title_case(&alert.roi)),
        format!(" {: <16}: {:.2}", "Max Reading", alert.peak),
        String::new(),
        " Affected Communities:".to_string(),
        format!("{:-<22}", ""),
        String::new(),
        format!(" {: <40} {: >10}", "Name", "Reading"),
    ];

    let mut towns = alert.towns.clone();
    towns.sort_by(|a, b| a.town.cmp(&b.town));
    for town in &towns {
        lines.push(format!(" {: <40} {: >10.2}", title_case(&town.town), town.peak));
    }

    lines.push(String::new());
    lines.push(format!(" {:=^WIDTH$} ", ""));
    lines.join("\n")
}

/// Title-case a location identifier for display: "new oxbow" -> "New Oxbow".
fn title_case(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::{compose_forecast_report, compose_roi_report, title_case};
    use crate::processor::{RoiAlert, TownAlert};
    use chrono::{NaiveDate, NaiveDateTime};
    use fan_model::forecast::ForecastEntry;

    fn generated_at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 3)
            .unwrap()
            .and_hms_opt(6, 30, 0)
            .unwrap()
    }

    fn entry(day: u32, corrected: f64) -> ForecastEntry {
        ForecastEntry {
            date: NaiveDate::from_ymd_opt(2024, 6, day)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            mean: corrected,
            corrected,
            thresholds: [1.0, 2.0, 3.0, 4.0],
        }
    }

    #[test]
    fn test_empty_report_flags_no_new_alerts() {
        let report = compose_forecast_report(&[], generated_at());
        assert!(report.contains("NO NEW ALERTS"));
        assert!(report.contains("Generated on"));
        assert!(report.contains("2024-06-03 06:30:00"));
    }

    #[test]
    fn test_summary_is_sorted_but_sections_keep_insertion_order() {
        let locations = vec![
            ("riverdale".to_string(), vec![entry(1, 0.5), entry(2, 2.0)]),
            ("oxbow".to_string(), vec![entry(1, 5.0)]),
        ];
        let report = compose_forecast_report(&locations, generated_at());

        assert!(report.contains("Locations       : Oxbow, Riverdale"));
        // Detail sections are not re-sorted.
        let riverdale = report.find("Location        : Riverdale").unwrap();
        let oxbow = report.find("Location        : Oxbow").unwrap();
        assert!(riverdale < oxbow);
    }

    #[test]
    fn test_max_alert_summary_and_per_entry_rows() {
        let locations = vec![(
            "riverdale".to_string(),
            vec![entry(1, 0.5), entry(2, 2.0)],
        )];
        let report = compose_forecast_report(&locations, generated_at());

        assert!(report.contains("Max Alert Level : YELLOW (2.00)  on 02-Jun-2024"));
        assert!(report.contains("01-Jun-2024 |        0.50 | GREEN"));
        assert!(report.contains("02-Jun-2024 |        2.00 | YELLOW"));
    }

    #[test]
    fn test_off_the_chart_entry_reports_unknown() {
        let locations = vec![("oxbow".to_string(), vec![entry(1, 5.0)])];
        let report = compose_forecast_report(&locations, generated_at());
        assert!(report.contains("Max Alert Level : UNKNOWN (5.00)  on 01-Jun-2024"));
    }

    #[test]
    fn test_roi_report_sorts_towns_by_name() {
        let alert = RoiAlert {
            roi: "riverdale".to_string(),
            peak: 2.5,
            towns: vec![
                TownAlert {
                    town: "zinder".to_string(),
                    peak: 1.0,
                },
                TownAlert {
                    town: "elmview".to_string(),
                    peak: 2.5,
                },
            ],
        };
        let report = compose_roi_report(&alert, generated_at());

        assert!(report.contains("Location        : Riverdale"));
        assert!(report.contains("Max Reading     : 2.50"));
        let elmview = report.find("Elmview").unwrap();
        let zinder = report.find("Zinder").unwrap();
        assert!(elmview < zinder);
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("riverdale"), "Riverdale");
        assert_eq!(title_case("new OXBOW crossing"), "New Oxbow Crossing");
    }
}
