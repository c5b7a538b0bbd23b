use crate::report;
use chrono::NaiveDateTime;
use fan_geo::raster::RasterGrid;
use fan_geo::roi::RoiIndex;
use fan_model::error::ModelError;
use fan_model::forecast::ForecastEntry;
use fan_model::recipient::Recipient;
use log::info;

/// One recipient's alert payload for one cycle.
///
/// `locations` preserves the order the recipient's subscriptions matched
/// forecast sources; an empty list means "no new alerts", not an omitted
/// recipient. Never mutated after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertData {
    pub emails: Vec<String>,
    pub whatsapp: Option<String>,
    pub locations: Vec<(String, Vec<ForecastEntry>)>,
}

/// An ROI-level alert from the raster pipeline, with town-level detail.
#[derive(Debug, Clone, PartialEq)]
pub struct RoiAlert {
    pub roi: String,
    pub peak: f64,
    pub towns: Vec<TownAlert>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TownAlert {
    pub town: String,
    pub peak: f64,
}

/// One delivery attempt produced by recipient fan-out.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    pub email: String,
    pub body: String,
}

/// The flood notifier engine state for one alert cycle.
///
/// Recipients and forecasts are rebuilt-and-replaced wholesale per cycle;
/// nothing here is mutated while alerts are being computed.
#[derive(Debug, Default)]
pub struct AlertProcessor {
    recipients: Vec<Recipient>,
    forecasts: Vec<(String, Vec<ForecastEntry>)>,
}

impl AlertProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recipients(&self) -> &[Recipient] {
        &self.recipients
    }

    /// Replace the recipient registry for this cycle.
    pub fn load_recipients(&mut self, recipients: Vec<Recipient>) {
        info!("loaded {} recipients", recipients.len());
        self.recipients = recipients;
    }

    /// Replace the forecast store wholesale; no partial merge. Location
    /// identifiers are folded to lower case to match subscription folding.
    pub fn load_forecasts(&mut self, forecasts: Vec<(String, Vec<ForecastEntry>)>) {
        self.forecasts = forecasts
            .into_iter()
            .map(|(location, entries)| (location.to_lowercase(), entries))
            .collect();
        info!("loaded forecasts for {} locations", self.forecasts.len());
    }

    /// Lazily yield one [`AlertData`] per recipient, in load order.
    ///
    /// A recipient none of whose subscribed locations has forecasts on
    /// file still yields an entry with an empty location list; whether to
    /// suppress empty alerts is delivery policy, not decided here.
    pub fn current_alerts(&self) -> impl Iterator<Item = AlertData> + '_ {
        self.recipients.iter().map(|recipient| {
            let locations = recipient
                .rois
                .iter()
                .filter_map(|roi| {
                    self.forecasts
                        .iter()
                        .find(|(location, _)| location == roi)
                        .cloned()
                })
                .collect();
            AlertData {
                emails: recipient.emails.clone(),
                whatsapp: recipient.phones.first().cloned(),
                locations,
            }
        })
    }
}

/// Compute ROI- and town-level alerts from a raster forecast grid.
///
/// Per ROI in match order: the grid is masked to the ROI boundary and the
/// maximum taken; a strictly positive maximum raises an ROI alert, and
/// each assigned town's buffered catchment is then tested the same way
/// independently.
pub fn raster_alerts(index: &RoiIndex, grid: &RasterGrid) -> Result<Vec<RoiAlert>, ModelError> {
    if index.is_empty() {
        return Err(ModelError::Precondition("no ROIs loaded"));
    }

    let mut alerts = Vec::new();
    for roi in index.rois() {
        let peak = match grid.masked_max(&roi.boundary) {
            Some(peak) if peak > 0.0 => peak,
            _ => continue,
        };
        let towns = roi
            .catchments
            .iter()
            .filter_map(|catchment| match grid.masked_max(&catchment.area) {
                Some(peak) if peak > 0.0 => Some(TownAlert {
                    town: catchment.name.clone(),
                    peak,
                }),
                _ => None,
            })
            .collect();
        alerts.push(RoiAlert {
            roi: roi.name.clone(),
            peak,
            towns,
        });
    }
    Ok(alerts)
}

/// Fan alerts out to subscribed recipients, one dispatch per email address.
///
/// Matching is case-insensitive on the ROI identifier. All dispatches for
/// one alert carry identical bodies.
pub fn fan_out(
    alerts: &[RoiAlert],
    recipients: &[Recipient],
    generated_at: NaiveDateTime,
) -> Vec<Dispatch> {
    let mut dispatches = Vec::new();
    for alert in alerts {
        let body = report::compose_roi_report(alert, generated_at);
        for recipient in recipients {
            if !recipient.subscribes_to(&alert.roi) {
                continue;
            }
            for email in &recipient.emails {
                dispatches.push(Dispatch {
                    email: email.clone(),
                    body: body.clone(),
                });
            }
        }
    }
    dispatches
}

#[cfg(test)]
mod tests {
    use super::{fan_out, raster_alerts, AlertProcessor};
    use chrono::NaiveDate;
    use fan_geo::raster::RasterGrid;
    use fan_geo::roi::{RoiIndex, Town};
    use fan_model::error::ModelError;
    use fan_model::forecast::ForecastEntry;
    use fan_model::recipient::{Expertise, Recipient};
    use geo_types::{polygon, Point, Polygon};

    fn recipient(name: &str, rois: &[&str], emails: &[&str]) -> Recipient {
        Recipient {
            name: name.to_string(),
            rois: rois.iter().map(|r| r.to_lowercase()).collect(),
            expertise: Expertise::Basic,
            emails: emails.iter().map(|e| e.to_string()).collect(),
            phones: vec!["+233200000001".to_string()],
        }
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

    fn square(x0: f64, y0: f64, side: f64) -> Polygon<f64> {
        polygon![
            (x: x0, y: y0),
            (x: x0 + side, y: y0),
            (x: x0 + side, y: y0 + side),
            (x: x0, y: y0 + side),
            (x: x0, y: y0),
        ]
    }

    #[test]
    fn test_recipient_without_forecasts_still_yields_alert_data() {
        let mut processor = AlertProcessor::new();
        processor.load_recipients(vec![recipient("Ama", &["oxbow"], &["a@x.com"])]);
        processor.load_forecasts(vec![("riverdale".to_string(), vec![entry(1, 2.0)])]);

        let alerts: Vec<_> = processor.current_alerts().collect();
        assert_eq!(alerts.len(), 1);
        assert!(alerts[0].locations.is_empty());
        assert_eq!(alerts[0].emails, vec!["a@x.com"]);
    }

    #[test]
    fn test_case_variant_subscriptions_both_match() {
        let mut processor = AlertProcessor::new();
        processor.load_recipients(vec![
            recipient("Upper", &["RIVERDALE"], &["a@x.com"]),
            recipient("Lower", &["riverdale"], &["b@x.com"]),
        ]);
        processor.load_forecasts(vec![("Riverdale".to_string(), vec![entry(1, 2.0)])]);

        for alert in processor.current_alerts() {
            assert_eq!(alert.locations.len(), 1);
            assert_eq!(alert.locations[0].0, "riverdale");
        }
    }

    #[test]
    fn test_locations_mapping_has_one_entry_per_location() {
        let mut processor = AlertProcessor::new();
        let parsed = Recipient::load_csv(
            "name,rois,expertise,email,phone\nAma,riverdale; riverdale,1,a@x.com,\n",
        )
        .unwrap();
        processor.load_recipients(parsed);
        processor.load_forecasts(vec![("riverdale".to_string(), vec![entry(1, 2.0)])]);

        let alert = processor.current_alerts().next().unwrap();
        assert_eq!(alert.locations.len(), 1);
        assert_eq!(alert.locations[0].0, "riverdale");
    }

    #[test]
    fn test_locations_follow_subscription_order() {
        let mut processor = AlertProcessor::new();
        processor.load_recipients(vec![recipient(
            "Ama",
            &["oxbow", "riverdale"],
            &["a@x.com"],
        )]);
        processor.load_forecasts(vec![
            ("riverdale".to_string(), vec![entry(1, 2.0)]),
            ("oxbow".to_string(), vec![entry(1, 0.5)]),
        ]);

        let alert = processor.current_alerts().next().unwrap();
        let names: Vec<&str> = alert.locations.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["oxbow", "riverdale"]);
    }

    #[test]
    fn test_raster_alert_fan_out_per_email_address() {
        let mut index =
            RoiIndex::from_boundaries([("riverdale".to_string(), square(0.0, 0.0, 30_000.0))]);
        index
            .assign_towns(&[Town {
                name: "elmview".to_string(),
                point: Point::new(15_000.0, 15_000.0),
            }])
            .unwrap();

        // One positive cell at the grid center, inside both the ROI and
        // the town's catchment.
        #[rustfmt::skip]
        let cells = vec![
            0.0, 0.0, 0.0,
            0.0, 1.5, 0.0,
            0.0, 0.0, 0.0,
        ];
        let grid = RasterGrid::new(3, 3, (0.0, 0.0), 10_000.0, None, cells).unwrap();

        let alerts = raster_alerts(&index, &grid).unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].peak, 1.5);
        assert_eq!(alerts[0].towns.len(), 1);
        assert_eq!(alerts[0].towns[0].town, "elmview");

        let recipients = vec![recipient("Ama", &["RIVERDALE"], &["a@x.com", "b@x.com"])];
        let generated_at = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(6, 0, 0)
            .unwrap();
        let dispatches = fan_out(&alerts, &recipients, generated_at);
        assert_eq!(dispatches.len(), 2);
        assert_eq!(dispatches[0].email, "a@x.com");
        assert_eq!(dispatches[1].email, "b@x.com");
        assert_eq!(dispatches[0].body, dispatches[1].body);
    }

    #[test]
    fn test_quiet_raster_raises_no_alerts() {
        let index =
            RoiIndex::from_boundaries([("riverdale".to_string(), square(0.0, 0.0, 30.0))]);
        let grid = RasterGrid::new(3, 3, (0.0, 0.0), 10.0, None, vec![0.0; 9]).unwrap();
        assert!(raster_alerts(&index, &grid).unwrap().is_empty());
    }

    #[test]
    fn test_raster_alerts_without_rois_is_precondition_error() {
        let grid = RasterGrid::new(1, 1, (0.0, 0.0), 10.0, None, vec![1.0]).unwrap();
        assert!(matches!(
            raster_alerts(&RoiIndex::new(), &grid),
            Err(ModelError::Precondition("no ROIs loaded"))
        ));
    }
}
