use crate::error::ModelError;
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};

/// Columns a recipient CSV must provide.
pub const CSV_FIELDS: [&str; 5] = ["name", "rois", "expertise", "email", "phone"];

/// Level of expertise of an alert recipient, ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Expertise {
    Basic,
    Intermediate,
    Expert,
}

impl TryFrom<i64> for Expertise {
    type Error = ();

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Expertise::Basic),
            1 => Ok(Expertise::Intermediate),
            2 => Ok(Expertise::Expert),
            _ => Err(()),
        }
    }
}

/// A registered flood alert recipient.
///
/// ROI identifiers are lower-cased at parse time so lookups are
/// case-insensitive by construction. Duplicate CSV rows yield duplicate
/// recipients: each row is an independent subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipient {
    pub name: String,
    /// Subscribed ROI identifiers, lower-cased, in subscription order.
    pub rois: Vec<String>,
    pub expertise: Expertise,
    pub emails: Vec<String>,
    pub phones: Vec<String>,
}

impl Recipient {
    /// Case-insensitive subscription test against an ROI identifier.
    pub fn subscribes_to(&self, roi: &str) -> bool {
        let folded = roi.to_lowercase();
        self.rois.iter().any(|r| *r == folded)
    }

    /// Load recipients from CSV text with the columns in [`CSV_FIELDS`].
    ///
    /// The `rois`, `email` and `phone` cells hold `;`-delimited
    /// multi-values. A missing column aborts the load with
    /// [`ModelError::Schema`]; a malformed row aborts it with
    /// [`ModelError::Record`] naming the row. An alert system must not
    /// silently drop subscribers, so rows are never skipped.
    pub fn load_csv(text: &str) -> Result<Vec<Recipient>, ModelError> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let headers = rdr
            .headers()
            .map_err(|e| ModelError::Schema(e.to_string()))?
            .clone();
        let column = |field: &str| {
            headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(field))
        };

        let missing: Vec<&str> = CSV_FIELDS
            .iter()
            .copied()
            .filter(|f| column(f).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(ModelError::Schema(missing.join(", ")));
        }
        let columns: Vec<usize> = CSV_FIELDS.iter().map(|f| column(f).unwrap()).collect();
        let (name_col, rois_col, expertise_col, email_col, phone_col) =
            (columns[0], columns[1], columns[2], columns[3], columns[4]);

        let mut recipients = Vec::new();
        for (idx, result) in rdr.records().enumerate() {
            let row = idx + 1;
            let record = result.map_err(|e| ModelError::Record {
                row,
                reason: e.to_string(),
            })?;
            let field = |col: usize| record.get(col).unwrap_or_default();

            let name = field(name_col).to_string();
            if name.is_empty() {
                return Err(ModelError::Record {
                    row,
                    reason: "empty recipient name".to_string(),
                });
            }

            let expertise_raw = field(expertise_col);
            let expertise = expertise_raw
                .parse::<i64>()
                .ok()
                .and_then(|n| Expertise::try_from(n).ok())
                .ok_or_else(|| ModelError::Record {
                    row,
                    reason: format!("invalid expertise level {expertise_raw:?}"),
                })?;

            // Duplicate fragments within one cell would leak duplicate
            // keys into the per-recipient location mapping downstream.
            let mut rois: Vec<String> = Vec::new();
            for roi in split_multi(field(rois_col)).map(|s| s.to_lowercase()) {
                if !rois.contains(&roi) {
                    rois.push(roi);
                }
            }
            if rois.is_empty() {
                return Err(ModelError::Record {
                    row,
                    reason: "no subscribed ROIs".to_string(),
                });
            }

            let emails: Vec<String> = split_multi(field(email_col))
                .map(str::to_string)
                .collect();
            let phones: Vec<String> = split_multi(field(phone_col))
                .map(str::to_string)
                .collect();
            if emails.is_empty() && phones.is_empty() {
                return Err(ModelError::Record {
                    row,
                    reason: "no contact channel on file".to_string(),
                });
            }

            recipients.push(Recipient {
                name,
                rois,
                expertise,
                emails,
                phones,
            });
        }
        Ok(recipients)
    }
}

/// Split a `;`-delimited multi-value cell, trimming and dropping empties.
fn split_multi(cell: &str) -> impl Iterator<Item = &str> {
    cell.split(';').map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{Expertise, Recipient};
    use crate::error::ModelError;

    const CSV: &str = "\
name,rois,expertise,email,phone
Ama Mensah,Riverdale; OXBOW,2,ama@example.org; mensah@example.org,+233200000001
Kofi Boateng,riverdale,0,kofi@example.org,
";

    #[test]
    fn test_load_folds_roi_case_and_splits_multi_values() {
        let recipients = Recipient::load_csv(CSV).unwrap();
        assert_eq!(recipients.len(), 2);

        let ama = &recipients[0];
        assert_eq!(ama.rois, vec!["riverdale", "oxbow"]);
        assert_eq!(ama.expertise, Expertise::Expert);
        assert_eq!(ama.emails.len(), 2);
        assert!(ama.subscribes_to("RIVERDALE"));
        assert!(!ama.subscribes_to("elmview"));
    }

    #[test]
    fn test_duplicate_roi_fragments_collapse_to_one_subscription() {
        let csv = "\
name,rois,expertise,email,phone
Ama,riverdale; RIVERDALE; oxbow; riverdale,1,ama@example.org,
";
        let recipients = Recipient::load_csv(csv).unwrap();
        assert_eq!(recipients[0].rois, vec!["riverdale", "oxbow"]);
    }

    #[test]
    fn test_load_preserves_duplicate_rows() {
        let csv = "\
name,rois,expertise,email,phone
Ama,riverdale,1,ama@example.org,
Ama,riverdale,1,ama@example.org,
";
        let recipients = Recipient::load_csv(csv).unwrap();
        assert_eq!(recipients.len(), 2);
        assert_eq!(recipients[0], recipients[1]);
    }

    #[test]
    fn test_missing_column_is_schema_error() {
        let csv = "name,rois,email,phone\nAma,riverdale,ama@example.org,\n";
        match Recipient::load_csv(csv) {
            Err(ModelError::Schema(missing)) => assert_eq!(missing, "expertise"),
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_expertise_is_record_error_naming_row() {
        let csv = "\
name,rois,expertise,email,phone
Ama,riverdale,1,ama@example.org,
Kofi,oxbow,expert,kofi@example.org,
";
        match Recipient::load_csv(csv) {
            Err(ModelError::Record { row, .. }) => assert_eq!(row, 2),
            other => panic!("expected record error, got {other:?}"),
        }
    }

    #[test]
    fn test_recipient_without_contact_channel_is_rejected() {
        let csv = "name,rois,expertise,email,phone\nAma,riverdale,1,,\n";
        assert!(matches!(
            Recipient::load_csv(csv),
            Err(ModelError::Record { row: 1, .. })
        ));
    }
}
