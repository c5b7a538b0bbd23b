//! One full alert cycle: load, assign, classify, aggregate, deliver.
//!
//! Scheduling is not handled here: the operator (or a service manager)
//! re-runs a cycle on its own cadence.

use crate::load;
use anyhow::Context;
use chrono::Local;
use fan_alerts::processor::{self, AlertProcessor};
use fan_alerts::report;
use fan_geo::roi::RoiIndex;
use fan_mailer::secrets::CredentialStore;
use fan_mailer::{login_with_retries, LoginOutcome, MailSession, SmtpConfig};
use log::{info, warn};
use std::path::Path;

/// Run the forecast-driven pipeline over a directory of per-location
/// forecast CSVs.
///
/// Every recipient gets a report, including the "no new alerts" report
/// when none of their subscribed locations has forecasts on file; only
/// recipients without an email address on file are skipped.
pub fn run_forecast_cycle(
    recipients_csv: &Path,
    forecast_dir: &Path,
    dry_run: bool,
) -> anyhow::Result<()> {
    let mut processor = AlertProcessor::new();
    processor.load_recipients(load::recipients(recipients_csv)?);
    processor.load_forecasts(load::forecast_dir(forecast_dir)?);

    let generated_at = Local::now().naive_local();
    let session = if dry_run { None } else { Some(open_session()?) };

    let mut sent = 0usize;
    for alert in processor.current_alerts() {
        let body = report::compose_forecast_report(&alert.locations, generated_at);
        if alert.emails.is_empty() {
            // Phone-only recipients have no deliverable channel here.
            warn!("skipping recipient with no email address on file");
            continue;
        }
        match &session {
            Some(session) => {
                session
                    .send(&alert.emails, &body)
                    .context("delivering forecast alert")?;
                sent += 1;
            }
            None => {
                println!("{body}\n");
                sent += 1;
            }
        }
    }

    info!("forecast cycle complete: {sent} alert(s) composed");
    Ok(())
}

/// Run the raster-driven pipeline over ROI/town geometries and a flood
/// model output grid.
pub fn run_raster_cycle(
    recipients_csv: &Path,
    rois_csv: &Path,
    towns_csv: &Path,
    raster: &Path,
    dry_run: bool,
) -> anyhow::Result<()> {
    let recipients = load::recipients(recipients_csv)?;
    let mut index = RoiIndex::from_boundaries(load::rois(rois_csv)?);
    let towns = load::towns(towns_csv)?;

    let unassigned = index.assign_towns(&towns)?;
    if !unassigned.is_empty() {
        warn!("{} town(s) lie outside every ROI", unassigned.len());
    }
    info!(
        "assigned {} town(s) across {} ROI(s)",
        towns.len() - unassigned.len(),
        index.len()
    );

    // The grid is opened for this pass only and dropped with the cycle.
    let grid = load::ascii_grid(raster)?;
    let alerts = processor::raster_alerts(&index, &grid)?;
    info!("{} ROI(s) alerting", alerts.len());

    let generated_at = Local::now().naive_local();
    let dispatches = processor::fan_out(&alerts, &recipients, generated_at);

    if dry_run {
        for dispatch in &dispatches {
            println!("--- to {} ---\n{}\n", dispatch.email, dispatch.body);
        }
        info!("raster cycle complete (dry run): {} dispatch(es)", dispatches.len());
        return Ok(());
    }

    let session = open_session()?;
    for dispatch in &dispatches {
        session
            .send(std::slice::from_ref(&dispatch.email), &dispatch.body)
            .with_context(|| format!("delivering alert to {}", dispatch.email))?;
    }
    info!("raster cycle complete: {} dispatch(es) sent", dispatches.len());
    Ok(())
}

/// Write the delivery account credentials to the store.
pub fn set_credentials(store: &Path, email: &str, password: &str) -> anyhow::Result<()> {
    let store = CredentialStore::open(store);
    let mut entries = store.load()?;
    entries.insert("email".to_string(), email.to_string());
    entries.insert("password".to_string(), password.to_string());
    store.save(&entries)?;
    info!("credentials stored at {}", store.path().display());
    Ok(())
}

/// Open and verify the delivery session from the environment, falling
/// back to the default credential store. The CLI is non-interactive, so
/// there is no credential re-prompt: one attempt per cycle.
fn open_session() -> anyhow::Result<MailSession> {
    let config = match SmtpConfig::from_env() {
        Ok(config) => config,
        Err(_) => config_from_store(Path::new("secrets.json"))?,
    };
    match login_with_retries(1, |_| MailSession::login(&config)) {
        LoginOutcome::Success(session) => Ok(session),
        LoginOutcome::InvalidCredentials => {
            anyhow::bail!("SMTP server rejected the stored credentials")
        }
        LoginOutcome::Failed(reason) => anyhow::bail!("opening SMTP session: {reason}"),
    }
}

fn config_from_store(path: &Path) -> anyhow::Result<SmtpConfig> {
    let entries = CredentialStore::open(path).load()?;
    let email = entries
        .get("email")
        .context("credential store has no email entry")?;
    let password = entries
        .get("password")
        .context("credential store has no password entry")?;
    Ok(SmtpConfig::new("smtp.gmail.com", 465, email, password))
}
