//! Command implementations for the flood alert notifier CLI.
//!
//! Boundary decoding (recipient CSV, WKT geometry CSV, ASCII raster
//! grids) lives here; the engine crates consume already-parsed rows,
//! geometries and grids.

use clap::Subcommand;
use std::path::PathBuf;

pub mod cycle;
pub mod load;

#[derive(Subcommand)]
pub enum Command {
    /// Run one forecast-driven alert cycle over per-location forecast CSVs
    ForecastCycle {
        /// Path to the recipient database CSV
        #[arg(short = 'r', long)]
        recipients: PathBuf,

        /// Directory of per-location forecast CSVs (location = file stem)
        #[arg(short = 'f', long)]
        forecast_dir: PathBuf,

        /// Compose reports but print a summary instead of sending email
        #[arg(long)]
        dry_run: bool,
    },

    /// Run one raster-driven alert cycle over an ROI/town geometry set
    RasterCycle {
        /// Path to the recipient database CSV
        #[arg(short = 'r', long)]
        recipients: PathBuf,

        /// Path to the ROI boundaries CSV (name,wkt); row order is match order
        #[arg(long)]
        rois: PathBuf,

        /// Path to the towns CSV (name,wkt)
        #[arg(long)]
        towns: PathBuf,

        /// Path to the flood model output as an ESRI ASCII grid
        #[arg(long)]
        raster: PathBuf,

        /// Compose reports but print a summary instead of sending email
        #[arg(long)]
        dry_run: bool,
    },

    /// Store the delivery account credentials
    SetCredentials {
        /// Path to the credential store file
        #[arg(short = 's', long)]
        store: PathBuf,

        /// Delivery account address
        #[arg(long)]
        email: String,

        /// Delivery account password
        #[arg(long)]
        password: String,
    },
}

pub fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::ForecastCycle {
            recipients,
            forecast_dir,
            dry_run,
        } => cycle::run_forecast_cycle(&recipients, &forecast_dir, dry_run),
        Command::RasterCycle {
            recipients,
            rois,
            towns,
            raster,
            dry_run,
        } => cycle::run_raster_cycle(&recipients, &rois, &towns, &raster, dry_run),
        Command::SetCredentials {
            store,
            email,
            password,
        } => cycle::set_credentials(&store, &email, &password),
    }
}
