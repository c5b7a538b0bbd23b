//! Input decoding for one alert cycle.

use anyhow::Context;
use csv::ReaderBuilder;
use fan_geo::raster::RasterGrid;
use fan_geo::roi::Town;
use fan_model::error::ModelError;
use fan_model::forecast::ForecastEntry;
use fan_model::recipient::Recipient;
use geo_types::{Geometry, Polygon};
use std::fs;
use std::path::Path;
use wkt::TryFromWkt;

/// Load the recipient registry from its CSV database.
pub fn recipients(path: &Path) -> anyhow::Result<Vec<Recipient>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading recipient database {}", path.display()))?;
    Recipient::load_csv(&text)
        .with_context(|| format!("parsing recipient database {}", path.display()))
}

/// Load every `*.csv` forecast source in a directory.
///
/// One source maps to one location identifier: the file stem, lower-cased.
/// Sources are sorted by path so a cycle is deterministic regardless of
/// directory enumeration order.
pub fn forecast_dir(dir: &Path) -> anyhow::Result<Vec<(String, Vec<ForecastEntry>)>> {
    let mut paths: Vec<_> = fs::read_dir(dir)
        .with_context(|| format!("reading forecast directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("csv")))
        .collect();
    paths.sort();

    let mut forecasts = Vec::new();
    for path in paths {
        let location = match path.file_stem().and_then(|s| s.to_str()) {
            Some(stem) => stem.to_lowercase(),
            None => continue,
        };
        let text = fs::read_to_string(&path)
            .with_context(|| format!("reading forecast source {}", path.display()))?;
        let entries = ForecastEntry::parse_csv(&text)
            .with_context(|| format!("parsing forecast source {}", path.display()))?;
        forecasts.push((location, entries));
    }
    Ok(forecasts)
}

/// Load `name,wkt` geometry records, preserving row order.
///
/// The `name` column is matched case-insensitively; the geometry column
/// may be headed `wkt` or `geometry`.
pub fn named_geometries(path: &Path) -> anyhow::Result<Vec<(String, Geometry<f64>)>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading geometry file {}", path.display()))?;
    parse_named_geometries(&text)
        .with_context(|| format!("parsing geometry file {}", path.display()))
}

fn parse_named_geometries(text: &str) -> Result<Vec<(String, Geometry<f64>)>, ModelError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = rdr
        .headers()
        .map_err(|e| ModelError::Schema(e.to_string()))?
        .clone();
    let column = |field: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(field));
    let name_col = column("name").ok_or_else(|| ModelError::Schema("name".to_string()))?;
    let geometry_col = column("wkt")
        .or_else(|| column("geometry"))
        .ok_or_else(|| ModelError::Schema("wkt".to_string()))?;

    let mut geometries = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let row = idx + 1;
        let record = result.map_err(|e| ModelError::Record {
            row,
            reason: e.to_string(),
        })?;
        let name = record.get(name_col).unwrap_or_default().to_string();
        if name.is_empty() {
            return Err(ModelError::Record {
                row,
                reason: "empty geometry name".to_string(),
            });
        }
        let wkt_text = record.get(geometry_col).unwrap_or_default();
        let geometry =
            Geometry::try_from_wkt_str(wkt_text).map_err(|e| ModelError::Record {
                row,
                reason: format!("invalid WKT: {e}"),
            })?;
        geometries.push((name, geometry));
    }
    Ok(geometries)
}

/// Load ROI boundary polygons, in file order (first-match order).
pub fn rois(path: &Path) -> anyhow::Result<Vec<(String, Polygon<f64>)>> {
    named_geometries(path)?
        .into_iter()
        .map(|(name, geometry)| match geometry {
            Geometry::Polygon(polygon) => Ok((name, polygon)),
            other => anyhow::bail!(
                "ROI {name} must be a polygon, found {}",
                geometry_kind(&other)
            ),
        })
        .collect()
}

/// Load town point locations.
pub fn towns(path: &Path) -> anyhow::Result<Vec<Town>> {
    named_geometries(path)?
        .into_iter()
        .map(|(name, geometry)| match geometry {
            Geometry::Point(point) => Ok(Town { name, point }),
            other => anyhow::bail!(
                "town {name} must be a point, found {}",
                geometry_kind(&other)
            ),
        })
        .collect()
}

fn geometry_kind(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "point",
        Geometry::Line(_) => "line",
        Geometry::LineString(_) => "linestring",
        Geometry::Polygon(_) => "polygon",
        Geometry::MultiPoint(_) => "multipoint",
        Geometry::MultiLineString(_) => "multilinestring",
        Geometry::MultiPolygon(_) => "multipolygon",
        Geometry::GeometryCollection(_) => "geometrycollection",
        Geometry::Rect(_) => "rect",
        Geometry::Triangle(_) => "triangle",
    }
}

/// Load a single-band ESRI ASCII grid (`.asc`) flood model output.
pub fn ascii_grid(path: &Path) -> anyhow::Result<RasterGrid> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading raster grid {}", path.display()))?;
    parse_ascii_grid(&text).with_context(|| format!("parsing raster grid {}", path.display()))
}

fn parse_ascii_grid(text: &str) -> anyhow::Result<RasterGrid> {
    let mut ncols = None;
    let mut nrows = None;
    let mut xllcorner = None;
    let mut yllcorner = None;
    let mut cellsize = None;
    let mut nodata = None;
    let mut cells: Vec<f64> = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut tokens = line.split_whitespace();
        let first = match tokens.next() {
            Some(token) => token,
            None => continue,
        };
        if first.chars().next().is_some_and(char::is_alphabetic) {
            let value = tokens
                .next()
                .ok_or_else(|| anyhow::anyhow!("header line {line:?} has no value"))?;
            match first.to_lowercase().as_str() {
                "ncols" => ncols = Some(value.parse::<usize>()?),
                "nrows" => nrows = Some(value.parse::<usize>()?),
                "xllcorner" => xllcorner = Some(value.parse::<f64>()?),
                "yllcorner" => yllcorner = Some(value.parse::<f64>()?),
                "cellsize" => cellsize = Some(value.parse::<f64>()?),
                "nodata_value" => nodata = Some(value.parse::<f64>()?),
                other => anyhow::bail!("unknown grid header {other:?}"),
            }
        } else {
            cells.push(first.parse::<f64>()?);
            for token in tokens {
                cells.push(token.parse::<f64>()?);
            }
        }
    }

    let ncols = ncols.context("missing ncols header")?;
    let nrows = nrows.context("missing nrows header")?;
    let grid = RasterGrid::new(
        ncols,
        nrows,
        (
            xllcorner.context("missing xllcorner header")?,
            yllcorner.context("missing yllcorner header")?,
        ),
        cellsize.context("missing cellsize header")?,
        nodata,
        cells,
    )?;
    Ok(grid)
}
