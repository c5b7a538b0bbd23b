use fan_model::error::ModelError;
use geo::Contains;
use geo_types::Point;

/// A single-band scalar grid addressed by geographic coordinates.
///
/// The grid is already decoded; rows run north to south and `origin` is
/// the lower-left corner, matching the ESRI ASCII grid convention. The
/// grid is read-only and scoped to one classification pass.
#[derive(Debug, Clone)]
pub struct RasterGrid {
    width: usize,
    height: usize,
    origin: (f64, f64),
    cell_size: f64,
    nodata: Option<f64>,
    cells: Vec<f64>,
}

impl RasterGrid {
    pub fn new(
        width: usize,
        height: usize,
        origin: (f64, f64),
        cell_size: f64,
        nodata: Option<f64>,
        cells: Vec<f64>,
    ) -> Result<Self, ModelError> {
        if cells.len() != width * height {
            return Err(ModelError::Precondition(
                "raster cell count does not match grid dimensions",
            ));
        }
        Ok(Self {
            width,
            height,
            origin,
            cell_size,
            nodata,
            cells,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Cell value, with nodata mapped to `None`. Row 0 is the northernmost.
    pub fn value_at(&self, col: usize, row: usize) -> Option<f64> {
        let value = self.cells[row * self.width + col];
        match self.nodata {
            Some(nodata) if value == nodata => None,
            _ => Some(value),
        }
    }

    /// Geographic center of a cell.
    pub fn cell_center(&self, col: usize, row: usize) -> Point<f64> {
        let x = self.origin.0 + (col as f64 + 0.5) * self.cell_size;
        let y = self.origin.1 + (self.height - row) as f64 * self.cell_size
            - 0.5 * self.cell_size;
        Point::new(x, y)
    }

    /// Maximum cell value over the cells whose centers fall inside `shape`,
    /// skipping nodata. `None` when the shape intersects no cell.
    pub fn masked_max<S>(&self, shape: &S) -> Option<f64>
    where
        S: Contains<Point<f64>>,
    {
        let mut max: Option<f64> = None;
        for row in 0..self.height {
            for col in 0..self.width {
                if !shape.contains(&self.cell_center(col, row)) {
                    continue;
                }
                if let Some(value) = self.value_at(col, row) {
                    max = Some(match max {
                        Some(m) if m >= value => m,
                        _ => value,
                    });
                }
            }
        }
        max
    }
}
