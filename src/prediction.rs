use std::fmt;
use std::path::Path;
use std::str::FromStr;

use log::info;
use serde::Serialize;

use crate::error::AnalysisError;

// ---------------------------------------------------------------------------
// Coordinate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Coordinate {
    X,
    Y,
    Z,
}

impl Coordinate {
    pub fn as_str(self) -> &'static str {
        match self {
            Coordinate::X => "X",
            Coordinate::Y => "Y",
            Coordinate::Z => "Z",
        }
    }

    pub fn true_column(self) -> String {
        format!("True {self}")
    }

    /// Elastic-arms reconstructed value.
    pub fn reco_column(self) -> String {
        format!("Reco {self}")
    }

    pub fn model_column(self) -> String {
        format!("Model Pred {self}")
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Coordinate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "X" => Ok(Coordinate::X),
            "Y" => Ok(Coordinate::Y),
            "Z" => Ok(Coordinate::Z),
            other => Err(format!("unknown coordinate '{other}', expected x, y or z")),
        }
    }
}

// ---------------------------------------------------------------------------
// Prediction table
// ---------------------------------------------------------------------------

/// True, elastic-arms and model-predicted values of one coordinate, one
/// entry per event.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinatePredictions {
    pub coordinate: Coordinate,
    pub truth: Vec<f64>,
    pub elastic_arms: Vec<f64>,
    pub model: Vec<f64>,
}

impl CoordinatePredictions {
    pub fn len(&self) -> usize {
        self.truth.len()
    }

    pub fn is_empty(&self) -> bool {
        self.truth.is_empty()
    }
}

/// Read one coordinate from a prediction CSV.
///
/// The header must contain `True <C>`, `Reco <C>` and `Model Pred <C>`;
/// any other columns are ignored.
pub fn load_predictions(
    path: &Path,
    coordinate: Coordinate,
) -> Result<CoordinatePredictions, AnalysisError> {
    let csv_err = |source| AnalysisError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::Reader::from_path(path).map_err(csv_err)?;
    let headers = reader.headers().map_err(csv_err)?.clone();

    let wanted = [
        coordinate.true_column(),
        coordinate.reco_column(),
        coordinate.model_column(),
    ];
    let mut indices = [0usize; 3];
    for (slot, name) in indices.iter_mut().zip(&wanted) {
        *slot = headers
            .iter()
            .position(|h| h.trim() == name.as_str())
            .ok_or_else(|| AnalysisError::MissingColumn {
                path: path.to_path_buf(),
                column: name.clone(),
            })?;
    }

    let mut columns: [Vec<f64>; 3] = Default::default();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(csv_err)?;
        for ((values, &idx), name) in columns.iter_mut().zip(&indices).zip(&wanted) {
            let cell = record.get(idx).unwrap_or("");
            let value = cell
                .trim()
                .parse::<f64>()
                .map_err(|_| AnalysisError::BadValue {
                    path: path.to_path_buf(),
                    row,
                    column: name.clone(),
                    value: cell.to_string(),
                })?;
            values.push(value);
        }
    }

    let [truth, elastic_arms, model] = columns;
    info!(
        "read {} predictions for coordinate {coordinate} from {}",
        truth.len(),
        path.display()
    );
    Ok(CoordinatePredictions {
        coordinate,
        truth,
        elastic_arms,
        model,
    })
}
