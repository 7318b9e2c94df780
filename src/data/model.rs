use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::error::LoadError;

/// One event's flattened pixel map.
pub type PixelMap = Vec<f32>;

/// Per-file chunks of one field, in load order.
pub type Chunks<T> = Vec<Vec<T>>;

// ---------------------------------------------------------------------------
// Field – the named per-event columns the loader knows about
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    CvnMap,
    VtxX,
    VtxY,
    VtxZ,
    FirstCellX,
    FirstCellY,
    FirstPlane,
    VtxEaX,
    VtxEaY,
    VtxEaZ,
}

impl Field {
    /// Fields loaded on every run. `CvnMap` is the primary field.
    pub const CORE: [Field; 7] = [
        Field::CvnMap,
        Field::VtxX,
        Field::VtxY,
        Field::VtxZ,
        Field::FirstCellX,
        Field::FirstCellY,
        Field::FirstPlane,
    ];

    /// Elastic-arms reconstructed vertex, loaded on request.
    pub const ELASTIC_ARMS: [Field; 3] = [Field::VtxEaX, Field::VtxEaY, Field::VtxEaZ];

    /// Column name in the record files.
    pub fn column_name(self) -> &'static str {
        match self {
            Field::CvnMap => "cvnmap",
            Field::VtxX => "vtx.x",
            Field::VtxY => "vtx.y",
            Field::VtxZ => "vtx.z",
            Field::FirstCellX => "firstcellx",
            Field::FirstCellY => "firstcelly",
            Field::FirstPlane => "firstplane",
            Field::VtxEaX => "vtxEA.x",
            Field::VtxEaY => "vtxEA.y",
            Field::VtxEaZ => "vtxEA.z",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.column_name())
    }
}

// ---------------------------------------------------------------------------
// EventFile – the columns of a single record file
// ---------------------------------------------------------------------------

/// Everything read from one record file. `cvnmap` is mandatory and defines
/// the event count; every other column may be absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventFile {
    /// Names of all columns found in the file, including unknown ones.
    pub columns: Vec<String>,
    pub cvnmap: Vec<PixelMap>,
    pub vtx_x: Option<Vec<f64>>,
    pub vtx_y: Option<Vec<f64>>,
    pub vtx_z: Option<Vec<f64>>,
    pub first_cell_x: Option<Vec<i64>>,
    pub first_cell_y: Option<Vec<i64>>,
    pub first_plane: Option<Vec<i64>>,
    pub vtx_ea_x: Option<Vec<f64>>,
    pub vtx_ea_y: Option<Vec<f64>>,
    pub vtx_ea_z: Option<Vec<f64>>,
    /// Interaction mode code per event.
    pub mode: Option<Vec<i32>>,
}

impl EventFile {
    pub fn num_events(&self) -> usize {
        self.cvnmap.len()
    }

    /// Whether the file carries `field`.
    pub fn has(&self, field: Field) -> bool {
        match field {
            Field::CvnMap => true,
            Field::VtxX => self.vtx_x.is_some(),
            Field::VtxY => self.vtx_y.is_some(),
            Field::VtxZ => self.vtx_z.is_some(),
            Field::FirstCellX => self.first_cell_x.is_some(),
            Field::FirstCellY => self.first_cell_y.is_some(),
            Field::FirstPlane => self.first_plane.is_some(),
            Field::VtxEaX => self.vtx_ea_x.is_some(),
            Field::VtxEaY => self.vtx_ea_y.is_some(),
            Field::VtxEaZ => self.vtx_ea_z.is_some(),
        }
    }

    /// Name and length of every present non-primary column.
    pub fn column_lengths(&self) -> Vec<(&'static str, usize)> {
        let floats = [
            (Field::VtxX, &self.vtx_x),
            (Field::VtxY, &self.vtx_y),
            (Field::VtxZ, &self.vtx_z),
            (Field::VtxEaX, &self.vtx_ea_x),
            (Field::VtxEaY, &self.vtx_ea_y),
            (Field::VtxEaZ, &self.vtx_ea_z),
        ];
        let ints = [
            (Field::FirstCellX, &self.first_cell_x),
            (Field::FirstCellY, &self.first_cell_y),
            (Field::FirstPlane, &self.first_plane),
        ];

        let mut lengths: Vec<(&'static str, usize)> = floats
            .iter()
            .filter_map(|(f, col)| col.as_ref().map(|v| (f.column_name(), v.len())))
            .chain(
                ints.iter()
                    .filter_map(|(f, col)| col.as_ref().map(|v| (f.column_name(), v.len()))),
            )
            .collect();
        if let Some(mode) = &self.mode {
            lengths.push(("mode", mode.len()));
        }
        lengths
    }

    /// Fail if any present column disagrees with the `cvnmap` event count.
    pub fn check_lengths(&self, path: &std::path::Path) -> Result<(), LoadError> {
        let expected = self.num_events();
        for (field, found) in self.column_lengths() {
            if found != expected {
                return Err(LoadError::LengthMismatch {
                    path: path.to_path_buf(),
                    field,
                    expected,
                    found,
                });
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FieldSet – per-field chunk sequences accumulated across files
// ---------------------------------------------------------------------------

/// Three coordinate chunk sequences of one vertex.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VertexChunks {
    pub x: Chunks<f64>,
    pub y: Chunks<f64>,
    pub z: Chunks<f64>,
}

impl VertexChunks {
    /// Concatenate the chunks of each coordinate.
    pub fn flatten(&self) -> [Vec<f64>; 3] {
        [
            self.x.concat(),
            self.y.concat(),
            self.z.concat(),
        ]
    }
}

/// Per-file chunks of every requested field.
///
/// The core fields are always present; `vtx_ea` is `Some` only when the
/// elastic-arms fields were requested.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSet {
    pub cvnmap: Chunks<PixelMap>,
    pub vtx: VertexChunks,
    pub first_cell_x: Chunks<i64>,
    pub first_cell_y: Chunks<i64>,
    pub first_plane: Chunks<i64>,
    pub vtx_ea: Option<VertexChunks>,
}

impl FieldSet {
    pub fn new(elastic_arms: bool) -> Self {
        Self {
            vtx_ea: elastic_arms.then(VertexChunks::default),
            ..Self::default()
        }
    }

    /// Fields this set accumulates, in declaration order.
    pub fn requested(&self) -> Vec<Field> {
        let mut fields = Field::CORE.to_vec();
        if self.vtx_ea.is_some() {
            fields.extend(Field::ELASTIC_ARMS);
        }
        fields
    }

    /// Number of chunks held for `field`, or `None` when it was not requested.
    pub fn chunk_count(&self, field: Field) -> Option<usize> {
        let n = match field {
            Field::CvnMap => self.cvnmap.len(),
            Field::VtxX => self.vtx.x.len(),
            Field::VtxY => self.vtx.y.len(),
            Field::VtxZ => self.vtx.z.len(),
            Field::FirstCellX => self.first_cell_x.len(),
            Field::FirstCellY => self.first_cell_y.len(),
            Field::FirstPlane => self.first_plane.len(),
            Field::VtxEaX => self.vtx_ea.as_ref()?.x.len(),
            Field::VtxEaY => self.vtx_ea.as_ref()?.y.len(),
            Field::VtxEaZ => self.vtx_ea.as_ref()?.z.len(),
        };
        Some(n)
    }

    /// Requested fields that `file` does not carry.
    pub fn missing_from(&self, file: &EventFile) -> Vec<Field> {
        self.requested()
            .into_iter()
            .filter(|f| !file.has(*f))
            .collect()
    }

    /// Append one chunk per requested field present in `file`.
    pub fn append(&mut self, file: EventFile) {
        self.cvnmap.push(file.cvnmap);
        push_present(&mut self.vtx.x, file.vtx_x);
        push_present(&mut self.vtx.y, file.vtx_y);
        push_present(&mut self.vtx.z, file.vtx_z);
        push_present(&mut self.first_cell_x, file.first_cell_x);
        push_present(&mut self.first_cell_y, file.first_cell_y);
        push_present(&mut self.first_plane, file.first_plane);
        if let Some(ea) = &mut self.vtx_ea {
            push_present(&mut ea.x, file.vtx_ea_x);
            push_present(&mut ea.y, file.vtx_ea_y);
            push_present(&mut ea.z, file.vtx_ea_z);
        }
    }
}

fn push_present<T>(chunks: &mut Chunks<T>, column: Option<Vec<T>>) {
    if let Some(values) = column {
        chunks.push(values);
    }
}

// ---------------------------------------------------------------------------
// Run totals and load report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunTotals {
    /// Files successfully processed.
    pub files: usize,
    /// Events accumulated across all processed files.
    pub events: usize,
}

/// A recognised file that was skipped because it could not be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Side information gathered during a load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Directory entries that were not recognised record files.
    pub skipped: Vec<String>,
    /// Number of processed files that lacked each requested field.
    pub field_gaps: BTreeMap<Field, usize>,
    pub failures: Vec<FileFailure>,
}

/// Final snapshot returned by the loader.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedDataset {
    pub fields: FieldSet,
    pub totals: RunTotals,
    pub report: LoadReport,
}

impl LoadedDataset {
    /// Check that every requested field holds exactly one chunk per file.
    pub fn check_consistency(&self) -> Result<(), LoadError> {
        for field in self.fields.requested() {
            let chunks = self.fields.chunk_count(field).unwrap_or(0);
            if chunks != self.totals.files {
                return Err(LoadError::InconsistentChunks {
                    field: field.column_name(),
                    chunks,
                    files: self.totals.files,
                });
            }
        }
        Ok(())
    }
}
