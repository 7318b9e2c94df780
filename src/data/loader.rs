use std::fs::File;
use std::path::{Path, PathBuf};

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use arrow::record_batch::RecordBatch;
use log::{debug, info, warn};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::model::{
    EventFile, Field, FieldSet, FileFailure, LoadReport, LoadedDataset, PixelMap, RunTotals,
};
use crate::config::{BadFilePolicy, LoadOptions, MissingFieldPolicy};
use crate::error::LoadError;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load every recognised record file in `dir` into one [`LoadedDataset`].
///
/// Files are visited in lexicographic file-name order so that repeated loads
/// of an unchanged directory produce identical chunk sequences. Entries that
/// are not regular files ending in `.<extension>` are skipped and listed in
/// the report.
pub fn load_dataset(dir: &Path, options: &LoadOptions) -> Result<LoadedDataset, LoadError> {
    let mut fields = FieldSet::new(options.elastic_arms);
    if options.elastic_arms {
        info!("adding elastic-arms vertex fields to the field set");
    }
    let mut totals = RunTotals::default();
    let mut report = LoadReport::default();

    let suffix = format!(".{}", options.extension);
    let (records, others): (Vec<PathBuf>, Vec<PathBuf>) = sorted_entries(dir)?
        .into_iter()
        .partition(|p| is_record_file(p, &suffix));

    for path in others {
        let name = display_name(&path);
        info!("Skipping this file or dir: {name}");
        report.skipped.push(name);
    }

    let n_records = records.len();
    for (i, path) in records.iter().enumerate() {
        info!("Processing... {} of {}: {}", i + 1, n_records, display_name(path));

        let file = match read_event_file(path) {
            Ok(file) => file,
            Err(err) if options.on_bad_file == BadFilePolicy::Skip => {
                warn!("skipping unreadable file: {err}");
                report.failures.push(FileFailure {
                    path: path.clone(),
                    reason: err.to_string(),
                });
                continue;
            }
            Err(err) => return Err(err),
        };

        if totals.files == 0 {
            debug!("Columns in the file: {:?}", file.columns);
        }

        for field in fields.missing_from(&file) {
            match options.on_missing_field {
                MissingFieldPolicy::Fail => {
                    return Err(LoadError::MissingField {
                        path: path.clone(),
                        field: field.column_name(),
                    });
                }
                MissingFieldPolicy::Skip => {
                    warn!("{} has no '{field}', no chunk appended", display_name(path));
                    *report.field_gaps.entry(field).or_insert(0) += 1;
                }
            }
        }

        let events = file.num_events();
        fields.append(file);
        totals.events += events;
        totals.files += 1;
        info!("events in file: {events}");
    }

    info!(
        "Loaded {} files, and {} total events.",
        totals.files, totals.events
    );
    Ok(LoadedDataset {
        fields,
        totals,
        report,
    })
}

/// Read all known columns of a single record file.
///
/// The file handle is released when this returns, whether or not reading
/// succeeded.
pub fn read_event_file(path: &Path) -> Result<EventFile, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).map_err(|source| LoadError::Parquet {
            path: path.to_path_buf(),
            source,
        })?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().map_err(|source| LoadError::Parquet {
        path: path.to_path_buf(),
        source,
    })?;
    let batches = reader
        .collect::<Result<Vec<RecordBatch>, _>>()
        .map_err(|source| LoadError::Arrow {
            path: path.to_path_buf(),
            source,
        })?;

    let table = Columns {
        path,
        names: &columns,
        batches: &batches,
    };

    let cvnmap = table
        .read(Field::CvnMap.column_name(), pixel_maps)?
        .ok_or_else(|| LoadError::MissingPrimaryField {
            path: path.to_path_buf(),
        })?;

    let event_file = EventFile {
        cvnmap,
        vtx_x: table.read(Field::VtxX.column_name(), float_values)?,
        vtx_y: table.read(Field::VtxY.column_name(), float_values)?,
        vtx_z: table.read(Field::VtxZ.column_name(), float_values)?,
        first_cell_x: table.read(Field::FirstCellX.column_name(), integer_values)?,
        first_cell_y: table.read(Field::FirstCellY.column_name(), integer_values)?,
        first_plane: table.read(Field::FirstPlane.column_name(), integer_values)?,
        vtx_ea_x: table.read(Field::VtxEaX.column_name(), float_values)?,
        vtx_ea_y: table.read(Field::VtxEaY.column_name(), float_values)?,
        vtx_ea_z: table.read(Field::VtxEaZ.column_name(), float_values)?,
        mode: table.read("mode", mode_values)?,
        columns,
    };
    event_file.check_lengths(path)?;
    Ok(event_file)
}

/// Interaction mode code of every event in a single record file.
pub fn load_modes(path: &Path) -> Result<Vec<i32>, LoadError> {
    read_event_file(path)?
        .mode
        .ok_or_else(|| LoadError::MissingField {
            path: path.to_path_buf(),
            field: "mode",
        })
}

// ---------------------------------------------------------------------------
// Directory enumeration
// ---------------------------------------------------------------------------

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let read_dir_err = |source| LoadError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };
    let mut entries = std::fs::read_dir(dir)
        .map_err(read_dir_err)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(read_dir_err)?;
    entries.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(entries)
}

fn is_record_file(path: &Path, suffix: &str) -> bool {
    let name_matches = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(suffix));
    name_matches && path.is_file()
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ---------------------------------------------------------------------------
// Column extraction
// ---------------------------------------------------------------------------

type Extract<T> = fn(&Path, &'static str, &ArrayRef) -> Result<Vec<T>, LoadError>;

/// The record batches of one file, addressed by column name.
struct Columns<'a> {
    path: &'a Path,
    names: &'a [String],
    batches: &'a [RecordBatch],
}

impl Columns<'_> {
    /// Concatenate `name` across all batches, or `None` when the file has no
    /// such column.
    fn read<T>(&self, name: &'static str, extract: Extract<T>) -> Result<Option<Vec<T>>, LoadError> {
        if !self.names.iter().any(|n| n == name) {
            return Ok(None);
        }
        let mut values = Vec::new();
        for batch in self.batches {
            if let Some(col) = batch.column_by_name(name) {
                values.extend(extract(self.path, name, col)?);
            }
        }
        Ok(Some(values))
    }
}

fn unsupported(path: &Path, field: &'static str, data_type: &DataType) -> LoadError {
    LoadError::UnsupportedColumnType {
        path: path.to_path_buf(),
        field,
        data_type: data_type.to_string(),
    }
}

fn reject_nulls(path: &Path, field: &'static str, col: &dyn Array) -> Result<(), LoadError> {
    if col.null_count() > 0 {
        return Err(LoadError::NullValues {
            path: path.to_path_buf(),
            field,
        });
    }
    Ok(())
}

fn cast_to(path: &Path, col: &dyn Array, to: &DataType) -> Result<ArrayRef, LoadError> {
    cast(col, to).map_err(|source| LoadError::Arrow {
        path: path.to_path_buf(),
        source,
    })
}

fn is_integer(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}

/// Vertex coordinates: Float32 or Float64, promoted to `f64`.
fn float_values(path: &Path, field: &'static str, col: &ArrayRef) -> Result<Vec<f64>, LoadError> {
    if !matches!(col.data_type(), DataType::Float32 | DataType::Float64) {
        return Err(unsupported(path, field, col.data_type()));
    }
    reject_nulls(path, field, col.as_ref())?;
    let promoted = cast_to(path, col.as_ref(), &DataType::Float64)?;
    Ok(promoted.as_primitive::<Float64Type>().values().to_vec())
}

/// Cell and plane identifiers: any integer type, widened to `i64`.
fn integer_values(path: &Path, field: &'static str, col: &ArrayRef) -> Result<Vec<i64>, LoadError> {
    if !is_integer(col.data_type()) {
        return Err(unsupported(path, field, col.data_type()));
    }
    reject_nulls(path, field, col.as_ref())?;
    let widened = cast_to(path, col.as_ref(), &DataType::Int64)?;
    // u64 values beyond i64::MAX become null in a safe cast.
    reject_nulls(path, field, widened.as_ref())?;
    Ok(widened.as_primitive::<Int64Type>().values().to_vec())
}

fn mode_values(path: &Path, field: &'static str, col: &ArrayRef) -> Result<Vec<i32>, LoadError> {
    if !is_integer(col.data_type()) {
        return Err(unsupported(path, field, col.data_type()));
    }
    reject_nulls(path, field, col.as_ref())?;
    let narrowed = cast_to(path, col.as_ref(), &DataType::Int32)?;
    reject_nulls(path, field, narrowed.as_ref())?;
    Ok(narrowed.as_primitive::<Int32Type>().values().to_vec())
}

/// Pixel maps: one List / LargeList / FixedSizeList row per event, with
/// UInt8, Float32 or Float64 pixels converted to `f32`.
fn pixel_maps(path: &Path, field: &'static str, col: &ArrayRef) -> Result<Vec<PixelMap>, LoadError> {
    reject_nulls(path, field, col.as_ref())?;

    let (pixels, ranges): (&ArrayRef, Vec<(usize, usize)>) = match col.data_type() {
        DataType::List(_) => {
            let list = col.as_list::<i32>();
            let ranges = list
                .value_offsets()
                .windows(2)
                .map(|w| (w[0] as usize, w[1] as usize))
                .collect();
            (list.values(), ranges)
        }
        DataType::LargeList(_) => {
            let list = col.as_list::<i64>();
            let ranges = list
                .value_offsets()
                .windows(2)
                .map(|w| (w[0] as usize, w[1] as usize))
                .collect();
            (list.values(), ranges)
        }
        DataType::FixedSizeList(_, size) => {
            let list = col.as_fixed_size_list();
            let size = *size as usize;
            let ranges = (0..list.len())
                .map(|i| {
                    let start = list.value_offset(i) as usize;
                    (start, start + size)
                })
                .collect();
            (list.values(), ranges)
        }
        other => return Err(unsupported(path, field, other)),
    };

    if !matches!(
        pixels.data_type(),
        DataType::UInt8 | DataType::Float32 | DataType::Float64
    ) {
        return Err(unsupported(path, field, pixels.data_type()));
    }
    let flat = cast_to(path, pixels.as_ref(), &DataType::Float32)?;
    let flat: Vec<f32> = flat
        .as_primitive::<Float32Type>()
        .iter()
        .map(|v| v.unwrap_or(f32::NAN))
        .collect();

    Ok(ranges
        .into_iter()
        .map(|(start, end)| flat[start..end].to_vec())
        .collect())
}
