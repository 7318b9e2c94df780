use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float32Builder, Float64Array, Int32Array, Int64Array, ListBuilder};
use arrow::datatypes::{DataType, Field as ArrowField, Schema};
use arrow::record_batch::RecordBatch;
use log::debug;
use parquet::arrow::ArrowWriter;

use super::model::{EventFile, Field};
use crate::error::LoadError;

/// Write one record file: `cvnmap` as `List<Float32>`, then every present
/// optional column (`Float64` vertices, `Int64` identifiers, `Int32` mode).
pub fn write_event_file(path: &Path, events: &EventFile) -> Result<(), LoadError> {
    events.check_lengths(path)?;

    let mut maps = ListBuilder::new(Float32Builder::new());
    for map in &events.cvnmap {
        maps.values().append_slice(map);
        maps.append(true);
    }
    let maps = maps.finish();

    let mut fields = vec![ArrowField::new(
        Field::CvnMap.column_name(),
        DataType::List(Arc::new(ArrowField::new("item", DataType::Float32, true))),
        false,
    )];
    let mut arrays: Vec<ArrayRef> = vec![Arc::new(maps)];

    let floats = [
        (Field::VtxX, &events.vtx_x),
        (Field::VtxY, &events.vtx_y),
        (Field::VtxZ, &events.vtx_z),
        (Field::VtxEaX, &events.vtx_ea_x),
        (Field::VtxEaY, &events.vtx_ea_y),
        (Field::VtxEaZ, &events.vtx_ea_z),
    ];
    for (field, column) in floats {
        if let Some(values) = column {
            fields.push(ArrowField::new(field.column_name(), DataType::Float64, false));
            arrays.push(Arc::new(Float64Array::from(values.clone())));
        }
    }

    let ints = [
        (Field::FirstCellX, &events.first_cell_x),
        (Field::FirstCellY, &events.first_cell_y),
        (Field::FirstPlane, &events.first_plane),
    ];
    for (field, column) in ints {
        if let Some(values) = column {
            fields.push(ArrowField::new(field.column_name(), DataType::Int64, false));
            arrays.push(Arc::new(Int64Array::from(values.clone())));
        }
    }

    if let Some(mode) = &events.mode {
        fields.push(ArrowField::new("mode", DataType::Int32, false));
        arrays.push(Arc::new(Int32Array::from(mode.clone())));
    }

    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), arrays).map_err(|source| LoadError::Arrow {
        path: path.to_path_buf(),
        source,
    })?;

    let file = File::create(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let parquet_err = |source| LoadError::Parquet {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = ArrowWriter::try_new(file, schema, None).map_err(parquet_err)?;
    writer.write(&batch).map_err(parquet_err)?;
    writer.close().map_err(parquet_err)?;

    debug!(
        "wrote {} events to {}",
        events.num_events(),
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::read_event_file;

    #[test]
    fn written_file_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.parquet");
        let events = EventFile {
            cvnmap: vec![vec![0.0, 0.5], vec![1.0, 1.5]],
            vtx_x: Some(vec![10.0, -20.0]),
            first_cell_y: Some(vec![3, 4]),
            mode: Some(vec![0, 10]),
            ..EventFile::default()
        };
        write_event_file(&path, &events).unwrap();

        let back = read_event_file(&path).unwrap();
        assert_eq!(back.cvnmap, events.cvnmap);
        assert_eq!(back.vtx_x, events.vtx_x);
        assert_eq!(back.first_cell_y, events.first_cell_y);
        assert_eq!(back.mode, events.mode);
        assert_eq!(back.vtx_z, None);
        assert_eq!(back.columns, vec!["cvnmap", "vtx.x", "firstcelly", "mode"]);
    }

    #[test]
    fn mismatched_column_is_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.parquet");
        let events = EventFile {
            cvnmap: vec![vec![0.0]; 3],
            first_plane: Some(vec![1, 2]),
            ..EventFile::default()
        };
        let err = write_event_file(&path, &events).unwrap_err();
        assert!(matches!(err, LoadError::LengthMismatch { field: "firstplane", .. }));
        assert!(!path.exists());
    }
}
