use std::path::Path;

use mlvtx::config::{BadFilePolicy, LoadOptions, MissingFieldPolicy};
use mlvtx::data::model::{EventFile, Field};
use mlvtx::data::writer::write_event_file;
use mlvtx::{load_dataset, LoadError};

/// `n` events whose true x equals `tag`, so chunks can be told apart.
fn events(n: usize, tag: f64, elastic_arms: bool) -> EventFile {
    let ea = |offset: f64| elastic_arms.then(|| vec![tag + offset; n]);
    EventFile {
        cvnmap: vec![vec![tag as f32; 6]; n],
        vtx_x: Some(vec![tag; n]),
        vtx_y: Some(vec![tag + 0.1; n]),
        vtx_z: Some(vec![tag + 0.2; n]),
        first_cell_x: Some(vec![1; n]),
        first_cell_y: Some(vec![2; n]),
        first_plane: Some(vec![3; n]),
        vtx_ea_x: ea(1.0),
        vtx_ea_y: ea(1.1),
        vtx_ea_z: ea(1.2),
        ..EventFile::default()
    }
}

fn write(dir: &Path, name: &str, file: &EventFile) {
    write_event_file(&dir.join(name), file).unwrap();
}

#[test]
fn directory_without_record_files_is_empty_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("notes.txt"), "hello").unwrap();
    std::fs::write(dir.path().join("model.h5"), "weights").unwrap();
    std::fs::create_dir(dir.path().join("plots")).unwrap();

    let loaded = load_dataset(dir.path(), &LoadOptions::default()).unwrap();
    assert_eq!(loaded.totals.files, 0);
    assert_eq!(loaded.totals.events, 0);
    for field in loaded.fields.requested() {
        assert_eq!(loaded.fields.chunk_count(field), Some(0));
    }
    assert_eq!(loaded.report.skipped, vec!["model.h5", "notes.txt", "plots"]);
    loaded.check_consistency().unwrap();
}

#[test]
fn totals_sum_events_over_files() {
    let dir = tempfile::tempdir().unwrap();
    let sizes = [5, 0, 12, 3];
    for (i, n) in sizes.iter().enumerate() {
        write(dir.path(), &format!("file_{i}.parquet"), &events(*n, i as f64, false));
    }
    std::fs::write(dir.path().join("README"), "skip me").unwrap();

    let loaded = load_dataset(dir.path(), &LoadOptions::default()).unwrap();
    assert_eq!(loaded.totals.files, sizes.len());
    assert_eq!(loaded.totals.events, sizes.iter().sum::<usize>());
    for field in Field::CORE {
        assert_eq!(loaded.fields.chunk_count(field), Some(sizes.len()));
    }
    let per_file: Vec<usize> = loaded.fields.cvnmap.iter().map(Vec::len).collect();
    assert_eq!(per_file, sizes);
    loaded.check_consistency().unwrap();
}

#[test]
fn files_are_loaded_in_file_name_order() {
    let dir = tempfile::tempdir().unwrap();
    // Written out of order on purpose.
    write(dir.path(), "c.parquet", &events(1, 3.0, false));
    write(dir.path(), "a.parquet", &events(1, 1.0, false));
    write(dir.path(), "b.parquet", &events(1, 2.0, false));

    let loaded = load_dataset(dir.path(), &LoadOptions::default()).unwrap();
    let [x, _, _] = loaded.fields.vtx.flatten();
    assert_eq!(x, vec![1.0, 2.0, 3.0]);
}

#[test]
fn loading_twice_gives_identical_results() {
    let dir = tempfile::tempdir().unwrap();
    for i in 0..4 {
        write(dir.path(), &format!("run_{i}.parquet"), &events(i + 1, i as f64, true));
    }
    let opts = LoadOptions::with_elastic_arms();
    let first = load_dataset(dir.path(), &opts).unwrap();
    let second = load_dataset(dir.path(), &opts).unwrap();
    assert_eq!(first, second);
}

#[test]
fn elastic_arms_flag_adds_three_fields() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.parquet", &events(2, 10.0, true));
    write(dir.path(), "b.parquet", &events(3, 20.0, true));

    let core = load_dataset(dir.path(), &LoadOptions::default()).unwrap();
    let extended = load_dataset(dir.path(), &LoadOptions::with_elastic_arms()).unwrap();

    let core_fields = core.fields.requested();
    let extra: Vec<Field> = extended
        .fields
        .requested()
        .into_iter()
        .filter(|f| !core_fields.contains(f))
        .collect();
    assert_eq!(extra, Field::ELASTIC_ARMS.to_vec());
    assert!(core.fields.vtx_ea.is_none());

    for field in Field::ELASTIC_ARMS {
        assert_eq!(extended.fields.chunk_count(field), Some(extended.totals.files));
    }
    let ea = extended.fields.vtx_ea.as_ref().unwrap();
    assert_eq!(ea.x[1], vec![21.0; 3]);
    extended.check_consistency().unwrap();
}

#[test]
fn missing_field_fails_fast_by_default() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.parquet", &events(2, 0.0, false));
    let mut partial = events(2, 1.0, false);
    partial.first_cell_y = None;
    write(dir.path(), "b.parquet", &partial);

    let err = load_dataset(dir.path(), &LoadOptions::default()).unwrap_err();
    match err {
        LoadError::MissingField { path, field } => {
            assert!(path.ends_with("b.parquet"));
            assert_eq!(field, "firstcelly");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn skipped_missing_fields_are_counted() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.parquet", &events(2, 0.0, true));
    // No elastic-arms columns in the second file.
    write(dir.path(), "b.parquet", &events(4, 1.0, false));

    let opts = LoadOptions {
        on_missing_field: MissingFieldPolicy::Skip,
        ..LoadOptions::with_elastic_arms()
    };
    let loaded = load_dataset(dir.path(), &opts).unwrap();
    assert_eq!(loaded.totals.files, 2);
    assert_eq!(loaded.totals.events, 6);
    assert_eq!(loaded.fields.chunk_count(Field::VtxEaX), Some(1));
    assert_eq!(loaded.fields.chunk_count(Field::VtxX), Some(2));
    for field in Field::ELASTIC_ARMS {
        assert_eq!(loaded.report.field_gaps.get(&field), Some(&1));
    }
    assert!(matches!(
        loaded.check_consistency(),
        Err(LoadError::InconsistentChunks { field: "vtxEA.x", chunks: 1, files: 2 })
    ));
}

#[test]
fn bad_file_aborts_the_load_by_default() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.parquet", &events(2, 0.0, false));
    std::fs::write(dir.path().join("b.parquet"), b"corrupted").unwrap();

    let err = load_dataset(dir.path(), &LoadOptions::default()).unwrap_err();
    assert!(matches!(err, LoadError::Parquet { .. }));
}

#[test]
fn bad_file_can_be_skipped_and_reported() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.parquet", &events(2, 0.0, false));
    std::fs::write(dir.path().join("b.parquet"), b"corrupted").unwrap();
    write(dir.path(), "c.parquet", &events(3, 2.0, false));

    let opts = LoadOptions {
        on_bad_file: BadFilePolicy::Skip,
        ..LoadOptions::default()
    };
    let loaded = load_dataset(dir.path(), &opts).unwrap();
    assert_eq!(loaded.totals.files, 2);
    assert_eq!(loaded.totals.events, 5);
    assert_eq!(loaded.report.failures.len(), 1);
    assert!(loaded.report.failures[0].path.ends_with("b.parquet"));
    loaded.check_consistency().unwrap();
}

#[test]
fn custom_extension_is_respected() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.pq", &events(2, 0.0, false));
    write(dir.path(), "b.parquet", &events(3, 1.0, false));

    let opts = LoadOptions {
        extension: "pq".into(),
        ..LoadOptions::default()
    };
    let loaded = load_dataset(dir.path(), &opts).unwrap();
    assert_eq!(loaded.totals.files, 1);
    assert_eq!(loaded.totals.events, 2);
    assert_eq!(loaded.report.skipped, vec!["b.parquet"]);
}
