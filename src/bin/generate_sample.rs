use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use mlvtx::data::model::EventFile;
use mlvtx::data::writer::write_event_file;
use mlvtx::mode::InteractionMode;

/// Pixel map layout: two detector views of `CELLS x PLANES` pixels.
const VIEWS: usize = 2;
const CELLS: usize = 40;
const PLANES: usize = 50;

/// Detector half-widths and length in cm.
const HALF_WIDTH: f64 = 760.0;
const LENGTH: f64 = 5960.0;
const CELL_WIDTH: f64 = 3.97;
const PLANE_DEPTH: f64 = 6.61;

const FILES: usize = 3;
const EVENTS_PER_FILE: usize = 200;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Mostly QE, Res, DIS and MEC, like a beam sample.
fn draw_mode(rng: &mut SimpleRng) -> i32 {
    let r = rng.next_f64();
    let mode = if r < 0.30 {
        InteractionMode::QE
    } else if r < 0.55 {
        InteractionMode::Res
    } else if r < 0.80 {
        InteractionMode::DIS
    } else if r < 0.95 {
        InteractionMode::MEC
    } else {
        InteractionMode::Coh
    };
    mode.code()
}

/// A blob of hits around the vertex cell/plane in each view.
fn pixel_map(rng: &mut SimpleRng) -> Vec<f32> {
    let mut map = vec![0.0f32; VIEWS * CELLS * PLANES];
    for view in 0..VIEWS {
        let start_cell = (rng.next_u64() % CELLS as u64) as usize;
        for plane in 0..PLANES / 2 {
            let spread = plane / 4;
            let lo = start_cell.saturating_sub(spread);
            let hi = (start_cell + spread).min(CELLS - 1);
            for cell in lo..=hi {
                let charge = (rng.gauss(120.0, 40.0).clamp(0.0, 255.0)) as f32;
                map[view * CELLS * PLANES + cell * PLANES + plane] = charge.round();
            }
        }
    }
    map
}

struct Event {
    map: Vec<f32>,
    truth: [f64; 3],
    elastic_arms: [f64; 3],
    model: [f64; 3],
    first_cell: [i64; 2],
    first_plane: i64,
    mode: i32,
}

fn generate_event(rng: &mut SimpleRng) -> Event {
    let truth = [
        rng.uniform(-HALF_WIDTH, HALF_WIDTH),
        rng.uniform(-HALF_WIDTH, HALF_WIDTH),
        rng.uniform(0.0, LENGTH),
    ];
    // Elastic arms has wider tails than the model.
    let elastic_arms = truth.map(|t| t + rng.gauss(0.5, 12.0));
    let model = truth.map(|t| t + rng.gauss(0.0, 6.0));

    Event {
        map: pixel_map(rng),
        truth,
        elastic_arms,
        model,
        first_cell: [
            ((truth[0] + HALF_WIDTH) / CELL_WIDTH) as i64,
            ((truth[1] + HALF_WIDTH) / CELL_WIDTH) as i64,
        ],
        first_plane: (truth[2] / PLANE_DEPTH) as i64,
        mode: draw_mode(rng),
    }
}

fn to_event_file(events: &[Event]) -> EventFile {
    let coord = |f: fn(&Event) -> f64| Some(events.iter().map(f).collect::<Vec<f64>>());
    EventFile {
        columns: Vec::new(),
        cvnmap: events.iter().map(|e| e.map.clone()).collect(),
        vtx_x: coord(|e| e.truth[0]),
        vtx_y: coord(|e| e.truth[1]),
        vtx_z: coord(|e| e.truth[2]),
        first_cell_x: Some(events.iter().map(|e| e.first_cell[0]).collect()),
        first_cell_y: Some(events.iter().map(|e| e.first_cell[1]).collect()),
        first_plane: Some(events.iter().map(|e| e.first_plane).collect()),
        vtx_ea_x: coord(|e| e.elastic_arms[0]),
        vtx_ea_y: coord(|e| e.elastic_arms[1]),
        vtx_ea_z: coord(|e| e.elastic_arms[2]),
        mode: Some(events.iter().map(|e| e.mode).collect()),
    }
}

/// Predictions CSV in the layout `resolution_summary` reads.
fn write_predictions(path: &Path, events: &[Event]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating predictions CSV")?;
    let mut header = Vec::new();
    for c in ["X", "Y", "Z"] {
        header.push(format!("True {c}"));
        header.push(format!("Reco {c}"));
        header.push(format!("Model Pred {c}"));
    }
    writer.write_record(&header)?;
    for e in events {
        let mut row = Vec::with_capacity(9);
        for i in 0..3 {
            row.push(format!("{:.3}", e.truth[i]));
            row.push(format!("{:.3}", e.elastic_arms[i]));
            row.push(format!("{:.3}", e.model[i]));
        }
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write a small synthetic sample:
///
/// ```text
/// <out>/FD-Nominal-FHC-Nonswap/train/trimmed_<i>_of_<n>.parquet
/// <out>/FD-Nominal-FHC-Nonswap/test/trimmed_test.parquet
/// <out>/FD-Nominal-FHC-Nonswap/predictions_FD_FHC_Nonswap.csv
/// ```
fn main() -> Result<()> {
    env_logger::init();

    let out = PathBuf::from(std::env::args().nth(1).unwrap_or_else(|| "sample_data".into()));
    let sample_dir = out.join("FD-Nominal-FHC-Nonswap");
    let train_dir = sample_dir.join("train");
    let test_dir = sample_dir.join("test");
    std::fs::create_dir_all(&train_dir).context("creating train directory")?;
    std::fs::create_dir_all(&test_dir).context("creating test directory")?;

    let mut rng = SimpleRng::new(42);

    for i in 0..FILES {
        let events: Vec<Event> = (0..EVENTS_PER_FILE).map(|_| generate_event(&mut rng)).collect();
        let path = train_dir.join(format!("trimmed_{}_of_{FILES}.parquet", i + 1));
        write_event_file(&path, &to_event_file(&events))?;
    }

    let test_events: Vec<Event> = (0..EVENTS_PER_FILE).map(|_| generate_event(&mut rng)).collect();
    write_event_file(&test_dir.join("trimmed_test.parquet"), &to_event_file(&test_events))?;
    let pred_path = sample_dir.join("predictions_FD_FHC_Nonswap.csv");
    write_predictions(&pred_path, &test_events)?;

    println!(
        "Wrote {} training files ({EVENTS_PER_FILE} events each), one test file and predictions to {}",
        FILES,
        sample_dir.display()
    );
    Ok(())
}
