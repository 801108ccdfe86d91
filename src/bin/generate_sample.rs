//! Writes a synthetic `Sample_Data/` tree of `.t2t` scans for trying out the
//! exporter. Usage: `generate_sample [ROOT]`.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

const CHANNELS: usize = 64;
const GRID: usize = 8;
const FILE_NAME: &str = "_TC2340ms_resX100um_resY100um.t2t";

/// Time-domain THz pulse: first derivative of a Gaussian, plus noise.
fn generate_trace(pulse_at: f64, amplitude: f64, noise_level: f64, rng: &mut Noise) -> Vec<f64> {
    let width = 3.0;
    (0..CHANNELS)
        .map(|t| {
            let u = (t as f64 - pulse_at) / width;
            -amplitude * u * (-0.5 * u * u).exp() + noise_level * rng.normal()
        })
        .collect()
}

/// Seeded splitmix64 stream with normal deviates from the polar method.
struct Noise {
    state: u64,
    spare: Option<f64>,
}

impl Noise {
    fn seeded(seed: u64) -> Self {
        Noise { state: seed, spare: None }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform in [-1, 1).
    fn signed_unit(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 52) as f64 - 1.0
    }

    /// Standard normal deviate. Each accepted pair yields two.
    fn normal(&mut self) -> f64 {
        if let Some(z) = self.spare.take() {
            return z;
        }
        loop {
            let (a, b) = (self.signed_unit(), self.signed_unit());
            let r2 = a * a + b * b;
            if r2 > 0.0 && r2 < 1.0 {
                let scale = (-2.0 * r2.ln() / r2).sqrt();
                self.spare = Some(b * scale);
                return a * scale;
            }
        }
    }
}

fn write_scan(path: &Path, authentic: bool, rng: &mut Noise) -> std::io::Result<usize> {
    fs::create_dir_all(path.parent().expect("scan path has a parent"))?;
    let mut out = BufWriter::new(fs::File::create(path)?);

    writeln!(out, "THz scan export")?;
    writeln!(out, "TC=2340ms")?;
    writeln!(out, "resX=100um resY=100um")?;
    writeln!(out, "X,Y,Z,trace[{CHANNELS}]")?;

    // Counterfeits delay the pulse: a thicker or denser coating.
    let pulse_at = if authentic { 20.0 } else { 26.0 };
    let mut rows = 0;
    for iy in 0..GRID {
        for ix in 0..GRID {
            let amplitude = 1.0 + 0.05 * rng.normal();
            let trace = generate_trace(pulse_at, amplitude, 0.01, rng);
            write!(out, "{:.1},{:.1},1.5", ix as f64 * 0.1, iy as f64 * 0.1)?;
            for v in trace {
                write!(out, ",{:.5}", v)?;
            }
            writeln!(out)?;
            rows += 1;
        }
    }
    out.flush()?;
    Ok(rows)
}

fn main() {
    let root = std::env::args().nth(1).unwrap_or_else(|| "Sample_Data".to_string());
    let root = Path::new(&root);
    let mut rng = Noise::seeded(42);

    // (folder path below root, authentic?)
    let scans = [
        ("s01-1-A/s01-1-A", true),
        ("s01-2-A/s01-2-A", true),
        ("s02-1-C/s02-1-C", false),
        ("s02_2_c", false),
        ("s03-1-a", true),
        // Never exported: pruned by the "error" marker.
        ("error/s04-1-A", true),
        // Skipped: folder name lacks the authenticity flag.
        ("s05-1", true),
    ];

    let mut total = 0;
    for (folder, authentic) in scans {
        let path = root.join(folder).join(FILE_NAME);
        let rows = write_scan(&path, authentic, &mut rng).expect("Failed to write scan");
        println!("Wrote {rows} points to {}", path.display());
        total += rows;
    }

    println!(
        "Wrote {} scans ({total} points, {CHANNELS} channels each) under {}",
        scans.len(),
        root.display()
    );
}
