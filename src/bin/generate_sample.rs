//! Writes a synthetic LT record file for trying the pipeline without a rig.
//!
//! Usage: `generate_sample [OUT_PATH]` (default `data/LT_sample.xml`).

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

const LEVELS: usize = 21;
const MEAS: usize = 40;
const MAX_LEVEL_MM: f64 = 400.0;
const SAMPLE_PERIOD_S: f64 = 0.25;
const LEVEL_DWELL_S: f64 = 30.0;

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
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
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

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Level-major channel buffers for one synthetic run.
struct Run {
    level: Vec<f64>,
    voltage: Vec<f64>,
    timestamp: Vec<f64>,
    current: Vec<f64>,
    resistance: Vec<f64>,
}

fn simulate(rng: &mut SimpleRng) -> Run {
    let n = LEVELS * MEAS;
    let mut run = Run {
        level: Vec::with_capacity(n),
        voltage: Vec::with_capacity(n),
        timestamp: Vec::with_capacity(n),
        current: Vec::with_capacity(n),
        resistance: Vec::with_capacity(n),
    };
    let t0 = 3_900_000_000.0;

    for step in 0..LEVELS {
        // The last step sits exactly at full scale.
        let level = MAX_LEVEL_MM * step as f64 / (LEVELS - 1) as f64;
        // Resistance of the uncovered probe length, plus sensor noise.
        let base_ohm = 0.5 + 2.0 * (MAX_LEVEL_MM - level) / MAX_LEVEL_MM;
        for meas in 0..MEAS {
            let current = rng.gauss(1e-3, 1e-6);
            let resistance = (base_ohm + rng.gauss(0.0, 0.002)).max(0.0);
            run.level.push(level);
            run.current.push(current);
            run.resistance.push(resistance);
            run.voltage.push(current * resistance);
            run.timestamp
                .push(t0 + step as f64 * LEVEL_DWELL_S + meas as f64 * SAMPLE_PERIOD_S);
        }
    }
    run
}

fn write_channel<W: Write>(xml: &mut Writer<W>, tag: &str, values: &[f64]) -> Result<()> {
    let size = format!("{MEAS} {LEVELS}");
    let body = values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ");

    let mut start = BytesStart::new(tag);
    start.push_attribute(("size", size.as_str()));
    xml.write_event(Event::Start(start))?;
    xml.write_event(Event::Text(BytesText::new(&body)))?;
    xml.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

fn write_scalar<W: Write>(xml: &mut Writer<W>, tag: &str, text: &str) -> Result<()> {
    xml.write_event(Event::Start(BytesStart::new(tag)))?;
    xml.write_event(Event::Text(BytesText::new(text)))?;
    xml.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

fn main() -> Result<()> {
    let output_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data/LT_sample.xml"));
    if let Some(dir) = output_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating {}", dir.display()))?;
    }

    let mut rng = SimpleRng::new(42);
    let run = simulate(&mut rng);

    let file = File::create(&output_path)
        .with_context(|| format!("creating {}", output_path.display()))?;
    let mut xml = Writer::new_with_indent(BufWriter::new(file), b' ', 2);

    xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    xml.write_event(Event::Start(BytesStart::new("LT")))?;
    write_scalar(&mut xml, "ID", "LT_sample")?;
    write_channel(&mut xml, "Level_mm", &run.level)?;
    write_channel(&mut xml, "Voltage_V", &run.voltage)?;
    write_channel(&mut xml, "KeithleyTimeStamp", &run.timestamp)?;
    write_channel(&mut xml, "Current_A", &run.current)?;
    write_channel(&mut xml, "Resistance_ohm", &run.resistance)?;
    write_scalar(&mut xml, "HePressure_mbar", "1013.25")?;
    xml.write_event(Event::End(BytesEnd::new("LT")))?;
    xml.into_inner().flush().context("flushing output")?;

    println!(
        "Wrote {LEVELS} levels x {MEAS} measurements to {}",
        output_path.display()
    );
    Ok(())
}
