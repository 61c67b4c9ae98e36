use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use structopt::StructOpt;

use tidy_series::data::time::format_timestamp;

#[derive(Debug, StructOpt)]
#[structopt(name = "generate_sample", about = "Write a synthetic Time,Temp,Humidity sensor file")]
struct Opt {
    /// Output CSV file
    #[structopt(short, long, parse(from_os_str), default_value = "sensor_data.csv")]
    output: PathBuf,
    /// Number of readings
    #[structopt(short, long, default_value = "288")]
    rows: usize,
    /// Minutes between readings
    #[structopt(short, long, default_value = "5")]
    interval: i64,
    /// PRNG seed
    #[structopt(short, long, default_value = "42")]
    seed: u64,
}

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

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Daily temperature cycle for Medellín: coolest before dawn, warmest mid-afternoon.
fn diurnal_temperature(hour: f64) -> f64 {
    22.0 + 5.0 * (2.0 * std::f64::consts::PI * (hour - 9.0) / 24.0).sin()
}

fn main() -> Result<()> {
    env_logger::init();
    let opt = Opt::from_args();
    let mut rng = SimpleRng::new(opt.seed);

    let start = NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .context("invalid start date")?;

    let mut writer = csv::Writer::from_path(&opt.output)
        .with_context(|| format!("creating {}", opt.output.display()))?;
    writer.write_record(["Time", "Temp", "Humidity"])?;

    for i in 0..opt.rows {
        let ts = start + Duration::minutes(opt.interval * i as i64);
        let hour = (i as i64 * opt.interval) as f64 / 60.0;
        let temp = diurnal_temperature(hour) + rng.gauss(0.0, 0.4);
        let humidity = (95.0 - 3.0 * (temp - 17.0) + rng.gauss(0.0, 2.0)).clamp(0.0, 100.0);

        writer.write_record([
            format_timestamp(&ts),
            format!("{temp:.2}"),
            format!("{humidity:.1}"),
        ])?;
    }
    writer.flush()?;

    println!("Wrote {} readings to {}", opt.rows, opt.output.display());
    Ok(())
}
