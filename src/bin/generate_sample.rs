use std::sync::Arc;

use arrow::array::{Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Datelike, Months, NaiveDate};
use parquet::arrow::ArrowWriter;

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

/// (name, baseline mean radiance, pixel count, GDP in millions)
const MUNICIPALITIES: &[(&str, f64, f64, f64)] = &[
    ("Toluca", 38.0, 420.0, 98_000.0),
    ("Metepec", 45.0, 70.0, 41_000.0),
    ("Lerma", 22.0, 230.0, 35_500.0),
    ("Zinacantepec", 12.0, 310.0, 9_800.0),
    ("San Mateo Atenco", 30.0, 12.0, 8_700.0),
    ("Almoloya de Juárez", 6.0, 480.0, 4_300.0),
];

fn main() {
    let mut rng = SimpleRng::new(42);
    let start = NaiveDate::from_ymd_opt(2014, 1, 1).expect("valid start date");

    let mut municipio: Vec<String> = Vec::new();
    let mut fecha: Vec<String> = Vec::new();
    let mut media: Vec<Option<f64>> = Vec::new();
    let mut suma: Vec<Option<f64>> = Vec::new();
    let mut pib: Vec<Option<f64>> = Vec::new();

    // Monthly composites, 2014-01 through 2023-12
    for month in 0..120u32 {
        let date = start + Months::new(month);
        let years_in = (date.year() - 2014) as f64;

        for &(name, base, pixels, gdp) in MUNICIPALITIES {
            let seasonal = 1.0 + 0.08 * ((date.month() as f64) / 12.0 * std::f64::consts::TAU).sin();
            let growth = 1.0 + 0.03 * years_in;
            let mean = base * seasonal * growth + rng.gauss(0.0, base * 0.05);

            // Cloud-masked months come through as zero fill or missing values.
            let roll = rng.next_f64();
            let mean = if roll < 0.03 {
                Some(0.0)
            } else if roll < 0.05 {
                None
            } else {
                Some(mean)
            };

            municipio.push(name.to_string());
            fecha.push(date.format("%Y-%m-%d").to_string());
            media.push(mean);
            suma.push(mean.map(|m| m * pixels));
            pib.push(Some(gdp * growth * (1.0 + rng.gauss(0.0, 0.02))));
        }
    }

    let rows = municipio.len();
    let schema = Arc::new(Schema::new(vec![
        Field::new("Municipio", DataType::Utf8, false),
        Field::new("Fecha", DataType::Utf8, false),
        Field::new("Media_de_radianza", DataType::Float64, true),
        Field::new("Suma_de_radianza", DataType::Float64, true),
        Field::new("pib_mun", DataType::Float64, true),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(municipio)),
            Arc::new(StringArray::from(fecha)),
            Arc::new(Float64Array::from(media)),
            Arc::new(Float64Array::from(suma)),
            Arc::new(Float64Array::from(pib)),
        ],
    )
    .expect("Failed to create RecordBatch");

    // Write Parquet
    let output_path = "sample_municipios.parquet";
    let file = std::fs::File::create(output_path).expect("Failed to create output file");
    let mut writer = ArrowWriter::try_new(file, schema, None).expect("Failed to create writer");
    writer.write(&batch).expect("Failed to write batch");
    writer.close().expect("Failed to close writer");

    println!(
        "Wrote {rows} records ({} municipalities, 120 months) to {output_path}",
        MUNICIPALITIES.len()
    );
}
