//! Soil Sample Seeder
//!
//! Generates random in-range soil samples and inserts them into the configured
//! database, or prints them when run with `--dry-run`.

use rand::Rng;
use soil_samples::{
    config::AppConfig, db, repository::SoilSampleRepository, types::NewSoilSample,
    validation::FIELDS,
};
use tracing::info;

/// Sample generator for seeding
struct SampleGenerator {
    rng: rand::rngs::ThreadRng,
}

impl SampleGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }

    /// Generate a sample with every field drawn from its declared range
    fn generate(&mut self) -> NewSoilSample {
        let [potassium, nitrogen, phosphorus, ph] = FIELDS.map(|spec| {
            let value = self.rng.gen_range(spec.min..=spec.max);
            (value * 100.0).round() / 100.0
        });

        NewSoilSample {
            potassium,
            nitrogen,
            phosphorus,
            ph,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("seed_samples=info".parse()?)
                .add_directive("soil_samples=info".parse()?),
        )
        .init();

    // Parse arguments
    let args: Vec<String> = std::env::args().skip(1).collect();
    let dry_run = args.iter().any(|a| a == "--dry-run");
    let count: u64 = args
        .iter()
        .find(|a| !a.starts_with("--"))
        .and_then(|s| s.parse().ok())
        .unwrap_or(20);

    info!(count, dry_run, database = %config.database.url, "Starting soil sample seeder");

    let mut generator = SampleGenerator::new();

    if dry_run {
        for i in 0..count {
            let sample = generator.generate();
            info!(
                n = i + 1,
                potassium = sample.potassium,
                nitrogen = sample.nitrogen,
                phosphorus = sample.phosphorus,
                ph = sample.ph,
                "Generated sample"
            );
        }
        return Ok(());
    }

    let pool = db::create_pool(&config.database).await?;
    db::run_migrations(&pool).await?;
    let samples = SoilSampleRepository::new(pool);

    for i in 0..count {
        samples.create(generator.generate()).await?;

        if (i + 1) % 10 == 0 {
            info!("Inserted {}/{} samples", i + 1, count);
        }
    }

    info!(
        inserted = count,
        total = samples.count().await?,
        "Seeding complete"
    );

    Ok(())
}
