use finance_pca::dataset::{extract_features, generate_finance_data, FEATURE_NAMES};
use finance_pca::{PcaConfig, PcaEngine};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let seed = std::env::args()
        .nth(1)
        .map(|arg| arg.parse::<u64>())
        .transpose()?
        .unwrap_or(2025);

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let records = generate_finance_data(&mut rng);
    let features = extract_features(&records);

    let engine = PcaEngine::new(PcaConfig {
        random_seed: Some(seed),
        ..PcaConfig::default()
    });
    let result = engine.reduce(features.view(), 2)?;

    println!(
        "{} companies x {} metrics, reduced via {:?}",
        features.nrows(),
        features.ncols(),
        result.path
    );

    let percent = result.explained_variance_percent();
    let kept = (result.cumulative_explained_variance()[1] * 1000.0).round() / 10.0;
    println!("PC1 {}%  PC2 {}%  total kept {}%", percent[0], percent[1], kept);

    println!("\n{:<14} {:>8} {:>8}", "metric", "PC1", "PC2");
    for (j, name) in FEATURE_NAMES.iter().enumerate() {
        println!(
            "{:<14} {:>8.3} {:>8.3}",
            name,
            result.components[[0, j]],
            result.components[[1, j]]
        );
    }

    println!("\n{:<18} {:>8} {:>8}", "company", "PC1", "PC2");
    for (record, scores) in records.iter().zip(result.transformed.rows()) {
        println!("{:<18} {:>8.3} {:>8.3}", record.company, scores[0], scores[1]);
    }
    Ok(())
}
