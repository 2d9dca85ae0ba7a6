use shop_etl::config::PipelineConfig;
use shop_etl::generate::{target_rows, Populator, TableOutcome};
use shop_etl::source;

pub fn run(
    mut config: PipelineConfig,
    seed: Option<u64>,
    scale: Option<String>,
    batch_size: Option<usize>,
    progress: bool,
) -> anyhow::Result<()> {
    if let Some(seed) = seed {
        config.generator.seed = seed;
    }
    if scale.is_some() {
        config.generator.scale = scale;
    }
    if let Some(n) = batch_size {
        config.generator.batch_size = n;
    }
    let volumes = config.generator.volumes()?;

    eprintln!("Source: {}", config.source.describe());
    let mut store = source::connect(&config.source)?;

    let stats = Populator::new(store.as_mut(), volumes, config.generator.seed)
        .batch_size(config.generator.batch_size)
        .progress(progress)
        .run()?;

    println!("Generation complete:");
    for (table, outcome) in &stats.tables {
        match outcome {
            TableOutcome::Inserted(n) => println!(
                "  {:<12} inserted {} of {} rows",
                table.name(),
                n,
                target_rows(&volumes, *table)
            ),
            TableOutcome::Skipped(n) => {
                println!("  {:<12} skipped ({} rows already present)", table.name(), n)
            }
        }
    }
    println!("  Elapsed: {:.2}s", stats.duration_secs);

    Ok(())
}
