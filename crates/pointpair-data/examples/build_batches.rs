use argh::FromArgs;

use pointpair_data::config::{Config, Phase};
use pointpair_data::loader::make_data_loader;

#[derive(FromArgs)]
/// Build and collate pair batches from a dataset configuration.
struct Args {
    /// path to the JSON configuration file
    #[argh(option)]
    config: String,

    /// stop after this many batches
    #[argh(option, default = "4")]
    max_batches: usize,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let config = Config::from_json_file(&args.config)?;
    let loader = make_data_loader(&config, Phase::Train, None)?;

    for (i, batch) in loader.take(args.max_batches).enumerate() {
        let batch = batch?;
        log::info!(
            "batch {i}: {} samples, {}x{} points, {} correspondences",
            batch.len(),
            batch.points0.len(),
            batch.points1.len(),
            batch.correspondences.len()
        );
    }
    Ok(())
}
