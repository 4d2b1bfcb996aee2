use anyhow::Result;
use clap::Parser;
use log::{debug, info};
use perf_codec::{
    Args, Command, PerformanceCodec, import_codec_config, import_encoded, import_matched_notes,
    import_score_notes, write_json,
};

fn main() -> Result<()> {
    let args = Args::parse();
    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let config = match &args.config {
        Some(path) => {
            info!("Loading codec config: '{}'...", path.display());
            import_codec_config(path)?
        }
        None => args.codec_config(),
    };
    debug!("Codec config: {:?}", config);

    let codec = PerformanceCodec::from_config(&config)?;

    match &args.command {
        Command::Encode { matched, output } => {
            info!("Importing matched notes: '{}'...", matched.display());
            let notes = import_matched_notes(matched)?;

            let encoded = codec.encode(&notes)?;
            info!(
                "Encoded {} notes in {} onset groups, mean beat period {:.4}s..!",
                notes.len(),
                encoded.groups.len(),
                encoded.mean_beat_period
            );

            write_json(&encoded, output.as_deref())?;
        }
        Command::Decode {
            score,
            encoded,
            output,
        } => {
            info!("Importing score notes: '{}'...", score.display());
            let score = import_score_notes(score)?;
            let encoded = import_encoded(encoded)?;

            let performance = codec.decode_encoded(&score, &encoded)?;
            info!("Decoded {} performed notes..!", performance.len());

            write_json(&performance, output.as_deref())?;
        }
    }

    Ok(())
}
