mod args;
mod export;
mod logging;

use std::fs::File;
use std::process::ExitCode;

use anyhow::{Context as _, Result, anyhow};
use args::{Args, Source};
use clap::Parser as _;
use element_iot_api::decentlab::{DecodeOptions, SensorFamily};
use element_iot_api::element::{ElementApi, PacketsQuery, ReadingsQuery};
use tracing::info;

use crate::export::{export_packets, export_readings};

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = run().await {
        eprintln!("{e:#}");
        return ExitCode::from(1);
    }

    ExitCode::from(0)
}

async fn run() -> Result<()> {
    let args = Args::parse();

    logging::init(&args.log_level)?;

    let api = ElementApi::new(&args.api_location, &args.api_key)
        .context("failed to create Element API client")?;

    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("failed to create output directory: {:?}", args.output))?;

    let options = DecodeOptions {
        protocol_version: args.protocol_version,
        precision: args.precision,
    };

    for folder in &args.folders {
        let table = match args.source {
            Source::Packets => {
                let family = args
                    .sensor
                    .or_else(|| SensorFamily::from_folder(folder))
                    .ok_or_else(|| {
                        anyhow!("cannot tell the sensor family of {folder}, pass --sensor")
                    })?;
                let query = PacketsQuery {
                    start: Some(args.start),
                    end: args.end,
                    stream: args.stream,
                    ..Default::default()
                };
                export_packets(&api, folder, family, &query, &options).await?
            }
            Source::Readings => {
                let query = ReadingsQuery {
                    start: Some(args.start),
                    end: args.end,
                    stream: args.stream,
                    ..Default::default()
                };
                export_readings(&api, folder, &query).await?
            }
        };

        let path = args.output.join(format!("{folder}.csv"));
        let file =
            File::create(&path).with_context(|| format!("failed to create file: {path:?}"))?;
        table
            .write_csv(file, args.timezone)
            .with_context(|| format!("failed to write CSV: {path:?}"))?;

        info!(folder = folder.as_str(), rows = table.len(), path = %path.display(), "exported");
        println!("Wrote {} rows to {:?}", table.len(), path);
    }

    Ok(())
}
