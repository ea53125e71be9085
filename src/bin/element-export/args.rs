use std::path::PathBuf;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use clap::{Parser, ValueEnum};
use element_iot_api::decentlab::SensorFamily;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Source {
    /// Raw uplink packets, decoded locally.
    Packets,
    /// Readings decoded by the platform.
    Readings,
}

#[derive(Debug, Parser)]
pub struct Args {
    #[arg(
        long,
        env = "ELEMENT_API_LOCATION",
        default_value = "https://dew21.element-iot.com/api/v1"
    )]
    pub api_location: String,

    #[arg(long, env = "API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Folder slug to export, may be repeated.
    #[arg(long = "folder", required = true)]
    pub folders: Vec<String>,

    #[arg(long, value_enum, default_value_t = Source::Packets)]
    pub source: Source,

    /// Sensor family of the packets. Guessed from the folder slug if omitted.
    #[arg(long)]
    pub sensor: Option<SensorFamily>,

    #[arg(long)]
    pub start: DateTime<Utc>,

    #[arg(long)]
    pub end: Option<DateTime<Utc>>,

    /// Use the streaming endpoints instead of pagination.
    #[arg(long)]
    pub stream: bool,

    #[arg(long, default_value_t = 2)]
    pub protocol_version: u8,

    /// Round decoded quantities to this many decimal places.
    #[arg(long)]
    pub precision: Option<u32>,

    #[arg(long, default_value = ".")]
    pub output: PathBuf,

    #[arg(long, env = "TZ", default_value = "UTC")]
    pub timezone: Tz,

    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}
