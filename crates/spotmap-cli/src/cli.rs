use clap::{Parser, Subcommand, ValueEnum};
use spotmap_core::models::{EntityKind, SortDirection, SortKey};
use std::path::PathBuf;

/// Spotmap - Admin console for parking spots, services and repair stations
#[derive(Parser, Debug)]
#[command(name = "spotmap")]
#[command(about = "Admin console for parking spots, services and repair stations", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Storage backend to use (memory or postgres)
    #[arg(long, global = true, default_value = "memory")]
    pub storage: StorageBackend,

    /// Seed the memory backend from a JSON file keyed by kind
    #[arg(long, global = true, value_name = "FILE")]
    pub data: Option<PathBuf>,

    /// Configuration file (defaults to ./spotmap.toml when present)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Rows per page
    #[arg(long, global = true)]
    pub page_size: Option<u32>,

    /// Search debounce window in milliseconds
    #[arg(long, global = true)]
    pub debounce_ms: Option<u64>,

    /// Spatial reference id used when writing points
    #[arg(long, global = true)]
    pub srid: Option<u32>,

    /// Keep rows whose content repeats another row's
    #[arg(long, global = true)]
    pub keep_content_duplicates: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Storage backend selection
#[derive(Debug, Clone, ValueEnum)]
pub enum StorageBackend {
    /// In-memory storage (default, for development)
    Memory,
    /// PostgreSQL/PostGIS store of record
    Postgres,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show one page of a listing
    List(ListArgs),

    /// Interactive listing session driven by line commands
    Browse(BrowseArgs),

    /// Set the availability of a location
    Toggle(ToggleArgs),

    /// Delete a location and its images
    Delete(DeleteArgs),

    /// Move a location to new coordinates
    SetLocation(SetLocationArgs),

    /// Decode a stored point value (hex EWKB, EWKT or GeoJSON)
    Decode(DecodeArgs),

    /// Encode coordinates as a point literal
    Encode(EncodeArgs),

    /// Show effective configuration and where each value comes from
    Config,
}

#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Entity kind (parking, service, repair_station)
    #[arg(default_value = "parking")]
    pub kind: EntityKind,

    /// Case-insensitive search text
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Sort column (name, city, available, rating, capacity, created_at, updated_at, id)
    #[arg(long)]
    pub sort: Option<SortKey>,

    /// Sort direction (asc or desc)
    #[arg(long)]
    pub direction: Option<SortDirection>,

    /// 1-based page number
    #[arg(long, short = 'p', default_value = "1")]
    pub page: u32,
}

#[derive(Parser, Debug)]
pub struct BrowseArgs {
    /// Entity kind to start with
    #[arg(default_value = "parking")]
    pub kind: EntityKind,
}

/// Availability value
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Availability {
    On,
    Off,
}

impl Availability {
    pub fn as_bool(self) -> bool {
        matches!(self, Availability::On)
    }
}

#[derive(Parser, Debug)]
pub struct ToggleArgs {
    pub kind: EntityKind,

    pub id: String,

    /// New availability
    pub availability: Availability,
}

#[derive(Parser, Debug)]
pub struct DeleteArgs {
    pub kind: EntityKind,

    pub id: String,
}

#[derive(Parser, Debug)]
pub struct SetLocationArgs {
    pub kind: EntityKind,

    pub id: String,

    /// Latitude in degrees (-90 to 90)
    #[arg(allow_negative_numbers = true)]
    pub latitude: f64,

    /// Longitude in degrees (-180 to 180)
    #[arg(allow_negative_numbers = true)]
    pub longitude: f64,
}

#[derive(Parser, Debug)]
pub struct DecodeArgs {
    /// Raw point value as stored
    pub value: String,
}

#[derive(Parser, Debug)]
pub struct EncodeArgs {
    /// Latitude in degrees
    #[arg(allow_negative_numbers = true)]
    pub latitude: f64,

    /// Longitude in degrees
    #[arg(allow_negative_numbers = true)]
    pub longitude: f64,

    /// Print hex EWKB instead of the textual literal
    #[arg(long)]
    pub hex: bool,
}
