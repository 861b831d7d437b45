//! `swmmkit`: digitized drainage network to SWMM 5.2 `.inp`.
//!
//! ```bash
//! swmmkit init --output-dir ./basin --crs EPSG:32718 --crs-name "WGS 84 / UTM zone 18S"
//! swmmkit --db ./basin/SWMM_Project.sqlite3 add-node J1 --at 500.0,1000.0
//! swmmkit --db ./basin/SWMM_Project.sqlite3 run --dem dem.asc --output basin.inp
//! ```

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use commands::{parse_point, parse_vertices, CommandResponse};
use log::info;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use swmmkit_core::{
    default_log_level, init_logging, open_db, resolve_store_path, LayerKind, ProjectConfig,
    ProjectCrs,
};

#[derive(Parser)]
#[command(name = "swmmkit")]
#[command(version)]
#[command(about = "Prepare a digitized drainage network and export it as a SWMM 5.2 input file")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project store (defaults to $SWMMKIT_DB_PATH, then a temp-dir store)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// JSON project configuration
    #[arg(long, global = true, env = "SWMMKIT_CONFIG")]
    config: Option<PathBuf>,

    /// trace|debug|info|warn|error
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Absolute directory for rolling log files; logging is off when unset
    #[arg(long, global = true, env = "SWMMKIT_LOG_DIR")]
    log_dir: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Layer {
    Nodes,
    Links,
    Subcatchments,
}

impl From<Layer> for LayerKind {
    fn from(value: Layer) -> Self {
        match value {
            Layer::Nodes => LayerKind::Nodes,
            Layer::Links => LayerKind::Links,
            Layer::Subcatchments => LayerKind::Subcatchments,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create SWMM_Project.sqlite3 with the three layers in a directory
    Init {
        #[arg(long)]
        output_dir: PathBuf,
        /// Authority ID, e.g. EPSG:32718
        #[arg(long)]
        crs: String,
        #[arg(long, default_value = "")]
        crs_name: String,
        /// Mark the CRS as geographic (rejected)
        #[arg(long)]
        geographic: bool,
    },

    /// Check that the project CRS is projected
    CheckCrs,

    /// Digitize a junction
    AddNode {
        #[arg(default_value = "")]
        id: String,
        /// x,y
        #[arg(long, allow_hyphen_values = true, value_parser = parse_point)]
        at: (f64, f64),
    },

    /// Digitize a conduit
    AddLink {
        #[arg(default_value = "")]
        id: String,
        /// x,y;x,y;...
        #[arg(long, allow_hyphen_values = true)]
        path: String,
    },

    /// Digitize a subcatchment
    AddSubcatchment {
        #[arg(default_value = "")]
        id: String,
        /// Exterior ring as x,y;x,y;...
        #[arg(long, allow_hyphen_values = true)]
        boundary: String,
        #[arg(long, default_value = "")]
        outlet: String,
        #[arg(long, default_value = "")]
        rain_gage: String,
    },

    /// List features of one layer
    List {
        #[arg(value_enum)]
        layer: Layer,
    },

    /// Fill blank IDs (N1, L1, S1, ...)
    Ids,

    /// Sample node invert elevations from a DEM (.asc grid or GeoTIFF)
    Elevations {
        #[arg(long)]
        dem: PathBuf,
    },

    /// Connect link endpoints to the nearest nodes
    Snap {
        /// Snap tolerance in meters (defaults to the config value)
        #[arg(long)]
        tolerance: Option<f64>,
    },

    /// Compute link lengths
    Lengths,

    /// Compute subcatchment area, slope and width from a DEM
    Subcatchments {
        #[arg(long)]
        dem: PathBuf,
    },

    /// Report missing or zero attributes
    Validate,

    /// Write the SWMM input file
    Export {
        #[arg(long)]
        output: PathBuf,
        /// Title line (defaults to the config value)
        #[arg(long)]
        title: Option<String>,
    },

    /// ids, snap, elevations, lengths, subcatchments, validate, then export
    Run {
        #[arg(long)]
        dem: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        if let Err(err) = init_logging(level, log_dir) {
            eprintln!("warning: logging disabled: {err}");
        }
    }

    let response = run(cli);
    if response.ok {
        println!("{}", response.message);
        ExitCode::SUCCESS
    } else {
        eprintln!("{}", response.message);
        ExitCode::FAILURE
    }
}

fn run(cli: Cli) -> CommandResponse {
    let config = match ProjectConfig::load_or_default(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => return CommandResponse::failure(err.to_string()),
    };

    if let Commands::Init {
        output_dir,
        crs,
        crs_name,
        geographic,
    } = &cli.command
    {
        let description = if crs_name.trim().is_empty() {
            crs.clone()
        } else {
            crs_name.clone()
        };
        let crs = if *geographic {
            ProjectCrs::geographic(crs.trim(), description)
        } else {
            ProjectCrs::projected(crs.trim(), description)
        };
        return commands::init_project(output_dir, &crs);
    }

    let store_path = resolve_store_path(cli.db.as_deref());
    let conn = match open_db(&store_path) {
        Ok(conn) => conn,
        Err(err) => {
            return CommandResponse::failure(format!(
                "Failed to open project store {}: {err}",
                store_path.display()
            ))
        }
    };
    info!(
        "event=command module=cli status=ok store={}",
        store_path.display()
    );

    dispatch(&conn, cli.command, &config)
}

fn dispatch(conn: &Connection, command: Commands, config: &ProjectConfig) -> CommandResponse {
    let defaults = &config.defaults;
    match command {
        Commands::Init { .. } => CommandResponse::failure("init does not use an open store"),
        Commands::CheckCrs => commands::check_crs(conn),
        Commands::AddNode { id, at } => commands::add_node(conn, &id, at, defaults),
        Commands::AddLink { id, path } => match parse_vertices(&path) {
            Ok(vertices) => commands::add_link(conn, &id, vertices, defaults),
            Err(err) => CommandResponse::failure(format!("add-link failed: {err}")),
        },
        Commands::AddSubcatchment {
            id,
            boundary,
            outlet,
            rain_gage,
        } => match parse_vertices(&boundary) {
            Ok(vertices) => {
                commands::add_subcatchment(conn, &id, vertices, &outlet, &rain_gage, defaults)
            }
            Err(err) => CommandResponse::failure(format!("add-subcatchment failed: {err}")),
        },
        Commands::List { layer } => commands::list_layer(conn, layer.into()),
        Commands::Ids => commands::generate_ids(conn),
        Commands::Elevations { dem } => commands::sync_node_elevations(conn, &dem),
        Commands::Snap { tolerance } => {
            commands::snap_links(conn, tolerance.unwrap_or(config.snap_tolerance_m))
        }
        Commands::Lengths => commands::link_lengths(conn),
        Commands::Subcatchments { dem } => {
            commands::subcatchment_params(conn, &dem, config.slope_sample_count)
        }
        Commands::Validate => commands::validate(conn),
        Commands::Export { output, title } => {
            commands::export(conn, &output, title.as_deref().unwrap_or(&config.title))
        }
        Commands::Run { dem, output } => run_pipeline(conn, &dem, &output, config),
    }
}

/// Runs every preparation step in order and exports.
///
/// Stops at the first failing step; an incomplete network is reported and
/// still exported.
fn run_pipeline(
    conn: &Connection,
    dem: &Path,
    output: &Path,
    config: &ProjectConfig,
) -> CommandResponse {
    let crs = commands::check_crs(conn);
    if !crs.ok {
        return crs;
    }

    let steps: Vec<Box<dyn Fn() -> CommandResponse + '_>> = vec![
        Box::new(|| commands::generate_ids(conn)),
        Box::new(|| commands::snap_links(conn, config.snap_tolerance_m)),
        Box::new(|| commands::sync_node_elevations(conn, dem)),
        Box::new(|| commands::link_lengths(conn)),
        Box::new(|| commands::subcatchment_params(conn, dem, config.slope_sample_count)),
    ];

    let mut report = vec![crs.message];
    for step in steps {
        let response = step();
        if !response.ok {
            return response;
        }
        report.push(response.message);
    }

    let validation = commands::validate(conn);
    report.push(validation.message);

    let export = commands::export(conn, output, &config.title);
    report.push(export.message);
    CommandResponse {
        ok: export.ok,
        message: report.join("\n\n"),
    }
}
