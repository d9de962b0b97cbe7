use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pr_davinci::config::{EnvConfig, HandoffSettings, LayeredConfig};
use pr_davinci::resolver::{default_script_dir_candidates, resolve_paths};
use pr_davinci::{is_installed, GenerateRequest, HandoffResult, Pipeline};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Hand a PFM project off to DaVinci Resolve
#[derive(Parser)]
#[command(name = "pfm-davinci", version, about, long_about = None)]
#[command(after_help = "ENVIRONMENT:\n    \
    PFM_DAVINCI_RESOLVE_EXECUTABLE_PATH    Override the Resolve executable\n    \
    PFM_DAVINCI_RESOLVE_SCRIPT_PATH        Override the Fusion script directory\n    \
    RUST_LOG=debug                         Enable debug logging")]
struct Cli {
    /// JSON settings file
    #[arg(short = 's', long = "settings", global = true)]
    settings: Option<PathBuf>,

    /// Engine installation directory (defaults to the current directory)
    #[arg(long = "program-dir", global = true)]
    program_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch DaVinci Resolve and write the import script for a project
    Generate {
        /// Project file, absolute or relative to the program directory
        project: PathBuf,

        /// JSON file describing the audio track mapping
        #[arg(short = 'a', long = "audio-map")]
        audio_map: Option<PathBuf>,
    },
    /// Check whether DaVinci Resolve is installed
    IsInstalled,
    /// Show the resolved DaVinci Resolve paths
    Paths,
    /// List all result codes
    Results,
}

fn load_settings(cli: &Cli) -> Result<HandoffSettings> {
    let mut settings = match &cli.settings {
        Some(path) => HandoffSettings::load(path)?,
        None => HandoffSettings::from_working_dir()?,
    };
    if let Some(dir) = &cli.program_dir {
        let overrides = (settings.executable_path, settings.script_path);
        settings = HandoffSettings::for_program_dir(dir);
        (settings.executable_path, settings.script_path) = overrides;
    }
    Ok(settings)
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = load_settings(&cli)?;
    let config = LayeredConfig::new().with(EnvConfig).with(&settings);

    match cli.command {
        Commands::Generate { project, audio_map } => {
            let mut request = GenerateRequest::new(project);
            if let Some(path) = audio_map {
                let text = fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read audio map: {:?}", path))?;
                request = request.with_audio_map(text);
            }

            let result = Pipeline::new(&config, &settings).run(&request);
            println!("{} ({})", result, result.description());
            if !result.is_success() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::IsInstalled => {
            let installed = is_installed(&config);
            println!("{}", installed);
            if !installed {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Paths => {
            let paths = resolve_paths(&config, &default_script_dir_candidates());
            let show = |path: Option<PathBuf>| {
                path.map(|p| p.display().to_string())
                    .unwrap_or_else(|| "<unresolved>".to_string())
            };
            println!("executable: {}", show(paths.executable));
            println!("script directory: {}", show(paths.script_dir));
        }
        Commands::Results => {
            for result in HandoffResult::ALL {
                println!("{:>2}  {:<45} {}", result.code(), result.lua_constant(), result.name());
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
