use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{Level, info};
use tracing_subscriber::util::SubscriberInitExt;

use pm_core::project::DEFAULT_PROJECT_NAME;
use pm_core::vfs::{DEFAULT_BASE_PAGE, DEFAULT_MAGIC, PAGE_SIZE};
use pm_core::{
    FileBaseImage, Project, Resource, ResourceConfig, ResourceImage, build_resource, compose_rom,
    interchange,
};

#[derive(Parser)]
#[command(name = "pmrom")]
#[command(version, about = "Puzzle Maker resource and cartridge build tool", long_about = None)]
struct Cli {
    /// Log more (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone)]
struct ResourceArgs {
    /// ROM page the resource image is loaded at
    #[arg(long, default_value_t = DEFAULT_BASE_PAGE)]
    base_page: u16,

    /// Tag at the start of the resource image, up to 4 bytes
    #[arg(long, default_value = DEFAULT_MAGIC)]
    magic: String,
}

impl From<ResourceArgs> for ResourceConfig {
    fn from(args: ResourceArgs) -> Self {
        Self {
            base_page: args.base_page,
            magic: args.magic,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a project into a resource image
    Build {
        /// Path to the .project.json file
        project: PathBuf,

        /// Output file (defaults to "<project name>.resource.bin")
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        resource: ResourceArgs,
    },

    /// Compile a project and append it to a base cartridge image
    Rom {
        /// Path to the .project.json file
        project: PathBuf,

        /// The prebuilt player program
        #[arg(long)]
        base: PathBuf,

        /// Output file (defaults to "<project name>.sms")
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        resource: ResourceArgs,
    },

    /// List the files inside a resource image
    Inspect {
        /// Path to a resource image
        image: PathBuf,

        #[arg(long, default_value_t = DEFAULT_BASE_PAGE)]
        base_page: u16,
    },

    /// Run every build stage without writing anything
    Check {
        /// Path to the .project.json file
        project: PathBuf,
    },
}

fn setup_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .compact()
        .finish()
        .init();
}

/// Collapses every run of non-alphanumeric characters into one space.
fn file_stem_for(project: &Project) -> String {
    let stem = project
        .project_info
        .name
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if stem.is_empty() {
        DEFAULT_PROJECT_NAME.to_string()
    } else {
        stem
    }
}

/// `<project name><suffix>`, next to the project file.
fn default_output(project_path: &Path, project: &Project, suffix: &str) -> PathBuf {
    project_path.with_file_name(format!("{}{}", file_stem_for(project), suffix))
}

fn load_project(path: &Path) -> Result<Project> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    interchange::from_json(&json)
        .with_context(|| format!("{} is not a usable project", path.display()))
}

fn compile(path: &Path, config: &ResourceConfig) -> Result<(Project, Resource)> {
    let project = load_project(path)?;
    let resource = build_resource(&project, config)
        .with_context(|| format!("Failed to build resources for {}", path.display()))?;
    Ok((project, resource))
}

fn do_build(
    project_path: &Path,
    output: Option<PathBuf>,
    config: ResourceConfig,
) -> Result<PathBuf> {
    let (project, resource) = compile(project_path, &config)?;
    let out = output.unwrap_or_else(|| default_output(project_path, &project, ".resource.bin"));

    fs::write(&out, &resource.image)
        .with_context(|| format!("Failed to write {}", out.display()))?;

    println!(
        "Wrote {} ({} files, {} bytes)",
        out.display(),
        resource.files.len(),
        resource.image.len()
    );
    Ok(out)
}

fn do_rom(
    project_path: &Path,
    base: &Path,
    output: Option<PathBuf>,
    config: ResourceConfig,
) -> Result<PathBuf> {
    let (project, resource) = compile(project_path, &config)?;

    let rom = pollster::block_on(compose_rom(
        &FileBaseImage::new(base),
        &resource.image,
        config.base_page,
    ))
    .with_context(|| format!("Failed to compose a ROM from {}", base.display()))?;

    let out = output.unwrap_or_else(|| default_output(project_path, &project, ".sms"));
    fs::write(&out, &rom).with_context(|| format!("Failed to write {}", out.display()))?;

    println!("Wrote {} ({} bytes)", out.display(), rom.len());
    Ok(out)
}

fn do_inspect(path: &Path, base_page: u16) -> Result<()> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let image = ResourceImage::parse(&bytes, base_page)
        .with_context(|| format!("{} is not a resource image", path.display()))?;

    println!(
        "magic {:?}, {} files, {} pages",
        String::from_utf8_lossy(image.magic()),
        image.entries().len(),
        bytes.len().div_ceil(PAGE_SIZE)
    );
    for entry in image.entries() {
        println!(
            "  {:<14}  page {:>3}  offset {:04X}  {:>5} bytes",
            entry.name, entry.page, entry.offset, entry.size
        );
    }
    Ok(())
}

fn do_check(project_path: &Path) -> Result<()> {
    let (project, resource) = compile(project_path, &ResourceConfig::default())?;
    info!("{} checked", project_path.display());
    println!(
        "{}: {} maps, {} files, {} bytes",
        file_stem_for(&project),
        project.maps.len(),
        resource.files.len(),
        resource.image.len()
    );
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let result = match cli.command {
        Commands::Build {
            project,
            output,
            resource,
        } => do_build(&project, output, resource.into()).map(|_| ()),

        Commands::Rom {
            project,
            base,
            output,
            resource,
        } => do_rom(&project, &base, output, resource.into()).map(|_| ()),

        Commands::Inspect { image, base_page } => do_inspect(&image, base_page),

        Commands::Check { project } => do_check(&project),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
