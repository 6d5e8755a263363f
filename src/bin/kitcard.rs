use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "kitcard", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a saved project as a PNG.
    Render(RenderArgs),
    /// Print a summary of a saved project.
    Inspect(ProjectArgs),
}

#[derive(Parser, Debug)]
struct ProjectArgs {
    /// Project description JSON.
    #[arg(long)]
    project: PathBuf,

    /// Directory that storage references resolve against.
    #[arg(long)]
    store: PathBuf,

    /// Template catalog JSON.
    #[arg(long)]
    templates: PathBuf,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    #[command(flatten)]
    project: ProjectArgs,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Write a downscaled preview with this longest edge instead of the full export.
    #[arg(long)]
    preview: Option<u32>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Inspect(args) => cmd_inspect(args),
    }
}

fn load(args: &ProjectArgs) -> anyhow::Result<kitcard::RestoredProject> {
    let store = kitcard::DirStore::new(&args.store);

    let catalog_json = read(&args.templates)?;
    let specs = kitcard::TemplateCatalog::parse_specs(&catalog_json)?;
    let mut catalog = kitcard::TemplateCatalog::new();
    let loaded = catalog.load(&specs, &store);
    for (id, err) in &loaded.failed {
        eprintln!("warning: template '{id}' unavailable: {err}");
    }

    let project = kitcard::ProjectDescription::from_json(&read(&args.project)?)?;
    let opts = kitcard::SessionOpts::default().with_limits(kitcard::UploadLimits::from_env());
    Ok(kitcard::restore_project(&project, &catalog, &store, &opts)?)
}

fn read(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("read '{}'", path.display()))
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let restored = load(&args.project)?;
    report(&restored);

    let bytes = match args.preview {
        Some(max_dim) => {
            let preview = kitcard::render_preview(&restored.document, max_dim)?;
            kitcard::encode_png(&preview.frame)?
        }
        None => kitcard::export_png(&restored.document)?.bytes,
    };

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(&args.out, &bytes)
        .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_inspect(args: ProjectArgs) -> anyhow::Result<()> {
    let restored = load(&args)?;
    let doc = &restored.document;

    match doc.base_card() {
        Some(base) => println!(
            "base card: {} ({}x{})",
            base.id, base.canvas.width, base.canvas.height
        ),
        None => println!("base card: none"),
    }
    println!("images: {}", doc.uploads().len());
    for slot in doc.uploads() {
        match &slot.state {
            kitcard::SlotState::Ready(img) => {
                println!("  {} {}x{} {}", slot.id, img.width, img.height, slot.name)
            }
            kitcard::SlotState::Failed(reason) => {
                println!("  {} failed: {reason}", slot.id)
            }
            kitcard::SlotState::Pending => println!("  {} pending", slot.id),
        }
    }
    println!("cutouts: {}", doc.cutouts().len());
    for c in doc.cutouts() {
        let t = c.transform;
        println!(
            "  z={} {} from {} at ({}, {}) scale {} rot {}{}",
            c.z_index,
            c.id,
            c.source,
            t.x,
            t.y,
            t.scale,
            t.rotation,
            if c.visible { "" } else { " hidden" }
        );
    }
    report(&restored);
    Ok(())
}

fn report(restored: &kitcard::RestoredProject) {
    for (id, reason) in &restored.failed {
        eprintln!("warning: image {id} unavailable: {reason}");
    }
    for id in &restored.out_of_bounds {
        eprintln!("warning: cutout {id} extends outside the base card");
    }
}
