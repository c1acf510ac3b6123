use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "collage", version)]
struct Cli {
    /// Log at debug level.
    #[arg(long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Flatten a canvas to PNG.
    Render(RenderArgs),
    /// Print a summary of a canvas.
    Info(InfoArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Canvas JSON.
    #[arg(long)]
    canvas: PathBuf,

    /// Directory holding the canvas assets. Defaults to the canvas file's directory.
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Output pixels per canvas unit (overrides the options file).
    #[arg(long)]
    scale: Option<f64>,

    /// Session options JSON.
    #[arg(long)]
    opts: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct InfoArgs {
    /// Canvas JSON.
    #[arg(long)]
    canvas: PathBuf,

    /// Session options JSON.
    #[arg(long)]
    opts: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Info(args) => cmd_info(args),
    }
}

fn load_opts(path: Option<&PathBuf>) -> anyhow::Result<collage::SessionOpts> {
    let opts = match path {
        Some(p) => collage::SessionOpts::from_json_path(p)?,
        None => collage::SessionOpts::default(),
    };
    Ok(opts.with_env_overrides())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let canvas = collage::Canvas::from_json_path(&args.canvas)?;
    let assets_root = args.assets.clone().unwrap_or_else(|| {
        args.canvas
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
    });
    let mut opts = load_opts(args.opts.as_ref())?;
    if let Some(scale) = args.scale {
        opts = opts.with_export_scale(scale);
    }
    opts.validate()?;

    let store = Arc::new(collage::FsAssetStore::new(assets_root));
    let mut session = collage::EditSession::new(canvas, store, opts);
    let scene = session.prepare_scene()?;
    for id in scene.skipped() {
        tracing::warn!(layer = %id, "layer skipped");
    }
    let png = scene.render()?.to_png()?;

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(&args.out, png)
        .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_info(args: InfoArgs) -> anyhow::Result<()> {
    let canvas = collage::Canvas::from_json_path(&args.canvas)?;
    let opts = load_opts(args.opts.as_ref())?;
    let (w, h) = collage::output_size(canvas.size, opts.export_scale);
    println!("canvas {}x{}", canvas.size.width, canvas.size.height);
    println!("output {w}x{h}");
    println!("cache_capacity {}", opts.cache_capacity);
    println!("layers {}", canvas.len());
    for layer in canvas.paint_order() {
        match &layer.content {
            collage::LayerContent::Image(img) => println!(
                "  {} image z={} source={} mask={}",
                layer.id,
                layer.z_index,
                img.source,
                img.mask.as_deref().unwrap_or("-")
            ),
            collage::LayerContent::Text(t) => {
                println!("  {} text z={} {:?}", layer.id, layer.z_index, t.text)
            }
        }
    }
    if let Some(d) = &canvas.drawing {
        println!("drawing strokes={}", d.strokes.len());
    }
    Ok(())
}
