use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "scoreband", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Annotate a poster file with an already-fetched score list.
    Annotate(AnnotateArgs),
    /// Resolve an IMDb id, fetch its poster and scores, annotate (requires the `fetch` feature).
    Fetch(FetchArgs),
}

#[derive(Parser, Debug)]
struct AnnotateArgs {
    /// Input poster image.
    #[arg(long)]
    poster: PathBuf,

    /// Score list JSON (array of `{source, logo, raw}` records).
    #[arg(long)]
    scores: PathBuf,

    /// Output image path (.png or .jpg).
    #[arg(long)]
    out: PathBuf,

    /// Font file for badge text.
    #[arg(long, default_value = "Ubuntu-C.ttf")]
    font: PathBuf,

    /// Directory holding provider logo files.
    #[arg(long, default_value = ".")]
    logos: PathBuf,
}

#[derive(Parser, Debug)]
struct FetchArgs {
    /// IMDb id (e.g. tt0137523).
    #[arg(long)]
    id: String,

    /// Output image path (.png or .jpg).
    #[arg(long)]
    out: PathBuf,

    /// Font file for badge text.
    #[arg(long, default_value = "Ubuntu-C.ttf")]
    font: PathBuf,

    /// Directory holding provider logo files.
    #[arg(long, default_value = ".")]
    logos: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Annotate(args) => cmd_annotate(args),
        Command::Fetch(args) => cmd_fetch(args),
    }
}

fn read_scores_json(path: &Path) -> anyhow::Result<Vec<scoreband::SourceScore>> {
    let f = File::open(path).with_context(|| format!("open score list '{}'", path.display()))?;
    let r = BufReader::new(f);
    let scores: Vec<scoreband::SourceScore> = serde_json::from_reader(r).map_err(|e| {
        scoreband::ScorebandError::serde(format!("parse score list '{}': {e}", path.display()))
    })?;
    Ok(scores)
}

fn annotate_and_write(
    mut poster: scoreband::PosterRgba,
    scores: &[scoreband::SourceScore],
    font: &Path,
    logos_dir: &Path,
    out: &Path,
) -> anyhow::Result<()> {
    let font_bytes =
        std::fs::read(font).with_context(|| format!("read font '{}'", font.display()))?;
    let mut shaper = scoreband::TextShaper::from_font_bytes(&font_bytes)?;
    let mut logos = scoreband::LogoStore::new(logos_dir);
    let style = scoreband::BandStyle::default();

    scoreband::annotate_poster(&mut poster, scores, &style, &mut shaper, &mut logos)?;

    scoreband::assets::decode::unpremultiply_rgba8_in_place(&mut poster.data);
    poster.premultiplied = false;

    if let Some(parent) = out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    let ext = out
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match ext.as_str() {
        "png" => image::save_buffer_with_format(
            out,
            &poster.data,
            poster.width,
            poster.height,
            image::ColorType::Rgba8,
            image::ImageFormat::Png,
        )
        .with_context(|| format!("write png '{}'", out.display()))?,
        "jpg" | "jpeg" => {
            let rgb = scoreband::assets::decode::strip_alpha_to_rgb8(&poster.data);
            image::save_buffer_with_format(
                out,
                &rgb,
                poster.width,
                poster.height,
                image::ColorType::Rgb8,
                image::ImageFormat::Jpeg,
            )
            .with_context(|| format!("write jpeg '{}'", out.display()))?;
        }
        other => anyhow::bail!("unsupported output extension '{other}' (use .png or .jpg)"),
    }

    eprintln!("wrote {}", out.display());
    Ok(())
}

fn cmd_annotate(args: AnnotateArgs) -> anyhow::Result<()> {
    let poster_bytes = std::fs::read(&args.poster)
        .with_context(|| format!("read poster '{}'", args.poster.display()))?;
    let poster = scoreband::assets::decode::decode_poster(&poster_bytes)?;
    let scores = read_scores_json(&args.scores)?;

    annotate_and_write(poster, &scores, &args.font, &args.logos, &args.out)
}

fn cmd_fetch(args: FetchArgs) -> anyhow::Result<()> {
    let cfg = scoreband::ProviderConfig::from_env()?;

    let media = scoreband::catalog::find_by_imdb_id(&args.id, &cfg)?;
    let poster_bytes = scoreband::catalog::fetch_poster_bytes(&media, &cfg)?;
    let poster = scoreband::assets::decode::decode_poster(&poster_bytes)?;
    let scores = scoreband::collect_scores(&scoreband::RatingSource::DEFAULT, &media, &cfg);

    annotate_and_write(poster, &scores, &args.font, &args.logos, &args.out)
}
