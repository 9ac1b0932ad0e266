use anyhow::{Context, bail};
use clap::{ArgAction, Parser, ValueEnum};
use log::{error, info};
use parsley::{
    Config, Document, Format, FrameErrorPolicy, Model, SchemaPolicy,
    api::{format_from_name, sniff_format},
    error::cause_chain,
    detect_format, extract_brands, parse_file, project_from_external, project_to_external,
    write_binary,
};
use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, IsTerminal, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(version, about = "Lossless MP4 atom / ID3v2 tag dumper and rebuilder")]
struct Args {
    /// Input file (MP4 family, MP3, or a JSON document with --restore); `-` reads stdin
    path: Option<String>,

    /// Print the major and compatible brands of an MP4 file
    #[arg(long, action = ArgAction::SetTrue, conflicts_with = "restore")]
    brands: bool,

    /// Rebuild a binary file from a JSON document
    #[arg(long, action = ArgAction::SetTrue)]
    restore: bool,

    /// Output path for --restore (default: `<stem>.restored.<ext>` next to the document)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Force the input format instead of detecting it
    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// Emit JSON on stdout (for --brands)
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Fail when an unknown type shows up with two different shapes
    #[arg(long, action = ArgAction::SetTrue)]
    strict_schema: bool,

    /// What to do with tag frames that cannot be decoded
    #[arg(long, value_enum)]
    frame_errors: Option<FrameErrorsArg>,

    /// More log output (repeatable)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, action = ArgAction::SetTrue)]
    quiet: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    Mp4,
    Mp3,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FrameErrorsArg {
    Preserve,
    Skip,
    Fail,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let level = match (args.quiet, args.verbose) {
        (true, _) => "error",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let _logger = flexi_logger::Logger::try_with_env_or_str(level)
        .and_then(|l| l.log_to_stderr().start())
        .map_err(|e| eprintln!("logger setup failed: {e}"))
        .ok();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let err: &(dyn std::error::Error + 'static) = e.as_ref();
            for cause in cause_chain(err) {
                error!("{cause}");
            }
            ExitCode::from(1)
        }
    }
}

fn load_config(args: &Args) -> anyhow::Result<Config> {
    let mut cfg = match &args.config {
        Some(p) => Config::load(p).with_context(|| format!("loading config {}", p.display()))?,
        None => Config::default(),
    };
    if args.strict_schema {
        cfg.schema = SchemaPolicy::Strict;
    }
    if let Some(f) = args.frame_errors {
        cfg.frame_errors = match f {
            FrameErrorsArg::Preserve => FrameErrorPolicy::Preserve,
            FrameErrorsArg::Skip => FrameErrorPolicy::Skip,
            FrameErrorsArg::Fail => FrameErrorPolicy::Fail,
        };
    }
    Ok(cfg)
}

fn run(args: &Args) -> anyhow::Result<()> {
    let cfg = load_config(args)?;
    let from_stdin = match args.path.as_deref() {
        Some("-") => true,
        Some(_) => false,
        None if !std::io::stdin().is_terminal() => true,
        None => bail!("no input file given (see --help)"),
    };

    if args.brands {
        let Some(path) = args.path.as_deref().filter(|_| !from_stdin) else {
            bail!("--brands needs exactly one input file");
        };
        return print_brands(Path::new(path), args.json);
    }
    if args.restore {
        let Some(path) = args.path.as_deref().filter(|_| !from_stdin) else {
            bail!("--restore needs a JSON document path");
        };
        return restore(Path::new(path), args.output.as_deref());
    }

    let (name, data) = if from_stdin {
        let mut buf = Vec::new();
        std::io::stdin().read_to_end(&mut buf).context("reading stdin")?;
        (PathBuf::from(&cfg.stdin_name), buf)
    } else {
        let path = PathBuf::from(args.path.as_deref().unwrap_or_default());
        let buf = std::fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
        (path, buf)
    };

    let format = match args.format {
        Some(FormatArg::Mp4) => Format::AtomTree,
        Some(FormatArg::Mp3) => Format::TagFrame,
        None if from_stdin => format_from_name(&name)
            .or_else(|| sniff_format(&data))
            .context("cannot determine the format of stdin")?,
        None => detect_format(&name)?,
    };

    let input = (!from_stdin).then_some(name.as_path());
    dump(&name, input, data, format, &cfg)
}

/// True when both paths exist and name the same file.
fn same_file(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn ensure_not_input(out: &Path, input: Option<&Path>) -> anyhow::Result<()> {
    if let Some(input) = input.filter(|i| same_file(out, i)) {
        bail!("refusing to overwrite the input file {}", input.display());
    }
    Ok(())
}

fn print_brands(path: &Path, json: bool) -> anyhow::Result<()> {
    let mut f = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let info = extract_brands(&mut f).with_context(|| format!("reading brands of {}", path.display()))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        println!("{info}");
    }
    Ok(())
}

/// `name` drives output naming; `input` is the real file read, if any.
fn dump(
    name: &Path,
    input: Option<&Path>,
    data: Vec<u8>,
    format: Format,
    cfg: &Config,
) -> anyhow::Result<()> {
    let model = parse_file(&mut Cursor::new(data), format, cfg)
        .with_context(|| format!("parsing {}", name.display()))?;
    let doc = project_to_external(&model, cfg)?;

    let json_path = name.with_extension("json");
    ensure_not_input(&json_path, input)?;
    write_json(&json_path, &doc)?;
    info!("wrote {}", json_path.display());

    if let Model::Tag(tag) = &model {
        info!("Real tag size is {} byte(s)", tag.tag_size()?);
        let mut id3_path = name.with_extension("id3");
        if input.is_some_and(|i| same_file(&id3_path, i)) {
            id3_path = name.with_extension("rewritten.id3");
        }
        ensure_not_input(&id3_path, input)?;
        let mut out = BufWriter::new(
            File::create(&id3_path).with_context(|| format!("creating {}", id3_path.display()))?,
        );
        tag.write(&mut out)?;
        out.flush()?;
        info!("wrote {}", id3_path.display());
    }
    Ok(())
}

fn write_json(path: &Path, doc: &Document) -> anyhow::Result<()> {
    let mut out =
        BufWriter::new(File::create(path).with_context(|| format!("creating {}", path.display()))?);
    serde_json::to_writer_pretty(&mut out, doc)?;
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(())
}

fn restore(doc_path: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    let f = File::open(doc_path).with_context(|| format!("opening {}", doc_path.display()))?;
    let doc: Document = serde_json::from_reader(BufReader::new(f))
        .with_context(|| format!("reading document {}", doc_path.display()))?;
    let model = project_from_external(&doc)?;

    let out_path = match output {
        Some(p) => p.to_path_buf(),
        None => doc_path.with_extension(match model.format() {
            Format::AtomTree => "restored.mp4",
            Format::TagFrame => "restored.id3",
        }),
    };
    ensure_not_input(&out_path, Some(doc_path))?;
    let mut out = BufWriter::new(
        File::create(&out_path).with_context(|| format!("creating {}", out_path.display()))?,
    );
    write_binary(&model, &mut out)?;
    out.flush()?;
    info!("wrote {}", out_path.display());
    Ok(())
}
