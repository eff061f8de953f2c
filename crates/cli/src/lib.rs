use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use lumpy_change_lump::{
    default_table, ExtractorConfig, FunctionSpan, LanguageTable, LumpExtractor,
};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

mod report;

#[derive(Parser)]
#[command(name = "lumpy")]
#[command(about = "Cut commented excerpts of changed code out of source files", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Excerpt changed functions or lines of one file
    Lump(LumpArgs),

    /// Show which language an extension resolves to
    Lookup(LookupArgs),
}

#[derive(Args)]
struct LumpArgs {
    /// Source file to excerpt ("-" reads stdin)
    file: PathBuf,

    /// Changed function as START:END or START:END:NAME (1-indexed, repeatable)
    #[arg(long = "function", value_name = "START:END", value_parser = parse_function_span)]
    functions: Vec<FunctionSpan>,

    /// Changed line numbers (1-indexed, comma separated)
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    lines: Vec<isize>,

    /// Path reported for stdin input, also used for language detection
    #[arg(long)]
    name: Option<String>,

    /// Language table to use instead of the built-in one
    #[arg(long)]
    table: Option<PathBuf>,

    /// Extractor config file (defaults to .lumpyconfig.toml in the current directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output JSON instead of markdown
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct LookupArgs {
    /// File extension, with or without the leading dot
    extension: String,

    /// Language table to use instead of the built-in one
    #[arg(long)]
    table: Option<PathBuf>,
}

pub fn main_entry() -> Result<()> {
    let mut cli = Cli::parse();

    if let Commands::Lump(args) = &cli.command {
        if args.json {
            cli.quiet = true;
        }
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    match cli.command {
        Commands::Lump(args) => run_lump(args),
        Commands::Lookup(args) => run_lookup(args),
    }
}

fn run_lump(args: LumpArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => ExtractorConfig::from_path(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ExtractorConfig::discover(".").context("Failed to load .lumpyconfig.toml")?,
    };
    if let Some(table) = &args.table {
        config.language_table = Some(table.clone());
    }

    let extractor =
        LumpExtractor::for_directory(config, ".").context("Failed to set up extractor")?;
    let (path, source) = read_source(&args.file, args.name.as_deref())?;

    let excerpts = if extractor.is_ignored(&path) {
        log::info!("{path} matches an ignore rule, nothing to excerpt");
        Vec::new()
    } else if args.functions.is_empty() && args.lines.is_empty() {
        vec![extractor.whole_file(&path, &source)]
    } else {
        extractor.extract_source(&path, &source, &args.functions, &args.lines)
    };
    log::info!("{path}: {} excerpt(s)", excerpts.len());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&excerpts)?);
    } else {
        print!("{}", report::render_text(&excerpts));
    }
    Ok(())
}

fn run_lookup(args: LookupArgs) -> Result<()> {
    let loaded;
    let table = match &args.table {
        Some(path) => {
            loaded = LanguageTable::from_path(path)
                .with_context(|| format!("Failed to load language table {}", path.display()))?;
            &loaded
        }
        None => default_table(),
    };

    match table.lookup(&args.extension) {
        Some(rule) => println!(
            "{}\t{}\t{}",
            rule.name(),
            rule.markdown_name(),
            rule.comment_family().unwrap_or("-")
        ),
        None => println!("unknown"),
    }
    Ok(())
}

fn read_source(file: &Path, name: Option<&str>) -> Result<(String, String)> {
    if file.as_os_str() == "-" {
        let mut source = String::new();
        io::stdin()
            .read_to_string(&mut source)
            .context("Failed to read stdin")?;
        return Ok((name.unwrap_or("stdin").to_string(), source));
    }

    let source = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let path = name.map_or_else(|| file.display().to_string(), str::to_string);
    Ok((path, source))
}

fn parse_function_span(raw: &str) -> std::result::Result<FunctionSpan, String> {
    let mut parts = raw.splitn(3, ':');
    let start = parts
        .next()
        .and_then(|part| part.trim().parse::<isize>().ok())
        .ok_or_else(|| format!("invalid function start in {raw:?}"))?;
    let end = parts
        .next()
        .and_then(|part| part.trim().parse::<isize>().ok())
        .ok_or_else(|| format!("invalid function end in {raw:?} (expected START:END)"))?;

    let span = FunctionSpan::new(start, end);
    Ok(match parts.next().map(str::trim).filter(|name| !name.is_empty()) {
        Some(name) => span.named(name),
        None => span,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_function_span() {
        assert_eq!(parse_function_span("3:4"), Ok(FunctionSpan::new(3, 4)));
        assert_eq!(
            parse_function_span("10:20:render"),
            Ok(FunctionSpan::new(10, 20).named("render"))
        );
        assert!(parse_function_span("3").is_err());
        assert!(parse_function_span("a:b").is_err());
    }

    #[test]
    fn test_cli_parses_lines_list() {
        let cli = Cli::try_parse_from(["lumpy", "lump", "a.py", "--lines", "5,6,20"])
            .expect("valid args");
        match cli.command {
            Commands::Lump(args) => assert_eq!(args.lines, vec![5, 6, 20]),
            Commands::Lookup(_) => panic!("expected lump"),
        }
    }
}
