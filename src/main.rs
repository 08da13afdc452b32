//! Command line wrapper around the `css` and `html` rewriters.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand};

use cachebust::{CachebustConfig, Cachebuster, RewriteOptions};

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
  /// Log every rewritten reference
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Stamp local `@import` statements in a stylesheet
  Css(RewriteArgs),
  /// Stamp local asset references in markup
  Html(RewriteArgs),
}

#[derive(Args)]
struct RewriteArgs {
  /// Input file, or `-` for stdin
  input: Option<PathBuf>,

  /// Directory referenced files are resolved against
  #[arg(long)]
  path: Option<PathBuf>,

  /// Query parameter name
  #[arg(long)]
  key: Option<String>,

  /// Tag/attribute pair to scan, replacing the default table (repeatable)
  #[arg(long = "tag", value_name = "TAG=ATTR", value_parser = parse_tag_pair)]
  tags: Vec<(String, String)>,

  /// JSON configuration file (defaults to ./cachebust.config.json when present)
  #[arg(long)]
  config: Option<PathBuf>,

  /// Write the result to this file instead of stdout
  #[arg(short, long, conflicts_with = "in_place")]
  output: Option<PathBuf>,

  /// Overwrite the input file
  #[arg(long)]
  in_place: bool,
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let default_filter = if cli.verbose { "debug" } else { "warn" };
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
    .init();

  match cli.command {
    Command::Css(args) => run(&args, Mode::Css),
    Command::Html(args) => run(&args, Mode::Html),
  }
}

#[derive(Clone, Copy)]
enum Mode {
  Css,
  Html,
}

fn run(args: &RewriteArgs, mode: Mode) -> Result<()> {
  let options = resolve_options(args)?;
  let input = input_file(args);
  let source = read_input(input)?;

  let buster = Cachebuster::new(options);
  let rewritten = match mode {
    Mode::Css => buster.css_bytes(&source),
    Mode::Html => buster.html_bytes(&source),
  }
  .ok_or_else(|| anyhow!("input is not UTF-8 text"))?;

  if args.in_place {
    let Some(target) = input else {
      bail!("--in-place requires an input file");
    };
    return write_file(target, &rewritten);
  }

  match &args.output {
    Some(target) => write_file(target, &rewritten),
    None => {
      let mut stdout = io::stdout().lock();
      stdout
        .write_all(rewritten.as_bytes())
        .context("failed to write to stdout")?;
      stdout.flush().context("failed to flush stdout")
    }
  }
}

fn resolve_options(args: &RewriteArgs) -> Result<RewriteOptions> {
  let config = match &args.config {
    Some(path) => CachebustConfig::load_from_path(path)?,
    None => {
      let cwd = std::env::current_dir().context("failed to read current directory")?;
      CachebustConfig::discover(&cwd)
    }
  };

  let mut options = config.to_options();
  if let Some(path) = &args.path {
    options.base_path = path.clone();
  }
  if let Some(key) = &args.key {
    options = options.query_key(key.as_str());
  }
  Ok(options.tag_attributes(args.tags.iter().cloned()))
}

fn input_file(args: &RewriteArgs) -> Option<&Path> {
  args
    .input
    .as_deref()
    .filter(|path| path.as_os_str() != "-")
}

fn read_input(input: Option<&Path>) -> Result<Vec<u8>> {
  match input {
    Some(path) => fs::read(path).with_context(|| format!("failed to read {}", path.display())),
    None => {
      let mut buffer = Vec::new();
      io::stdin()
        .read_to_end(&mut buffer)
        .context("failed to read stdin")?;
      Ok(buffer)
    }
  }
}

fn write_file(target: &Path, contents: &str) -> Result<()> {
  fs::write(target, contents).with_context(|| format!("failed to write {}", target.display()))
}

fn parse_tag_pair(value: &str) -> Result<(String, String), String> {
  let (tag, attribute) = value
    .split_once('=')
    .ok_or_else(|| format!("expected TAG=ATTR, got `{value}`"))?;
  let (tag, attribute) = (tag.trim(), attribute.trim());
  if tag.is_empty() || attribute.is_empty() {
    return Err(format!("expected TAG=ATTR, got `{value}`"));
  }
  Ok((tag.to_string(), attribute.to_string()))
}
