use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use confset::loader::{
	ConfigLoader, Deserializer, Document, EnvDeserializer, JsonDeserializer, Loader, Overridable,
	TomlDeserializer, YamlDeserializer, deserializer_for_path,
};
use confset::{ConfsetError, Value};

#[derive(Parser)]
#[command(name = "confset")]
#[command(
	author,
	version,
	about = "Load layered configuration and apply path-addressed overrides"
)]
#[command(arg_required_else_help = true)]
struct Cli {
	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// Print the effective configuration as JSON
	Show(SourceArgs),
	/// Load the configuration and report every override that does not apply
	Check(SourceArgs),
}

#[derive(Args)]
struct SourceArgs {
	/// Main config file (not needed with --format env)
	file: Option<PathBuf>,

	/// Format of the config files; inferred from the extension when omitted
	#[arg(long, value_enum)]
	format: Option<Format>,

	/// Prefix of the environment variables read with --format env
	#[arg(long, value_name = "PREFIX", requires = "format")]
	env_prefix: Option<String>,

	/// File merged over the main one
	#[arg(long, value_name = "FILE")]
	override_file: Option<PathBuf>,

	/// Override a value by path; VALUE is a JSON literal or a plain string
	#[arg(long = "set", value_name = "PATH=VALUE", value_parser = parse_assignment)]
	set: Vec<(String, serde_json::Value)>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
	Json,
	Yaml,
	Toml,
	Env,
}

fn main() -> ExitCode {
	init_logging();

	match run() {
		Ok(code) => code,
		Err(e) => {
			eprintln!("error: {e:?}");
			ExitCode::FAILURE
		}
	}
}

fn init_logging() {
	let filter = EnvFilter::try_from_env("CONFSET_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_target(false)
		.with_writer(std::io::stderr)
		.init();
}

fn run() -> Result<ExitCode> {
	let cli = Cli::parse();

	match cli.command {
		Commands::Show(args) => handle_show(&args),
		Commands::Check(args) => handle_check(&args),
	}
}

fn handle_show(args: &SourceArgs) -> Result<ExitCode> {
	let loader = build_loader(args)?;
	let mut document = Document::Null;
	loader
		.load(&mut document)
		.with_context(|| format!("Failed to load {}", loader.main_file().display()))?;

	let rendered =
		serde_json::to_string_pretty(&document).context("Failed to render configuration")?;
	println!("{}", rendered);
	Ok(ExitCode::SUCCESS)
}

fn handle_check(args: &SourceArgs) -> Result<ExitCode> {
	let loader = build_loader(args)?;
	let mut document = Document::Null;

	match loader.load(&mut document) {
		Ok(()) => {
			println!(
				"Configuration is valid ({} override(s) applied)",
				loader.overrides().len()
			);
			Ok(ExitCode::SUCCESS)
		}
		Err(ConfsetError::Overrides { errors }) => {
			println!("Overrides that could not be applied:");
			for err in &errors {
				println!("  {}", err);
			}
			Ok(ExitCode::FAILURE)
		}
		Err(e) => Err(e).with_context(|| format!("Failed to load {}", loader.main_file().display())),
	}
}

fn build_loader(args: &SourceArgs) -> Result<ConfigLoader> {
	let mut loader = match (&args.file, args.format) {
		(_, Some(Format::Env)) => {
			let mut env = EnvDeserializer::new();
			if let Some(ref prefix) = args.env_prefix {
				env = env.with_prefix(prefix);
			}
			let name = args
				.file
				.as_deref()
				.map(|file| file.display().to_string())
				.unwrap_or_else(|| "environment".to_string());
			ConfigLoader::new(name).with_deserializer(env)
		}
		(Some(file), format) => {
			let deserializer = resolve_deserializer(file, format)?;
			let (dir, name) = split_file(file)?;
			ConfigLoader::new(name)
				.with_path(dir)
				.with_deserializer(deserializer)
		}
		(None, _) => anyhow::bail!("A config file is required unless --format env is used"),
	};

	if let Some(ref override_file) = args.override_file {
		let (dir, name) = split_file(override_file)?;
		loader = loader.with_override_file(dir, &name);
		if let Some(deserializer) = deserializer_for_path(override_file) {
			loader = loader.with_override_deserializer(deserializer);
		}
	}

	for (path, value) in &args.set {
		loader
			.set_override(path, Value::new(value.clone()))
			.with_context(|| format!("Invalid override path: {}", path))?;
	}

	Ok(loader)
}

fn resolve_deserializer(file: &Path, format: Option<Format>) -> Result<Box<dyn Deserializer>> {
	let deserializer: Box<dyn Deserializer> = match format {
		Some(Format::Json) => Box::new(JsonDeserializer),
		Some(Format::Yaml) => Box::new(YamlDeserializer),
		Some(Format::Toml) => Box::new(TomlDeserializer),
		Some(Format::Env) => Box::new(EnvDeserializer::new()),
		None => deserializer_for_path(file).ok_or_else(|| {
			anyhow::anyhow!(
				"Cannot infer format of {}; pass --format",
				file.display()
			)
		})?,
	};
	Ok(deserializer)
}

fn split_file(file: &Path) -> Result<(PathBuf, String)> {
	let name = file
		.file_name()
		.and_then(|name| name.to_str())
		.ok_or_else(|| anyhow::anyhow!("Not a file path: {}", file.display()))?
		.to_string();
	let dir = match file.parent() {
		Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
		_ => PathBuf::from("."),
	};
	Ok((dir, name))
}

/// Parse `PATH=VALUE`, reading VALUE as JSON and falling back to a string.
fn parse_assignment(raw: &str) -> std::result::Result<(String, serde_json::Value), String> {
	let (path, value) = raw
		.split_once('=')
		.ok_or_else(|| format!("expected PATH=VALUE, got `{}`", raw))?;
	let value = serde_json::from_str(value)
		.unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
	Ok((path.to_string(), value))
}
