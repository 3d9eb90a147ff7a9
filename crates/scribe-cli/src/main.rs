//! `scribe` command-line front end

use anyhow::{bail, Context};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use scribe_engine::{CodeSession, EmitMode, LoadedUnit, ScribeConfig, SourceRef};
use scribe_manifest::{Manifest, Resolver};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    let sources = Arg::new("sources")
        .required(true)
        .num_args(1..)
        .help("Source files or class names");

    Command::new("scribe")
        .version(scribe_engine::VERSION)
        .about("Structural PHP source mutation with toolchain validation")
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Configuration file (TOML)"),
        )
        .arg(
            Arg::new("root")
                .long("root")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Project root holding composer.json"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::Count)
                .help("Log debug output"),
        )
        .subcommand(
            Command::new("print")
                .about("Load sources and print them canonically")
                .arg(sources.clone())
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the structural model as JSON"),
                ),
        )
        .subcommand(
            Command::new("apply")
                .about("Apply mutations, validate, and emit")
                .arg(sources)
                .arg(repeated("import", "Import a class"))
                .arg(repeated("use", "Use a trait"))
                .arg(repeated("extends", "Set the base type"))
                .arg(repeated("implements", "Implement an interface"))
                .arg(repeated("doc", "Append a doc comment line"))
                .arg(
                    Arg::new("strict-types")
                        .long("strict-types")
                        .action(ArgAction::SetTrue)
                        .help("Add declare(strict_types=1)"),
                )
                .arg(
                    Arg::new("write")
                        .long("write")
                        .action(ArgAction::SetTrue)
                        .conflicts_with("both")
                        .help("Write back instead of printing"),
                )
                .arg(
                    Arg::new("both")
                        .long("both")
                        .action(ArgAction::SetTrue)
                        .help("Write back and print"),
                ),
        )
        .subcommand(
            Command::new("resolve")
                .about("Show the file registered for a class")
                .arg(Arg::new("name").required(true).help("Class name")),
        )
        .subcommand(
            Command::new("classes")
                .about("List manifest entries inside a namespace")
                .arg(Arg::new("prefix").help("Namespace prefix")),
        )
        .subcommand(
            Command::new("check")
                .about("Run the syntax checker on a file")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("File to check"),
                ),
        )
}

fn repeated(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .value_name("CLASS")
        .action(ArgAction::Append)
        .help(help)
}

fn main() -> ExitCode {
    let matches = cli().get_matches();
    init_tracing(matches.get_count("verbose"));

    match run(&matches) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let filter = if verbose > 0 {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(matches: &ArgMatches) -> anyhow::Result<()> {
    let config = load_config(matches)?;

    match matches.subcommand() {
        Some(("print", args)) => print(&config, args),
        Some(("apply", args)) => apply(&config, args),
        Some(("resolve", args)) => {
            let name = required(args, "name")?;
            let manifest = config.manifest().context("building class manifest")?;
            match Resolver::new(&manifest).resolve(name) {
                Some(path) => {
                    println!("{}", path.display());
                    Ok(())
                }
                None => bail!("{name} is not in the class manifest"),
            }
        }
        Some(("classes", args)) => {
            let prefix = args.get_one::<String>("prefix").map_or("", String::as_str);
            let manifest = config.manifest().context("building class manifest")?;
            for (name, path) in manifest.in_namespace(prefix) {
                println!("{name}\t{}", path.display());
            }
            Ok(())
        }
        Some(("check", args)) => {
            let file = args
                .get_one::<PathBuf>("file")
                .context("missing file argument")?;
            let text = std::fs::read_to_string(file)
                .with_context(|| format!("reading {}", file.display()))?;
            config.validator(config.process_checker()).validate(&text)?;
            println!("{}: ok", file.display());
            Ok(())
        }
        _ => {
            cli().print_help()?;
            Ok(())
        }
    }
}

fn load_config(matches: &ArgMatches) -> anyhow::Result<ScribeConfig> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => ScribeConfig::from_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => ScribeConfig::default(),
    };
    if let Some(root) = matches.get_one::<PathBuf>("root") {
        config = config.with_root(root);
    }
    Ok(config)
}

fn required<'a>(args: &'a ArgMatches, name: &str) -> anyhow::Result<&'a String> {
    args.get_one::<String>(name)
        .with_context(|| format!("missing {name} argument"))
}

fn values<'a>(args: &'a ArgMatches, name: &str) -> impl Iterator<Item = &'a String> {
    args.get_many::<String>(name).into_iter().flatten()
}

fn sources(args: &ArgMatches) -> Vec<SourceRef> {
    values(args, "sources").map(|s| SourceRef::from(s.as_str())).collect()
}

/// Manifest only when some source is a class name
fn manifest_for(config: &ScribeConfig, sources: &[SourceRef]) -> anyhow::Result<Manifest> {
    if sources.iter().any(|s| matches!(s, SourceRef::Symbol(_))) {
        config.manifest().context("building class manifest")
    } else {
        Ok(Manifest::new())
    }
}

fn print(config: &ScribeConfig, args: &ArgMatches) -> anyhow::Result<()> {
    let sources = sources(args);
    let manifest = manifest_for(config, &sources)?;
    let resolver = Resolver::new(&manifest);
    let units = sources
        .into_iter()
        .map(|source| LoadedUnit::load(source, &resolver))
        .collect::<Result<Vec<_>, _>>()?;

    if args.get_flag("json") {
        let models: Vec<_> = units.iter().map(|loaded| &loaded.unit).collect();
        println!("{}", serde_json::to_string_pretty(&models)?);
    } else {
        let printer = config.printer();
        for loaded in &units {
            print!("{}", printer.print(&loaded.unit));
        }
    }
    Ok(())
}

fn apply(config: &ScribeConfig, args: &ArgMatches) -> anyhow::Result<()> {
    let sources = sources(args);
    let manifest = manifest_for(config, &sources)?;
    let validator = config.validator(config.process_checker());
    let mut session = CodeSession::load(sources, &manifest, validator, config.printer())?;

    for fqn in values(args, "import") {
        session.import(fqn)?;
    }
    for fqn in values(args, "use") {
        session.use_trait(fqn)?;
    }
    for fqn in values(args, "extends") {
        session.extend(fqn)?;
    }
    for fqn in values(args, "implements") {
        session.implement(fqn)?;
    }
    for line in values(args, "doc") {
        session.document(line.as_str())?;
    }
    if args.get_flag("strict-types") {
        session.strict_types(true)?;
    }

    let mode = if args.get_flag("both") {
        EmitMode::Both
    } else if args.get_flag("write") {
        EmitMode::WriteOnly
    } else {
        EmitMode::ReturnOnly
    };

    let emission = session.emit(mode)?;
    for unit in emission.iter() {
        tracing::info!(source = %unit.source, disposition = ?unit.disposition, "emitted");
        if let Some(contents) = &unit.contents {
            print!("{contents}");
        }
    }
    Ok(())
}
