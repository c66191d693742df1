use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use scopewire_core::{Generator, GeneratorConfig, JsonPlanEmitter};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn source_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("source")
                .value_name("SOURCE_ROOT")
                .value_parser(value_parser!(PathBuf))
                .help("Directory scanned for declaration manifests"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file; flags override its values"),
        )
        .arg(
            Arg::new("exclude-suffix")
                .long("exclude-suffix")
                .action(ArgAction::Append)
                .help("Skip files whose name ends with this suffix"),
        )
        .arg(
            Arg::new("exclude-path")
                .long("exclude-path")
                .action(ArgAction::Append)
                .help("Skip files whose relative path contains this fragment"),
        )
        .arg(
            Arg::new("timeout-secs")
                .long("timeout-secs")
                .value_parser(value_parser!(u64))
                .help("Deadline per parse or synthesis sequence (0 waits forever)"),
        )
        .arg(
            Arg::new("retries")
                .long("retries")
                .value_parser(value_parser!(u32))
                .help("Resubmissions of a timed-out sequence"),
        )
        .arg(
            Arg::new("concurrency")
                .long("concurrency")
                .value_parser(value_parser!(usize))
                .help("Concurrent steps (0 = one per core)"),
        )
}

fn cli() -> Command {
    Command::new("scopewire")
        .version(scopewire_core::VERSION)
        .about("Build-time dependency-injection provider generator")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            source_args(Command::new("generate").about("Resolve every scope path and write the plan"))
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .value_parser(value_parser!(PathBuf))
                        .help("Plan destination"),
                ),
        )
        .subcommand(source_args(
            Command::new("check").about("Resolve every scope path without writing anything"),
        ))
}

fn load_config(args: &ArgMatches) -> Result<GeneratorConfig> {
    let mut config = match args.get_one::<PathBuf>("config") {
        Some(path) => GeneratorConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => GeneratorConfig::default(),
    };

    if let Some(source) = args.get_one::<PathBuf>("source") {
        config = config.with_source_root(source);
    }
    for suffix in args.get_many::<String>("exclude-suffix").into_iter().flatten() {
        config = config.with_excluded_suffix(suffix);
    }
    for fragment in args.get_many::<String>("exclude-path").into_iter().flatten() {
        config = config.with_excluded_path(fragment);
    }
    if let Some(secs) = args.get_one::<u64>("timeout-secs") {
        config = config.with_timeout_secs(*secs);
    }
    if let Some(retries) = args.get_one::<u32>("retries") {
        config = config.with_max_retries(*retries);
    }
    if let Some(workers) = args.get_one::<usize>("concurrency") {
        config = config.with_max_concurrency(*workers);
    }
    if let Ok(Some(output)) = args.try_get_one::<PathBuf>("output") {
        config = config.with_destination(output);
    }
    Ok(config)
}

async fn run(matches: ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("generate", args)) => {
            let config = load_config(args)?;
            let emitter = JsonPlanEmitter::new(config.destination.clone());
            let report = Generator::new(config)
                .generate(&emitter)
                .await
                .context("generation failed")?;
            println!("{report}");
        }
        Some(("check", args)) => {
            let config = load_config(args)?;
            let (_, report) = Generator::new(config)
                .plan()
                .await
                .context("check failed")?;
            println!("{report}");
        }
        _ => unreachable!("subcommand required"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(cli().get_matches()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        cli().debug_assert();
    }

    #[test]
    fn flags_override_defaults() {
        let matches = cli().get_matches_from([
            "scopewire",
            "generate",
            "app",
            "--exclude-suffix",
            "_test.scope.json",
            "--exclude-suffix",
            "_mock.scope.json",
            "--timeout-secs",
            "5",
            "--retries",
            "0",
            "-o",
            "out/plan.json",
        ]);
        let (_, args) = matches.subcommand().unwrap();
        let config = load_config(args).unwrap();

        assert_eq!(config.source_root, PathBuf::from("app"));
        assert_eq!(config.excluded_suffixes.len(), 2);
        assert_eq!(config.parse_timeout_secs, 5);
        assert_eq!(config.max_retries, 0);
        assert_eq!(config.destination, PathBuf::from("out/plan.json"));
    }

    #[test]
    fn check_has_no_output_flag() {
        let result = cli().try_get_matches_from(["scopewire", "check", "app", "--output", "x"]);
        assert!(result.is_err());
    }
}
