use clap::{value_parser, Arg, ArgAction, Command};
use mailbench::{Backend, Config, Metrics, Suite};
use prometheus_client::{encoding::text::encode, registry::Registry};
use std::{path::Path, process, str::FromStr};
use tracing::{error, info, Level};

fn main() {
    // Parse arguments
    let matches = Command::new("mailbench")
        .about("flood actor mailboxes with fire-and-forget messages and time the drain")
        .arg(Arg::new("config").long("config").help("YAML suite configuration"))
        .arg(
            Arg::new("agents")
                .long("agents")
                .value_delimiter(',')
                .value_parser(value_parser!(usize))
                .help("comma-separated agent counts"),
        )
        .arg(
            Arg::new("messages")
                .long("messages")
                .value_delimiter(',')
                .value_parser(value_parser!(u64))
                .help("comma-separated ordinary message counts"),
        )
        .arg(
            Arg::new("backend")
                .long("backend")
                .value_parser(["futures", "tokio"]),
        )
        .arg(
            Arg::new("threads")
                .long("threads")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("warmup")
                .long("warmup")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("iterations")
                .long("iterations")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("timeout-ms")
                .long("timeout-ms")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .default_value("info"),
        )
        .arg(Arg::new("json").long("json").action(ArgAction::SetTrue))
        .arg(
            Arg::new("metrics")
                .long("metrics")
                .action(ArgAction::SetTrue)
                .help("print collected metrics after the suite"),
        )
        .get_matches();

    // Create logger
    let level = matches.get_one::<String>("log-level").unwrap();
    let level = Level::from_str(level).expect("Could not parse log level");
    if matches.get_flag("json") {
        tracing_subscriber::fmt()
            .json()
            .with_max_level(level)
            .with_line_number(true)
            .with_file(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_line_number(true)
            .with_file(true)
            .init();
    }

    // Load config
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => Config::load(Path::new(path)).expect("Could not load config file"),
        None => Config::default(),
    };
    if let Some(agents) = matches.get_many::<usize>("agents") {
        config.agents = agents.copied().collect();
    }
    if let Some(messages) = matches.get_many::<u64>("messages") {
        config.messages = messages.copied().collect();
    }
    if let Some(backend) = matches.get_one::<String>("backend") {
        config.backend = Backend::from_str(backend).expect("Could not parse backend");
    }
    if let Some(threads) = matches.get_one::<usize>("threads") {
        config.worker_threads = *threads;
    }
    if let Some(warmup) = matches.get_one::<usize>("warmup") {
        config.warmup = *warmup;
    }
    if let Some(iterations) = matches.get_one::<usize>("iterations") {
        config.iterations = *iterations;
    }
    if let Some(timeout) = matches.get_one::<u64>("timeout-ms") {
        config.timeout_ms = Some(*timeout);
    }
    info!(
        agents = ?config.agents,
        messages = ?config.messages,
        backend = %config.backend,
        worker_threads = config.worker_threads,
        warmup = config.warmup,
        iterations = config.iterations,
        "loaded config"
    );

    // Run suite
    let mut registry = Registry::default();
    let metrics = Metrics::init(&mut registry);
    let suite = match Suite::new(config, metrics) {
        Ok(suite) => suite,
        Err(err) => {
            error!(?err, "invalid config");
            process::exit(2);
        }
    };
    let summaries = match suite.start() {
        Ok(summaries) => summaries,
        Err(err) => {
            error!(?err, "benchmark aborted");
            process::exit(1);
        }
    };
    for summary in &summaries {
        println!("{summary}");
    }

    if matches.get_flag("metrics") {
        let mut buffer = String::new();
        encode(&mut buffer, &registry).expect("Could not encode metrics");
        print!("{buffer}");
    }
}
