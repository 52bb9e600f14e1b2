use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use decor_core::{logging, BodyOutcome, Config, SuiteReport, SuiteRunner, TestReport, TestSuite};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

#[derive(Parser)]
#[command(name = "decor")]
#[command(about = "Run setup and cleanup decorations of data test suites", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute the setup and cleanup phases of every test in a suite
    Run {
        /// Suite document (.yaml, .yml or .json)
        suite: PathBuf,

        /// Config file (defaults to ./decor.toml or the user config)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the tests of a suite
    List {
        /// Suite document (.yaml, .yml or .json)
        suite: PathBuf,
    },
    /// Print the default configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            suite,
            config,
            json,
        } => run(&suite, config.as_deref(), json).await,
        Commands::List { suite } => {
            list(&suite)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Config => {
            print!("{}", Config::default_config_string());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::from_file(path)
            .wrap_err_with(|| format!("Failed to load config from {}", path.display())),
        None => Config::load().wrap_err("Failed to load config"),
    }
}

fn load_suite(path: &Path) -> Result<TestSuite> {
    TestSuite::from_file(path).wrap_err_with(|| format!("Failed to read suite {}", path.display()))
}

async fn run(path: &Path, config: Option<&Path>, json: bool) -> Result<ExitCode> {
    let config = load_config(config)?;
    logging::init(&config.logging);

    let suite = load_suite(path)?;
    info!(suite = %suite.name, tests = suite.test_count(), "suite loaded");

    let progress = if json {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(suite.test_count() as u64)
    };
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );

    let runner = SuiteRunner::from_config(&config);
    let result = runner
        .run_suite(&suite, |context| {
            progress.set_message(context.full_name());
            progress.inc(1);
            async { Ok::<(), String>(()) }
        })
        .await;
    progress.finish_and_clear();

    let report = match result {
        Ok(report) => report,
        Err(err) => {
            // Show what ran before the abort, cleanups included
            for test in err.reports() {
                print_test(test);
            }
            return Err(err.into());
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(if report.passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_report(report: &SuiteReport) {
    println!("Suite: {} (run {})", report.suite, report.run_id);

    for test in &report.tests {
        print_test(test);
    }

    println!();
    println!(
        "{} tests, {} failed",
        report.tests.len(),
        report.failed_count()
    );
}

fn print_test(test: &TestReport) {
    let mark = if test.passed() { "ok" } else { "FAILED" };
    println!("  [{}] {}", mark, test.test);

    for phase in test.setup.iter().chain(&test.cleanup) {
        for outcome in phase.failures() {
            println!(
                "      {} {} ({}): {}",
                phase.kind.display_name(),
                outcome.id,
                outcome.kind,
                outcome.reason.as_deref().unwrap_or("failed")
            );
        }
    }
    if test.body == BodyOutcome::NotRun {
        println!("      not run: setup failed");
    }
}

fn list(path: &Path) -> Result<()> {
    let suite = load_suite(path)?;
    println!("Suite: {} ({} tests)", suite.name, suite.test_count());

    for context in suite.tests() {
        let setup: usize = context.groups.iter().map(|g| g.group.setup.len()).sum::<usize>()
            + context.test.setup.len();
        let cleanup: usize = context.groups.iter().map(|g| g.group.cleanup.len()).sum::<usize>()
            + context.test.cleanup.len();
        println!(
            "  {:<24} {}  (setup: {}, cleanup: {})",
            context.key,
            context.full_name(),
            setup,
            cleanup
        );
    }
    Ok(())
}
