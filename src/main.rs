use anyhow::Result;
use clap::Parser;
use taskgrade::config::{DiffCapabilities, GraderPaths};
use taskgrade::diff::DiffStyle;
use taskgrade::engine::{
    self, ExitCodeScheme, GraderConfig, RunOutcome, VerifyRequest, DIAGNOSTIC_RULE,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "verify",
    version,
    about = "Grade a shell-exercise command against expected results",
    after_help = "Examples:\n  verify 3 mkdir newdir\n  verify --elapsed 42 7 grep -c error log.txt\n  verify --exit-codes coarse --elapsed 301 2 tar -cf html.tar pages"
)]
struct Cli {
    /// Task code to grade
    #[arg(value_name = "TASK")]
    task: String,

    /// Seconds elapsed since the task started; enables the time budget
    #[arg(long, value_name = "SECONDS")]
    elapsed: Option<u64>,

    /// Diff presentation on failure
    #[arg(long, value_enum, default_value_t = DiffStyle::Auto)]
    diff: DiffStyle,

    /// Exit-status scheme expected by the calling harness
    #[arg(long, value_enum, default_value_t = ExitCodeScheme::Distinct)]
    exit_codes: ExitCodeScheme,

    /// Learner command words, handed to the shell verbatim
    #[arg(
        value_name = "COMMAND",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    command: Vec<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let scheme = cli.exit_codes;
    let code = match run(cli) {
        Ok(outcome) => {
            if !outcome.diagnostics.is_empty() {
                println!("{DIAGNOSTIC_RULE}");
                for line in &outcome.diagnostics {
                    println!("{line}");
                }
            }
            outcome.exit_code
        }
        Err(err) => {
            eprintln!("error: {err:#}");
            scheme.fatal_code()
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> Result<RunOutcome> {
    let paths = GraderPaths::from_env()?;
    let caps = DiffCapabilities::probe();
    let config = GraderConfig {
        time_limited: cli.elapsed.is_some(),
        diff_style: cli.diff,
        exit_codes: cli.exit_codes,
    };
    let request = VerifyRequest {
        task_code: cli.task,
        elapsed_seconds: cli.elapsed,
        command: cli.command,
    };
    engine::run(&paths, &config, &caps, &request)
}
