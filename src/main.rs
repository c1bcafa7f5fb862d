use clap::{Parser, Subcommand};
use std::collections::BTreeSet;
use std::error::Error;
use std::path::PathBuf;

use web_replay::capability::CapabilityFlag;
use web_replay::compare::{load_rgb, ImageComparator};
use web_replay::config;
use web_replay::report::{csv_table, issue_writeup};
use web_replay::runner::{RunConfig, RunReport, ScriptRunner, SequenceRunner};
use web_replay::script::{LoadedScript, Script, Sequence};

/// Web Replay - browser automation script replay
#[derive(Parser, Debug)]
#[command(
    name = "web-replay",
    about = "Replay browser automation scripts with per-step results and visual regression checks",
    after_help = "ENVIRONMENT VARIABLES:\n\
        WEB_REPLAY_BROWSER          Default browser family (Chrome, Edge)\n\
        WEB_REPLAY_CHROMEDRIVER     Chrome driver executable\n\
        WEB_REPLAY_EDGEDRIVER       Edge driver executable\n\
        WEB_REPLAY_SCREENSHOT_DIR   Screenshot save directory\n\
        WEB_REPLAY_DRIVER_PORT      Local port for the spawned driver"
)]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one script file against a browser session
    Run {
        /// Path to the script file
        #[arg(short, long)]
        script: PathBuf,

        /// Browser family (Chrome, Edge)
        #[arg(short, long, env = "WEB_REPLAY_BROWSER", default_value = "Chrome")]
        browser: String,

        /// Driver executable path (default: per-family setting)
        #[arg(short, long)]
        driver: Option<PathBuf>,

        /// Capability flag to enable (repeatable, e.g. --flag "Headless Mode")
        #[arg(short, long = "flag")]
        flags: Vec<String>,

        /// Screenshot save directory (default: current working directory)
        #[arg(long, env = "WEB_REPLAY_SCREENSHOT_DIR")]
        screenshot_dir: Option<PathBuf>,

        /// Local port for the spawned driver
        #[arg(long, env = "WEB_REPLAY_DRIVER_PORT", default_value = "9515")]
        port: u16,

        /// Output the report as JSON
        #[arg(long)]
        json: bool,

        /// Write a CSV table of step outcomes to this path
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Write an issue-tracker write-up to this path
        #[arg(long)]
        writeup: Option<PathBuf>,
    },

    /// Run the scripts of a sequence file back-to-back in one session
    Sequence {
        /// Path to the sequence file (JSON array of script paths)
        #[arg(short, long)]
        sequence: PathBuf,

        /// Browser family (Chrome, Edge)
        #[arg(short, long, env = "WEB_REPLAY_BROWSER", default_value = "Chrome")]
        browser: String,

        /// Driver executable path (default: per-family setting)
        #[arg(short, long)]
        driver: Option<PathBuf>,

        /// Capability flag to enable (repeatable)
        #[arg(short, long = "flag")]
        flags: Vec<String>,

        /// Screenshot save directory (default: current working directory)
        #[arg(long, env = "WEB_REPLAY_SCREENSHOT_DIR")]
        screenshot_dir: Option<PathBuf>,

        /// Local port for the spawned driver
        #[arg(long, env = "WEB_REPLAY_DRIVER_PORT", default_value = "9515")]
        port: u16,

        /// Output the report as JSON
        #[arg(long)]
        json: bool,

        /// Write a CSV table of step outcomes to this path
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Write an issue-tracker write-up to this path
        #[arg(long)]
        writeup: Option<PathBuf>,
    },

    /// Diff two image files offline and write the annotated result
    Compare {
        /// Reference image path
        #[arg(short, long)]
        reference: PathBuf,

        /// Image to compare against the reference
        #[arg(short, long)]
        test: PathBuf,

        /// Output path for the annotated image
        #[arg(short, long, default_value = "./comparison.png")]
        output: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();

    match args.command {
        Some(Commands::Run {
            script,
            browser,
            driver,
            flags,
            screenshot_dir,
            port,
            json,
            csv,
            writeup,
        }) => {
            let loaded = Script::load(&script)?;
            warn_skipped(&loaded, &script);

            let config = build_run_config(&browser, driver, flags, screenshot_dir, port)?;
            let runner = ScriptRunner::new(config);
            let report = runner.run(&loaded.script)?;
            emit_report(&report, json, csv, writeup)?;
        }

        Some(Commands::Sequence {
            sequence,
            browser,
            driver,
            flags,
            screenshot_dir,
            port,
            json,
            csv,
            writeup,
        }) => {
            let scripts: Vec<Script> = Sequence::load(&sequence)?
                .resolve()?
                .into_iter()
                .inspect(|loaded| warn_skipped(loaded, &sequence))
                .map(|loaded| loaded.script)
                .collect();

            let config = build_run_config(&browser, driver, flags, screenshot_dir, port)?;
            let runner = SequenceRunner::new(config);
            let report = runner.run_all(&scripts)?;
            emit_report(&report, json, csv, writeup)?;
        }

        Some(Commands::Compare {
            reference,
            test,
            output,
        }) => {
            let reference_img = load_rgb(&reference)?;
            let test_img = load_rgb(&test)?;
            let comparator = ImageComparator::new(".");
            let artifact = comparator.compare_images(&reference_img, &test_img, &output)?;

            println!("Annotated comparison: {}", output.display());
            println!(
                "  {} differing regions, {} differing pixels",
                artifact.regions.len(),
                artifact.differing_pixels
            );
        }

        None => {
            println!("Web Replay - browser automation script replay");
            println!();
            println!("Usage: web-replay <COMMAND>");
            println!();
            println!("Commands:");
            println!("  run       Run one script file against a browser session");
            println!("  sequence  Run the scripts of a sequence file in one session");
            println!("  compare   Diff two image files and write the annotated result");
            println!();
            println!("Run with --help for more information.");
        }
    }

    Ok(())
}

/// Resolve CLI options into engine run parameters
fn build_run_config(
    browser: &str,
    driver: Option<PathBuf>,
    flags: Vec<String>,
    screenshot_dir: Option<PathBuf>,
    port: u16,
) -> Result<RunConfig, Box<dyn Error>> {
    let driver_path = match driver {
        Some(path) => path,
        None => config::get()
            .driver_for(browser)
            .map(PathBuf::from)
            .ok_or_else(|| format!("No driver configured for browser '{}'", browser))?,
    };
    let flags: BTreeSet<CapabilityFlag> = flags.into_iter().map(CapabilityFlag::new).collect();
    Ok(RunConfig {
        browser: browser.to_string(),
        driver_path,
        flags,
        screenshot_dir,
        driver_port: port,
    })
}

fn warn_skipped(loaded: &LoadedScript, source: &std::path::Path) {
    for skipped in &loaded.skipped {
        eprintln!(
            "Warning: skipped invalid step {} in {}: {}",
            skipped.index,
            source.display(),
            skipped.reason
        );
    }
}

fn emit_report(
    report: &RunReport,
    json: bool,
    csv: Option<PathBuf>,
    writeup: Option<PathBuf>,
) -> Result<(), Box<dyn Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        println!(
            "Run completed: {} steps, {} passed, {} failed",
            report.results.len(),
            report.passed_count(),
            report.failed_count()
        );
        for (index, result) in report.results.iter().enumerate() {
            let status = if result.is_passed() { "PASS" } else { "FAIL" };
            println!("  [{}] Step {}: {}", status, index + 1, result.step.display_text());
            if let Some(detail) = &result.error_detail {
                println!("         {}", detail);
            }
        }
    }

    if let Some(path) = csv {
        std::fs::write(&path, csv_table(report))?;
        println!("CSV report: {}", path.display());
    }
    if let Some(path) = writeup {
        std::fs::write(&path, issue_writeup(report))?;
        println!("Write-up: {}", path.display());
    }
    Ok(())
}
