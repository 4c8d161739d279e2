use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use colored::*;
use log::{debug, LevelFilter};
use std::io::Write;
use std::process;
use std::sync::Arc;
use tokio::sync::mpsc;

use cybak_core::{
    normalize_url, read_lines, AuditConfig, AuditEngine, AuditOutcome, ConsoleSink, JsonFileStore,
    Locale, ReportAggregator, StoreTarget, TargetManager,
};

const EXIT_OK: i32 = 0;
const EXIT_USAGE: i32 = 1;
const EXIT_PARTIAL: i32 = 2;

#[derive(Parser, Debug)]
#[command(
    name = "CYBAK",
    version,
    about = "Website security audit",
    override_usage = "cybak <target>  <options>",
    after_help = "\x1b[1;36mEXAMPLES:\x1b[0m
  Quick audit:                    cybak example.com
  French report:                  cybak example.com --lang fr
  Audit from file:                cybak -l targets.txt -t 4
  Save to a store:                cybak example.com --store audits.json --user alice
  JSON output:                    cybak example.com --json
  Dry-run validation:             cybak -l targets.txt --dry-run"
)]
pub struct Args {
    pub target: Option<String>,

    #[arg(short = 'l', long = "list", help = "File containing target URLs (one per line)")]
    pub list: Option<String>,

    #[arg(short = 't', long, help = "Number of concurrent audits [default: 8]")]
    pub threads: Option<usize>,

    #[arg(short = 'o', long, help = "Output file for JSON lines reports [default: audit_results.jsonl]")]
    pub output: Option<String>,

    #[arg(long, help = "JSON file used to persist audit records")]
    pub store: Option<String>,

    #[arg(long = "user", help = "User id the audits are saved under [default: anonymous]")]
    pub user: Option<String>,

    #[arg(long = "lang",
        value_parser = clap::builder::PossibleValuesParser::new(["en", "fr"]),
        help = "Report language")]
    pub lang: Option<String>,

    #[arg(short = 'c', long, help = "JSON config file (flags override its values)")]
    pub config: Option<String>,

    #[arg(short = 'v', long, default_value_t = false, help = "Verbose logging")]
    pub verbose: bool,

    #[arg(long, default_value_t = false, help = "Validate targets without auditing them")]
    pub dry_run: bool,

    #[arg(long, default_value_t = false, help = "Print reports as JSON")]
    pub json: bool,
}

impl Args {
    /// Layers flags over the config file over defaults.
    fn into_config(self) -> anyhow::Result<(AuditConfig, bool)> {
        let mut config = match &self.config {
            Some(path) => AuditConfig::from_file(path)?,
            None => AuditConfig::default(),
        };

        if let Some(target) = self.target {
            config.target = target;
        }
        if let Some(list) = self.list {
            config.list_file = list;
        }
        if let Some(threads) = self.threads {
            config.threads = threads;
        }
        if let Some(output) = self.output {
            config.output = output;
        }
        if let Some(store) = self.store {
            config.store = Some(store);
        }
        if let Some(user) = self.user {
            config.user_id = user;
        }
        if let Some(lang) = self.lang {
            config.locale = lang.parse::<Locale>().map_err(anyhow::Error::msg)?;
        }
        config.verbose |= self.verbose;
        config.dry_run |= self.dry_run;

        Ok((config, self.json))
    }
}

#[tokio::main]
async fn main() {
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => e.exit(),
            _ => {
                e.print().ok();
                process::exit(EXIT_USAGE);
            }
        },
    };

    let (config, json) = match args.into_config() {
        Ok(parsed) => parsed,
        Err(e) => {
            eprint!("{}\r\n", format!("[!] {:#}", e).red());
            process::exit(EXIT_USAGE);
        }
    };

    init_logging(config.verbose);

    let code = run(config, json).await;
    process::exit(code);
}

fn init_logging(verbose: bool) {
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Warn };
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .try_init();
}

async fn run(config: AuditConfig, json: bool) -> i32 {
    let mut targets: Vec<String> = Vec::new();

    if let Some(list_path) = config.list_file_ref() {
        match read_lines(list_path) {
            Ok(lines) => {
                if !json {
                    print!(
                        "{}\r\n",
                        format!("[+] Loaded {} target(s) from {}", lines.len(), list_path)
                            .green().bold()
                    );
                    std::io::stdout().flush().ok();
                }
                targets.extend(lines);
            }
            Err(e) => {
                eprint!("{}\r\n", format!("[!] Failed to read '{}': {}", list_path, e).red());
                return EXIT_USAGE;
            }
        }
    }

    if let Some(t) = config.target_ref() {
        targets.push(t.to_string());
    }

    let targets = TargetManager::from_inputs(targets);
    if targets.is_empty() {
        eprint!("{}\r\n", "[!] No targets specified. Provide a URL or use -l <file>.".red());
        let mut cmd = Args::command();
        cmd.print_help().ok();
        return EXIT_USAGE;
    }

    if config.dry_run {
        return dry_run(targets);
    }

    if !json {
        print_audit_config(&config, targets.len());
    }

    let store_target = match &config.store {
        Some(path) => match JsonFileStore::open(path).await {
            Ok(store) => Some(StoreTarget {
                store: Arc::new(store),
                user_id: config.user_id.clone(),
            }),
            Err(e) => {
                eprint!("{}\r\n", format!("[!] Failed to open store '{}': {}", path, e).red());
                return EXIT_USAGE;
            }
        },
        None => {
            debug!("No store configured, reports are not persisted");
            None
        }
    };

    let total = targets.len();
    let sink = if total > 1 {
        ConsoleSink::with_progress(total, json)
    } else if json {
        ConsoleSink::json_ref()
    } else {
        ConsoleSink::new_ref()
    };

    let engine = AuditEngine::simulated(config.locale, config.threads);
    let (result_tx, result_rx) = mpsc::channel::<AuditOutcome>(100);

    let (_, summary) = tokio::join!(
        engine.run(targets, result_tx),
        ReportAggregator::run(result_rx, total, config.output_ref(), store_target, Arc::clone(&sink))
    );

    if !json {
        ReportAggregator::report_summary(&summary, &sink);
    }

    if summary.is_clean() { EXIT_OK } else { EXIT_PARTIAL }
}

/// Validates every target and prints what would be audited.
fn dry_run(mut targets: TargetManager) -> i32 {
    let mut code = EXIT_OK;
    while let Some(input) = targets.next() {
        match normalize_url(&input) {
            Ok(url) => print!("[DRY RUN] Would audit: {}\r\n", url),
            Err(e) => {
                print!("{}\r\n", format!("[!] {}", e).red());
                code = EXIT_PARTIAL;
            }
        }
    }
    std::io::stdout().flush().ok();
    code
}

/// Prints the audit configuration summary.
fn print_audit_config(config: &AuditConfig, total: usize) {
    if let Some(target) = config.target_ref() {
        print!("{}\r\n", format!("[+] Target:     {}", target).green().bold());
    }
    print!("{}\r\n", format!("[+] Targets:    {}", total).blue());
    print!("{}\r\n", format!("[+] Threads:    {}", config.threads).blue());
    print!("{}\r\n", format!("[+] Language:   {}", config.locale).magenta());
    if let Some(output) = config.output_ref() {
        print!("{}\r\n", format!("[+] Output:     {}", output).blue());
    }
    if let Some(ref store) = config.store {
        print!("{}\r\n", format!("[+] Store:      {} (user {})", store, config.user_id).yellow());
    }
    print!("{}\r\n", "──────────────────────────────────────────────────".dimmed());
    std::io::stdout().flush().ok();
}
