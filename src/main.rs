//! page-translator 命令行入口

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use std::process;

use clap::{Args, Parser, Subcommand};

use page_translator::env::{self, EnvVar};
use page_translator::parsers::{get_charset, html_to_dom, serialize_document};
use page_translator::translation::{
    ConfigManager, RunOutcome, TranslationConfig, TranslationEvent,
    TranslationService, UsageStats,
};

const DEFAULT_ENCODING: &str = "utf-8";
const DEFAULT_CONFIG_PATH: &str = "page-translator.toml";

#[derive(Parser, Debug)]
#[command(name = "page-translator", version, about = "Translate the visible text of HTML pages")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Translate an HTML file
    Translate(TranslateArgs),
    /// Write an example configuration file
    InitConfig {
        /// Destination path
        #[arg(default_value = DEFAULT_CONFIG_PATH)]
        path: String,
    },
}

#[derive(Args, Debug)]
struct TranslateArgs {
    /// HTML file to translate, or - for stdin
    input: String,

    /// Write the translated document here instead of stdout
    #[arg(short, long)]
    output: Option<String>,

    /// Target language, e.g. "Spanish"
    #[arg(short = 't', long = "target-lang")]
    target_lang: Option<String>,

    /// API key for the chat-completion endpoint
    #[arg(long, env = "PAGE_TRANSLATOR_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Configuration file (TOML or JSON)
    #[arg(short, long)]
    config: Option<String>,

    /// JSON file accumulating usage statistics
    #[arg(long)]
    stats_file: Option<String>,

    /// Do not print progress events
    #[arg(short, long)]
    quiet: bool,
}

fn init_tracing() {
    let level = env::core::LogLevel::get()
        .ok()
        .and_then(|level| level.parse::<tracing::Level>().ok())
        .unwrap_or(tracing::Level::INFO);

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Translate(args) => translate(args),
        Command::InitConfig { path } => init_config(&path),
    };

    if let Err(message) = result {
        eprintln!("Error: {}", message);
        process::exit(1);
    }
}

fn init_config(path: &str) -> Result<(), String> {
    if Path::new(path).exists() {
        return Err(format!("{} already exists", path));
    }
    ConfigManager::generate_example_config(path).map_err(|e| e.to_string())?;
    eprintln!("Wrote example configuration to {}", path);
    Ok(())
}

fn load_config(args: &TranslateArgs) -> Result<TranslationConfig, String> {
    let manager = match &args.config {
        Some(path) => ConfigManager::from_file(path),
        None => ConfigManager::new(),
    };
    let mut config = manager.map_err(|e| e.to_string())?.into_config();

    if let Some(lang) = &args.target_lang {
        config.target_lang = lang.clone();
    }

    Ok(config)
}

fn read_input(input: &str) -> Result<Vec<u8>, String> {
    if input == "-" {
        let mut data = Vec::new();
        io::stdin()
            .read_to_end(&mut data)
            .map_err(|e| format!("failed to read stdin: {}", e))?;
        Ok(data)
    } else {
        fs::read(input).map_err(|e| format!("failed to read {}: {}", input, e))
    }
}

fn translate(args: TranslateArgs) -> Result<(), String> {
    let config = load_config(&args)?;

    let api_key = match args.api_key.clone() {
        Some(key) if !key.trim().is_empty() => key,
        _ => env::translation::ApiKey::get().map_err(|_| {
            "an API key is required (--api-key, PAGE_TRANSLATOR_API_KEY or OPENAI_API_KEY)"
                .to_string()
        })?,
    };

    let data = read_input(&args.input)?;

    // 先按 UTF-8 解析，找到 <meta> 声明的字符集后再重新解码
    let mut encoding = DEFAULT_ENCODING.to_string();
    let mut dom = html_to_dom(&data, &encoding).map_err(|e| e.to_string())?;
    if let Some(charset) = get_charset(&dom.document) {
        if !charset.eq_ignore_ascii_case(DEFAULT_ENCODING) {
            encoding = charset;
            dom = html_to_dom(&data, &encoding).map_err(|e| e.to_string())?;
        }
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to start runtime: {}", e))?;

    let target_lang = config.target_lang.clone();
    let service =
        TranslationService::new(config, dom.document.clone()).map_err(|e| e.to_string())?;

    let outcome = runtime.block_on(async {
        let mut events = service.subscribe();
        let quiet = args.quiet;

        let printer = async move {
            while let Ok(event) = events.recv().await {
                if !quiet {
                    print_event(&event);
                }
                if event.is_terminal() {
                    break;
                }
            }
        };

        let (outcome, _) = tokio::join!(service.translate_page(&api_key, &target_lang), printer);
        outcome
    });

    let stats = match outcome {
        RunOutcome::Completed(stats) => {
            eprintln!(
                "Translated {} words in {} texts ({} batches, {} skipped)",
                stats.words,
                stats.texts_translated,
                stats.batches_total,
                stats.batches_failed
            );
            Some(stats)
        }
        RunOutcome::NothingToTranslate => {
            eprintln!("Nothing to translate");
            None
        }
        RunOutcome::AlreadyRunning => return Err("a translation is already running".to_string()),
        RunOutcome::Failed(message) => return Err(message),
    };

    if let (Some(path), Some(stats)) = (&args.stats_file, &stats) {
        record_usage(path, stats)?;
    }

    drop(service);
    let output = serialize_document(dom, &encoding).map_err(|e| e.to_string())?;

    match &args.output {
        Some(path) => fs::write(path, output).map_err(|e| format!("failed to write {}: {}", path, e)),
        None => io::stdout()
            .write_all(&output)
            .map_err(|e| format!("failed to write output: {}", e)),
    }
}

fn print_event(event: &TranslationEvent) {
    match event {
        TranslationEvent::Progress { progress, message } => {
            eprintln!("[{:>3}%] {}", progress, message)
        }
        TranslationEvent::TranslationWarning { message } => eprintln!("warning: {}", message),
        TranslationEvent::TranslationComplete => {}
        TranslationEvent::TranslationError { error } => eprintln!("error: {}", error),
    }
}

fn record_usage(path: &str, run: &page_translator::translation::RunStats) -> Result<(), String> {
    let today = chrono::Local::now().date_naive();

    let mut usage = match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str::<UsageStats>(&content)
            .map_err(|e| format!("invalid stats file {}: {}", path, e))?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => UsageStats::new(today),
        Err(e) => return Err(format!("failed to read {}: {}", path, e)),
    };

    usage.record(run, today);

    let content = serde_json::to_string_pretty(&usage).map_err(|e| e.to_string())?;
    fs::write(path, content).map_err(|e| format!("failed to write {}: {}", path, e))
}
