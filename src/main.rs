mod llm;

use clap::{Args, Parser, Subcommand};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use post_forge::config::{load_topics, PipelineConfig, RulesFile};
use post_forge::dedup::FingerprintStore;
use post_forge::feed::JsonFeedEmitter;
use post_forge::generator::{ContentGenerator, OfflineGenerator};
use post_forge::pipeline::{publish, AttemptOutcome, DuplicateStatus, Pipeline};
use post_forge::quality::{self, Verdict};
use post_forge::style::{bandit, StyleSelector};
use post_forge::{count_emojis, fit_x_line, format_float, format_percent};

#[derive(Parser)]
#[command(name = "post-forge", about = "Quality-gated social post generator")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Generate one post and append it to the feed.
    Run(RunArgs),
    /// Run a line through sanitization and the quality gate.
    Check(CheckArgs),
    /// Compare a line against the stored fingerprint history.
    Similarity(SimilarityArgs),
    /// Show the style catalog with effective weights.
    Styles(ConfigArgs),
    /// Write the effective pipeline config to disk.
    Init(InitArgs),
    /// Rewrite style weights in the rules file from the analytics summary.
    UpdateWeights(UpdateWeightsArgs),
}

#[derive(Args, Debug, Clone, Default)]
struct ConfigArgs {
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
struct RunArgs {
    #[command(flatten)]
    config: ConfigArgs,
    #[arg(long)]
    topic: Option<String>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    dry_run: bool,
}

#[derive(Args, Debug, Clone)]
struct CheckArgs {
    #[command(flatten)]
    config: ConfigArgs,
    #[arg(long)]
    text: Option<String>,
    #[arg(long)]
    rules: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
struct SimilarityArgs {
    #[command(flatten)]
    config: ConfigArgs,
    #[arg(long)]
    text: Option<String>,
}

#[derive(Args, Debug, Clone)]
struct InitArgs {
    #[arg(long, default_value = "config/pipeline.toml")]
    path: PathBuf,
    #[arg(long)]
    force: bool,
}

#[derive(Args, Debug, Clone)]
struct UpdateWeightsArgs {
    #[command(flatten)]
    config: ConfigArgs,
    #[arg(long)]
    summary: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    load_dotenv();
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Run(RunArgs::default()));

    match command {
        Command::Run(args) => run_pipeline(args).await,
        Command::Check(args) => run_check(args).await,
        Command::Similarity(args) => run_similarity(args).await,
        Command::Styles(args) => run_styles(args).await,
        Command::Init(args) => run_init(args),
        Command::UpdateWeights(args) => run_update_weights(args).await,
    }
}

async fn run_pipeline(args: RunArgs) -> Result<(), String> {
    let (config, _) = PipelineConfig::load(args.config.config);
    let catalog = config.catalog().map_err(|err| err.to_string())?;
    let selector = StyleSelector::new(catalog);
    let rules = RulesFile::load(&config.paths.rules).await;

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let topic = match args.topic {
        Some(topic) if !topic.trim().is_empty() => topic.trim().to_string(),
        _ => {
            let topics = load_topics(&config.paths.topics).await;
            topics
                .choose(&mut rng)
                .cloned()
                .ok_or_else(|| "no topics available".to_string())?
        }
    };

    let client = llm::OpenAiGenerator::from_env(&config.generator);
    let generator: Box<dyn ContentGenerator> = match client {
        Some(client) => Box::new(client),
        None => {
            info!("OPENAI_API_KEY is not set, using built-in payloads");
            Box::new(OfflineGenerator::new("OPENAI_API_KEY is not set"))
        }
    };

    let mut store = FingerprintStore::load(
        config.paths.fingerprints.clone(),
        rules.duplicate_guard.history_size,
    )
    .await;

    let pipeline = Pipeline::new(
        generator.as_ref(),
        &selector,
        &rules.quality,
        &rules.duplicate_guard,
    )
    .with_duplicate_penalty(config.content.duplicate_penalty)
    .with_line_limit(config.content.line_limit);

    let report = pipeline
        .run(&topic, &rules.style_weights, &mut store, &mut rng)
        .await;

    println!("{}", report.entry.title_text);
    println!(
        "Style: {} (weight {}) | topic: {} | cta: {}",
        report.style.id,
        format_float(report.style_weight, 2),
        report.entry.topic,
        report.entry.cta_type
    );
    match report.outcome {
        AttemptOutcome::Accepted { attempt } => {
            println!("Quality gate: accepted on attempt {}", attempt)
        }
        AttemptOutcome::ExhaustedFallback {
            attempts,
            last_reason,
        } => println!(
            "Quality gate: kept last of {} attempts (last rejection: {})",
            attempts, last_reason
        ),
    }
    match report.duplicate {
        DuplicateStatus::Disabled => println!("Duplicate guard: disabled"),
        DuplicateStatus::Unique => println!("Duplicate guard: unique"),
        DuplicateStatus::Rerolled { similarity } => println!(
            "Duplicate guard: rerolled after {} similarity",
            format_percent(similarity)
        ),
        DuplicateStatus::AcceptedDuplicate { similarity } => println!(
            "Duplicate guard: accepted duplicate at {} similarity",
            format_percent(similarity)
        ),
    }

    if args.dry_run {
        println!("\nDry run: feed and fingerprint history left untouched.");
        return Ok(());
    }

    let emitter = JsonFeedEmitter::new(config.paths.feed.clone(), config.content.feed_max_entries);
    publish(&report.entry, &store, &emitter)
        .await
        .map_err(|err| err.to_string())?;
    info!(
        feed = %config.paths.feed.display(),
        history = store.history().len(),
        "run complete"
    );

    Ok(())
}

async fn run_check(args: CheckArgs) -> Result<(), String> {
    let (config, _) = PipelineConfig::load(args.config.config);
    let rules_path = args.rules.unwrap_or(config.paths.rules);
    let rules = RulesFile::load(&rules_path).await;
    let text = read_text(args.text)?;

    let mut rng = StdRng::from_entropy();
    let line = fit_x_line(
        &text,
        rules.quality.min_emojis,
        config.content.line_limit,
        &mut rng,
    );

    println!(
        "Raw verdict: {}",
        describe_verdict(quality::evaluate(&text, &rules.quality))
    );
    println!("Sanitized: {}", line);
    println!("Emojis: {}", count_emojis(&line));
    println!(
        "Sanitized verdict: {}",
        describe_verdict(quality::evaluate(&line, &rules.quality))
    );
    Ok(())
}

async fn run_similarity(args: SimilarityArgs) -> Result<(), String> {
    let (config, _) = PipelineConfig::load(args.config.config);
    let rules = RulesFile::load(&config.paths.rules).await;
    let text = read_text(args.text)?;
    let store = FingerprintStore::load(
        config.paths.fingerprints.clone(),
        rules.duplicate_guard.history_size,
    )
    .await;

    let guard = rules.duplicate_guard.guard();
    println!(
        "History: {} fingerprints (ngram {}, threshold {})",
        store.history().len(),
        guard.ngram(),
        format_float(guard.threshold(), 2)
    );
    match guard.closest(&text, store.history()) {
        Some(closest) => {
            let verdict = if closest.similarity >= guard.threshold() {
                "duplicate"
            } else {
                "unique"
            };
            println!(
                "Closest: {} at {} ({})",
                closest.fingerprint_id,
                format_percent(closest.similarity),
                verdict
            );
        }
        None => println!("Closest: none (empty history)"),
    }
    Ok(())
}

async fn run_styles(args: ConfigArgs) -> Result<(), String> {
    let (config, _) = PipelineConfig::load(args.config);
    let catalog = config.catalog().map_err(|err| err.to_string())?;
    let selector = StyleSelector::new(catalog);
    let rules = RulesFile::load(&config.paths.rules).await;

    for (style, weight, share) in selector.probabilities(&rules.style_weights) {
        println!(
            "{:<16} weight {:>5} | share {:>6} | {}",
            style.id,
            format_float(weight, 2),
            format_percent(share),
            style.description
        );
    }
    Ok(())
}

fn run_init(args: InitArgs) -> Result<(), String> {
    if args.path.exists() && !args.force {
        return Err(format!(
            "{} already exists (pass --force to overwrite)",
            args.path.display()
        ));
    }
    let (config, _) = PipelineConfig::load(None);
    config.write(&args.path)?;
    println!("Wrote {}", args.path.display());
    Ok(())
}

async fn run_update_weights(args: UpdateWeightsArgs) -> Result<(), String> {
    let (config, _) = PipelineConfig::load(args.config.config);
    let summary = args
        .summary
        .unwrap_or_else(|| config.paths.feature_summary.clone());
    let updates = bandit::update_rules_file(&config.paths.rules, &summary)
        .await
        .map_err(|err| err.to_string())?;

    if updates.is_empty() {
        println!("No style rows in {}, weights unchanged.", summary.display());
        return Ok(());
    }
    for (style_id, weight) in &updates {
        println!("{:<16} weight {}", style_id, format_float(*weight, 2));
    }
    println!("Updated {}", config.paths.rules.display());
    Ok(())
}

fn describe_verdict(verdict: Verdict) -> String {
    match verdict {
        Verdict::Accepted => "accepted".to_string(),
        Verdict::Rejected(reason) => format!("rejected ({})", reason),
    }
}

fn read_text(arg: Option<String>) -> Result<String, String> {
    if let Some(text) = arg {
        if !text.trim().is_empty() {
            return Ok(text);
        }
    }

    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .map_err(|err| format!("failed reading stdin: {}", err))?;
    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Err("missing post text: pass --text or pipe stdin".to_string());
    }
    Ok(trimmed.to_string())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn load_dotenv() {
    let _ = dotenvy::dotenv();
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    let manifest_path = Path::new(manifest_dir).join(".env");
    let _ = dotenvy::from_path(manifest_path);
}
