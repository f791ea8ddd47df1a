//! Dcision - natural-language to optimization-model compiler
//!
//! Main CLI entry point for building, classifying and checking models.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use dcision::config::{DcisionConfig, GenerationConfig};
use dcision::{
    BuildRequest, ClaudeModel, ConformanceChecker, LanguageModel, ModelAssembler, Normalizer,
    OllamaModel, ProblemCategory, ProblemDescription, RecipeRegistry, ScriptedModel,
};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Exit code for a request that produced a failure report
const EXIT_FAILURE_REPORT: i32 = 2;

#[derive(Parser)]
#[command(name = "dcision")]
#[command(version)]
#[command(about = "Compile natural-language problems into optimization models", long_about = None)]
struct Cli {
    /// Config file (default: dcision.toml in this or a parent directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Lp,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a structured model from a problem description
    Build {
        /// Problem description
        text: String,

        /// Hint as key=value (repeatable)
        #[arg(long = "hint", value_name = "KEY=VALUE", value_parser = parse_hint)]
        hints: Vec<(String, String)>,

        /// Force a problem category (e.g. production_planning)
        #[arg(long)]
        category: Option<String>,

        /// Language model backend: ollama, claude, mock or none
        #[arg(long)]
        backend: Option<String>,

        /// Backend model name
        #[arg(long)]
        model: Option<String>,

        /// Language model timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// File holding one scripted reply for the mock backend (repeatable)
        #[arg(long = "mock-reply", value_name = "FILE")]
        mock_replies: Vec<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,

        /// Print the diagnostic trail to stderr
        #[arg(long)]
        trail: bool,
    },

    /// Classify a problem description and show the route it would take
    Classify {
        /// Problem description
        text: String,

        /// Hint as key=value (repeatable)
        #[arg(long = "hint", value_name = "KEY=VALUE", value_parser = parse_hint)]
        hints: Vec<(String, String)>,
    },

    /// Normalize a model or raw LLM response and check it against a category
    Check {
        /// JSON model or raw response file
        file: PathBuf,

        /// Category whose shape to check against (default: unknown)
        #[arg(long)]
        category: Option<String>,
    },

    /// List registered recipes
    Recipes,
}

fn parse_hint(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty hint key in '{}'", s));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "dcision=debug" } else { "dcision=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<DcisionConfig> {
    match path {
        Some(p) => DcisionConfig::load(p).with_context(|| format!("loading {}", p.display())),
        None => DcisionConfig::load_from_cwd().context("loading dcision.toml"),
    }
}

fn language_model(
    generation: &GenerationConfig,
    mock_replies: &[PathBuf],
) -> Result<Option<Arc<dyn LanguageModel>>> {
    let model: Arc<dyn LanguageModel> = match generation.backend.as_str() {
        "ollama" => {
            let env_default = OllamaModel::new();
            Arc::new(OllamaModel::with_config(
                generation
                    .host
                    .clone()
                    .unwrap_or_else(|| env_default.host().to_string()),
                generation
                    .model
                    .clone()
                    .unwrap_or_else(|| env_default.model().to_string()),
            ))
        }
        "claude" => Arc::new(ClaudeModel::with_config(
            std::env::var("ANTHROPIC_API_KEY").ok().filter(|k| !k.is_empty()),
            generation.model.clone(),
            generation.max_tokens,
        )),
        "mock" => {
            let replies = mock_replies
                .iter()
                .map(|p| fs::read_to_string(p).with_context(|| format!("reading {}", p.display())))
                .collect::<Result<Vec<_>>>()?;
            Arc::new(ScriptedModel::new(replies))
        }
        "none" => return Ok(None),
        other => bail!("unknown backend '{}' (expected ollama, claude, mock or none)", other),
    };
    Ok(Some(model))
}

fn parse_category(raw: Option<&str>) -> Result<ProblemCategory> {
    match raw {
        Some(c) => c.parse::<ProblemCategory>().map_err(anyhow::Error::msg),
        None => Ok(ProblemCategory::Unknown),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let mut config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Build {
            text,
            hints,
            category,
            backend,
            model,
            timeout,
            mock_replies,
            format,
            trail,
        } => {
            if let Some(b) = backend {
                config.generation.backend = b;
            }
            if model.is_some() {
                config.generation.model = model;
            }
            if let Some(t) = timeout {
                config.generation.timeout_secs = t;
            }
            config.validate()?;

            let llm = language_model(&config.generation, &mock_replies)?;
            let assembler = ModelAssembler::new(
                config.assembler(),
                Arc::new(RecipeRegistry::with_builtin()),
                llm,
            );

            let mut request = BuildRequest::with_hints(text, hints.into_iter().collect());
            request.category_hint = category;
            request.timeout = Some(Duration::from_secs(config.generation.timeout_secs));

            match assembler.build(&request).await {
                Ok(outcome) => {
                    if trail {
                        for stage in &outcome.trail {
                            eprintln!("  - {}", stage);
                        }
                    }
                    match format {
                        OutputFormat::Json => println!("{}", outcome.model.to_json()?),
                        OutputFormat::Lp => print!("{}", outcome.model.to_lp()),
                    }
                }
                Err(report) => {
                    eprintln!("error: {}", report);
                    for violation in &report.violations {
                        eprintln!("  ! {}", violation);
                    }
                    if trail {
                        for stage in &report.trail {
                            eprintln!("  - {}", stage);
                        }
                    }
                    println!("{}", serde_json::to_string_pretty(&report)?);
                    std::process::exit(EXIT_FAILURE_REPORT);
                }
            }
        }

        Commands::Classify { text, hints } => {
            let assembler = ModelAssembler::new(
                config.assembler(),
                Arc::new(RecipeRegistry::with_builtin()),
                None,
            );
            let description =
                ProblemDescription::with_hints(text, hints.into_iter().collect::<BTreeMap<_, _>>());
            let mut trail = Vec::new();
            let classification = assembler.classify(&description, None, &mut trail);
            println!("category:   {}", classification.category);
            println!("confidence: {:.2}", classification.confidence);
            println!("signals:    {}", classification.matched_signals.join(", "));
            match assembler.route(&classification) {
                dcision::RouteDecision::Deterministic { .. } => {
                    println!("route:      deterministic")
                }
                dcision::RouteDecision::Generative { reason, .. } => {
                    println!("route:      generative ({})", reason)
                }
            }
            for score in assembler.classifier().scores(&description) {
                println!(
                    "  {:<22} {:.2}  [{}]",
                    score.category.as_str(),
                    score.confidence,
                    score.matched.join(", ")
                );
            }
        }

        Commands::Check { file, category } => {
            let raw = fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let category = parse_category(category.as_deref())?;
            let registry = RecipeRegistry::with_builtin();
            let shape = registry.shape_for(category);

            let normalized = match Normalizer::new().normalize(&raw, &shape) {
                Ok(n) => n,
                Err(failure) => {
                    for reason in failure.reasons() {
                        println!("  ! {}", reason);
                    }
                    bail!("{}", failure);
                }
            };
            println!("normalized via {}", normalized.strategy);

            // a reply to an unknown-category request may still name its category
            let model = normalized.model;
            let shape = registry.shape_for(model.category);
            match ConformanceChecker::check(&model, &shape, registry.lookup(model.category)) {
                Ok(()) => println!(
                    "VALID ({}: {} variables, {} constraints)",
                    model.category,
                    model.variables.len(),
                    model.constraints.len()
                ),
                Err(violations) => {
                    for v in &violations {
                        println!("  ! {}", v);
                    }
                    bail!("INVALID ({} violations)", violations.len());
                }
            }
        }

        Commands::Recipes => {
            let registry = RecipeRegistry::with_builtin();
            for recipe in registry.iter() {
                let shape = recipe.shape();
                println!("{}", recipe.category());
                println!("  {}", recipe.summary());
                println!("  roles:       {}", shape.variable_roles.join(", "));
                for family in &shape.constraint_shapes {
                    println!("  constraint:  {} ({})", family.name, family.description);
                }
            }
        }
    }

    Ok(())
}
