//! Pyx interactive shell
//!
//! Enter a phrase, then label it: `s` safe, `b` bad, `a` let the AI decide,
//! `os`/`ob` override. Other commands: `list`, `score <text>`,
//! `respond <text>`, `quit`.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use pyx_core::{
    Category, EngineConfig, JsonlMirror, MirrorSink, NullMirror, PyxEngine, VerdictSource,
};
use tracing_subscriber::{fmt, EnvFilter};

/// Pyx AI - kid-friendly content filter
#[derive(Parser)]
#[command(name = "pyx")]
#[command(version)]
#[command(about = "Train and query the Pyx appropriateness filter")]
struct Cli {
    /// Engine configuration file
    #[arg(long, default_value = "config/engine.toml")]
    config: PathBuf,

    /// Override the data directory from the configuration
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Mirror every label change to this JSONL file
    #[arg(long)]
    mirror: Option<PathBuf>,

    /// Category for entered items (word, phrase, game_idea)
    #[arg(long, default_value = "phrase")]
    category: String,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

enum Choice {
    Safe,
    Bad,
    AiDecide,
    OverrideSafe,
    OverrideBad,
}

impl Choice {
    fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "s" | "safe" => Some(Choice::Safe),
            "b" | "bad" => Some(Choice::Bad),
            "a" | "ai" => Some(Choice::AiDecide),
            "os" | "override safe" => Some(Choice::OverrideSafe),
            "ob" | "override bad" => Some(Choice::OverrideBad),
            _ => None,
        }
    }
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<EngineConfig> {
    let config = if cli.config.exists() {
        EngineConfig::load_from_file(&cli.config)
            .with_context(|| format!("reading {}", cli.config.display()))?
    } else {
        tracing::warn!(
            "Config file {} not found; using defaults",
            cli.config.display()
        );
        EngineConfig::default()
    };
    Ok(match &cli.data_dir {
        Some(dir) => config.with_data_dir(dir),
        None => config,
    })
}

fn print_list(engine: &PyxEngine) {
    for category in Category::all() {
        let items: Vec<String> = engine
            .allowed(category)
            .iter()
            .map(|item| item.display_text())
            .collect();
        println!("{}: {:?}", category, items);
    }
}

fn print_score(engine: &PyxEngine, text: &str) {
    let verdict = engine.judge(text, None);
    let status = if verdict.inappropriate {
        "INAPPROPRIATE"
    } else {
        "SAFE"
    };
    let source = match &verdict.source {
        VerdictSource::Network => "network".to_string(),
        VerdictSource::ExactLabel => "label".to_string(),
        VerdictSource::WildcardLabel { prefix } => format!("rule '{prefix}...'"),
    };
    println!("Score: {:.3} ({}, by {})", verdict.score, status, source);
}

fn prompt(stdin: &mut impl BufRead, label: &str) -> Result<Option<String>> {
    print!("{label}");
    io::stdout().flush()?;
    let mut line = String::new();
    if stdin.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn run(engine: &mut PyxEngine, category: Category) -> Result<()> {
    let stdin = io::stdin();
    let mut input = stdin.lock();

    println!("Pyx AI - Kid-friendly filter");
    println!("Enter a phrase, then: [s]afe  [b]ad  [a]i decide  [o]verride");
    println!("Commands: list | score <text> | respond <text> | quit\n");

    loop {
        let Some(text) = prompt(&mut input, "Phrase: ")? else {
            break;
        };
        if text.is_empty() {
            continue;
        }
        let lowered = text.to_lowercase();
        if lowered == "quit" {
            break;
        }
        if lowered == "list" {
            print_list(engine);
            continue;
        }
        if let Some(rest) = lowered.strip_prefix("score ") {
            print_score(engine, rest.trim());
            continue;
        }
        if let Some(rest) = lowered.strip_prefix("respond ") {
            match engine.respond(rest.trim(), category) {
                Some(item) => println!("Pyx: {}", item.display_text()),
                None => println!("Pyx: (nothing learned that fits)"),
            }
            continue;
        }

        let Some(answer) = prompt(
            &mut input,
            "  Safe [s] / Bad [b] / AI decide [a] / Override Safe [os] / Override Bad [ob]: ",
        )?
        else {
            break;
        };

        match Choice::parse(&answer) {
            Some(Choice::Safe) => {
                engine.train(&text, true, category);
                println!("Marked SAFE and added.");
            }
            Some(Choice::Bad) => {
                engine.train(&text, false, category);
                println!("Marked BAD.");
            }
            Some(Choice::AiDecide) => {
                let decision = engine.ai_decide(&text, category);
                if decision.accepted {
                    println!("AI says: SAFE (score {:.3}). Added.", decision.score);
                } else {
                    println!(
                        "AI says: INAPPROPRIATE (score {:.3}). Not added (override with os if wrong).",
                        decision.score
                    );
                }
            }
            Some(Choice::OverrideSafe) => {
                engine.set_label(&text, true, category);
                println!("Overridden: SAFE.");
            }
            Some(Choice::OverrideBad) => {
                engine.set_label(&text, false, category);
                println!("Overridden: BAD.");
            }
            None => {
                println!("Use s, b, a, os, or ob.");
                continue;
            }
        }
        engine.save()?;
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let category: Category = cli.category.parse()?;
    let config = load_config(&cli)?;

    let mirror: Box<dyn MirrorSink> = match &cli.mirror {
        Some(path) => Box::new(JsonlMirror::new(path)),
        None => Box::new(NullMirror),
    };

    let mut engine = PyxEngine::start(config, mirror).context("starting engine")?;
    let result = run(&mut engine, category);
    engine.save().context("saving engine state")?;
    result
}
