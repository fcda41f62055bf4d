//! inbox-priority CLI: tag, rank and learn from message feedback.

use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use inbox_priority::config::EngineConfig;
use inbox_priority::engine::PriorityEngine;
use inbox_priority::message::Message;
use inbox_priority::paths::PriorityPaths;
use inbox_priority::tag::Tag;

#[derive(Parser)]
#[command(name = "inbox-priority", version, about = "Adaptive message priority engine")]
struct Cli {
    /// Data directory for persistent state (defaults to the XDG data dir).
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Config file (defaults to the XDG config dir).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the data directory and write a default config.
    Init,

    /// Tag messages from a JSON array file ("-" for stdin).
    Tag {
        file: PathBuf,

        /// Print results as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Rank messages from a JSON array file ("-" for stdin).
    Rank {
        file: PathBuf,

        /// Replay recorded rewards into the value store before ranking.
        #[arg(long)]
        learn: bool,

        /// Print results as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Record a tag correction or confirmation.
    Feedback {
        #[arg(long)]
        message_id: String,

        /// Tag the engine assigned.
        #[arg(long)]
        original: Tag,

        /// Tag the user wanted.
        #[arg(long)]
        correct: Tag,

        #[arg(long)]
        sender: String,

        /// Feedback quality: negative, zero or positive.
        #[arg(long, default_value = "1", allow_hyphen_values = true)]
        quality: f64,
    },

    /// Record a reward for a message, applied on the next `rank --learn`.
    Reward {
        #[arg(long)]
        message_id: String,

        #[arg(long, allow_hyphen_values = true)]
        reward: f64,
    },

    /// Show engine, tagging and learning statistics.
    Stats {
        #[arg(long)]
        json: bool,
    },

    /// Show per-sender and per-tag feedback insights.
    Insights {
        #[arg(long)]
        json: bool,
    },

    /// Suggest tagging rule improvements from feedback.
    Suggest,

    /// List the highest learned state values.
    Patterns {
        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Clear the value table and reward history.
    Reset,
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let paths = match cli.data_dir {
        Some(ref dir) => PriorityPaths::rooted(dir),
        None => PriorityPaths::resolve()?,
    };
    let config_path = cli.config.clone().unwrap_or_else(|| paths.config_file());
    let mut config = EngineConfig::load_or_default(&config_path)?;
    if cli.data_dir.is_some() || config.data_dir.is_none() {
        config.data_dir = Some(paths.data_dir.clone());
    }

    if let Commands::Init = cli.command {
        paths.ensure_dirs()?;
        if !config_path.exists() {
            config.save(&config_path)?;
            println!("Wrote config to {}", config_path.display());
        }
        let engine = PriorityEngine::new(config)?;
        println!("{}", engine.info());
        return Ok(());
    }

    // A reset that cannot be written is refused up front.
    let mut engine = if let Commands::Reset = cli.command {
        PriorityEngine::new_exclusive(config)?
    } else {
        PriorityEngine::new(config)?
    };
    if engine.is_read_only() {
        eprintln!("note: another process holds the data directory; changes will not be saved");
    }

    match cli.command {
        Commands::Init => unreachable!("handled above"),

        Commands::Tag { file, json } => {
            let mut messages = read_messages(&file)?;
            let results = engine.tag_batch(&messages);
            if json {
                for (message, result) in messages.iter_mut().zip(&results) {
                    message.apply_tag(result);
                }
                let out = serde_json::to_string_pretty(&messages).into_diagnostic()?;
                println!("{out}");
            } else {
                for (message, result) in messages.iter().zip(&results) {
                    println!(
                        "{:<12} {:<11} {:.2}  {}",
                        display_id(message),
                        result.tag,
                        result.confidence,
                        message.subject
                    );
                    for reason in &result.reasoning {
                        println!("    - {reason}");
                    }
                }
            }
        }

        Commands::Rank { file, learn, json } => {
            let mut messages = read_messages(&file)?;
            let untagged: Vec<usize> = messages
                .iter()
                .enumerate()
                .filter(|(_, m)| m.tag.is_none())
                .map(|(i, _)| i)
                .collect();
            for i in untagged {
                let result = engine.tag_message(&messages[i]);
                messages[i].apply_tag(&result);
            }

            if learn {
                let pass = engine.apply_feedback_from_history(&messages);
                eprintln!(
                    "learning pass: {} updates, episode reward {:.2}",
                    pass.updates, pass.episode_reward
                );
            }

            let ranked = engine.rank(&messages);
            if json {
                let out = serde_json::to_string_pretty(&ranked).into_diagnostic()?;
                println!("{out}");
            } else {
                for (pos, r) in ranked.iter().enumerate() {
                    println!(
                        "{:>3}. {:>6.2}  {:<12} {:<11} {}",
                        pos + 1,
                        r.final_score,
                        display_id(r.message),
                        r.message.effective_tag(),
                        r.message.subject
                    );
                }
            }
        }

        Commands::Feedback {
            message_id,
            original,
            correct,
            sender,
            quality,
        } => {
            let outcome = engine.correct(&message_id, original, correct, &sender, quality);
            println!("preferred tag for {sender}: {}", outcome.preferred_tag);
            match outcome.confidence {
                Some(c) => println!("confidence for {message_id}: {c:.2}"),
                None => println!("message {message_id} was never tagged; confidence unchanged"),
            }
            if !outcome.persisted {
                eprintln!("warning: feedback was not saved");
            }
        }

        Commands::Reward { message_id, reward } => {
            if engine.record_reward(&message_id, reward) {
                println!("Recorded reward {reward} for {message_id}");
            } else {
                miette::bail!("reward for {message_id:?} was rejected or not saved");
            }
        }

        Commands::Stats { json } => {
            let stats = engine.stats();
            let tagging = engine.tagging_stats();
            let learning = engine.learning_stats();
            if json {
                let out = serde_json::to_string_pretty(&serde_json::json!({
                    "engine": stats,
                    "tagging": tagging,
                    "learning": learning,
                }))
                .into_diagnostic()?;
                println!("{out}");
            } else {
                println!("{}", engine.info());
                println!("Tagging:");
                println!("  average confidence: {:.3}", tagging.average_confidence);
                println!("  correction rate:    {:.3}", tagging.correction_rate);
                for (tag, count) in &tagging.tag_distribution {
                    println!("  {tag:<11} {count}");
                }
                println!("Learning:");
                println!("  learning rate:  {}", learning.learning_rate);
                println!("  average reward: {:.3}", learning.average_reward);
                println!("  reward trend:   {}", learning.reward_trend);
                println!("  average value:  {:.3}", learning.average_value);
                if let (Some(max), Some(min)) = (learning.max_value, learning.min_value) {
                    println!("  value range:    {min:.3} .. {max:.3}");
                }
            }
        }

        Commands::Insights { json } => {
            let insights = engine.sender_insights();
            if json {
                let out = serde_json::to_string_pretty(&insights).into_diagnostic()?;
                println!("{out}");
            } else {
                println!("Corrections: {}", insights.total_corrections);
                println!(
                    "  positive {} / neutral {} / negative {}",
                    insights.positive_feedback_count,
                    insights.neutral_feedback_count,
                    insights.negative_feedback_count
                );
                println!("Sender preferences ({}):", insights.sender_preferences.len());
                for (sender, tag) in &insights.sender_preferences {
                    println!("  {sender:<30} {tag}");
                }
                println!("Most corrected tags:");
                for (tag, count) in &insights.most_corrected_tags {
                    println!("  {tag:<11} {count}");
                }
            }
        }

        Commands::Suggest => {
            let suggestions = engine.suggest_tag_improvements();
            if suggestions.is_empty() {
                println!("No suggestions yet.");
            }
            for s in suggestions {
                println!("- {s}");
            }
        }

        Commands::Patterns { limit } => {
            let patterns = engine.top_learned_patterns(limit);
            if patterns.is_empty() {
                println!("No learned states.");
            }
            for (key, value) in patterns {
                println!("{value:>8.3}  {key}");
            }
        }

        Commands::Reset => {
            if engine.reset_learning() {
                println!("Learning data reset.");
            } else {
                miette::bail!("learning data was cleared in memory but could not be saved");
            }
        }
    }

    Ok(())
}

fn read_messages(file: &Path) -> Result<Vec<Message>> {
    let content = if file.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).into_diagnostic()?;
        buf
    } else {
        std::fs::read_to_string(file).into_diagnostic()?
    };
    serde_json::from_str(&content).into_diagnostic()
}

fn display_id(message: &Message) -> &str {
    if message.id.is_empty() { "-" } else { &message.id }
}
