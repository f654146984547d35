//! Attune CLI - drive the personalization engine from the terminal
//!
//! Thin wrapper over `attune_core::Personalizer` backed by a local SQLite
//! database, mainly for inspection and manual testing of profiles and
//! memory state.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;

use attune_core::storage::SqliteStore;
use attune_core::types::ContextLabel;
use attune_core::{
    ChatRequest, EngineConfig, MemoryTier, PartialToneVector, Personalizer, ToneProfile,
};

/// Attune - per-user memory and tone adaptation
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the SQLite database
    #[arg(long, value_name = "FILE", default_value = ".attune/attune.db")]
    db: PathBuf,

    /// Path to an engine configuration file (TOML)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one chat message and print the resulting tone directive
    Chat {
        /// User identifier
        user: String,
        /// Message text
        message: String,
        /// Force a context instead of classifying
        #[arg(long)]
        context: Option<ContextLabel>,
        /// Feedback on the previous exchange, in [-1, 1]
        #[arg(long)]
        feedback: Option<f64>,
    },

    /// Show a user's tone profile
    Profile {
        /// User identifier
        user: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create or update preference axes on a profile
    SetProfile {
        /// User identifier
        user: String,
        /// Apply to one context instead of the base preferences
        #[arg(long)]
        context: Option<ContextLabel>,
        #[arg(long)]
        formality: Option<f64>,
        #[arg(long)]
        enthusiasm: Option<f64>,
        #[arg(long)]
        verbosity: Option<f64>,
        #[arg(long)]
        empathy: Option<f64>,
        #[arg(long)]
        humor: Option<f64>,
    },

    /// Show a user's memory state
    Memory {
        /// User identifier
        user: String,
        /// Tier to show: short, long, or both
        #[arg(long, default_value = "both")]
        tier: String,
        /// Filter by context
        #[arg(long)]
        context: Option<ContextLabel>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Clear a user's memory
    ClearMemory {
        /// User identifier
        user: String,
        /// Tier to clear: short, long, or both
        #[arg(long, default_value = "both")]
        tier: String,
    },

    /// Submit feedback for a context
    Feedback {
        /// User identifier
        user: String,
        /// Context the feedback applies to
        context: ContextLabel,
        /// Score in [-1, 1]
        score: f64,
    },

    /// Show long-term memory analytics
    Analytics {
        /// User identifier
        user: String,
    },

    /// Delete a user's profile and all memory
    Delete {
        /// User identifier
        user: String,
    },
}

fn parse_tier(tier: &str) -> anyhow::Result<MemoryTier> {
    match tier {
        "short" => Ok(MemoryTier::Short),
        "long" => Ok(MemoryTier::Long),
        "both" => Ok(MemoryTier::Both),
        other => anyhow::bail!("unknown tier '{other}', expected short, long, or both"),
    }
}

fn print_profile(profile: &ToneProfile) {
    println!("{} {}", "user:".bold(), profile.user_id);
    let prefs = profile.base_preferences;
    println!(
        "  formality {:.2}  enthusiasm {:.2}  verbosity {:.2}  empathy {:.2}  humor {:.2}",
        prefs.formality, prefs.enthusiasm, prefs.verbosity, prefs.empathy, prefs.humor
    );
    for (context, partial) in &profile.context_overrides {
        println!("  {} {:?}", format!("[{context}]").cyan(), partial);
    }
    println!(
        "  interactions: {}  successful: {}  mean feedback: {:.2}",
        profile.interaction_count, profile.successful_match_count, profile.mean_feedback_score
    );
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let store = SqliteStore::open(&cli.db)
        .with_context(|| format!("opening database {}", cli.db.display()))?;
    let engine = Personalizer::new(config, Arc::new(store));

    match cli.command {
        Commands::Chat {
            user,
            message,
            context,
            feedback,
        } => {
            let request = ChatRequest {
                user_id: user,
                message,
                context_hint: context,
                feedback,
                deadline: None,
            };
            let directive = engine.handle_chat(&request)?;
            println!(
                "{} {}   {} {}",
                "context:".bold(),
                directive.context.to_string().cyan(),
                "emotion:".bold(),
                directive.emotion
            );
            let tone = directive.tone;
            println!(
                "{} formality {:.2}  enthusiasm {:.2}  verbosity {:.2}  empathy {:.2}  humor {:.2}",
                "tone:".bold(),
                tone.formality,
                tone.enthusiasm,
                tone.verbosity,
                tone.empathy,
                tone.humor
            );
            for hint in &directive.hints {
                println!("  {} {hint}", "-".dimmed());
            }
        }

        Commands::Profile { user, json } => {
            let profile = engine.get_profile(&user)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&profile)?);
            } else {
                print_profile(&profile);
            }
        }

        Commands::SetProfile {
            user,
            context,
            formality,
            enthusiasm,
            verbosity,
            empathy,
            humor,
        } => {
            let partial = PartialToneVector {
                formality,
                enthusiasm,
                verbosity,
                empathy,
                humor,
            };
            if partial.is_empty() {
                anyhow::bail!("no axes supplied; pass at least one of --formality etc.");
            }
            let profile = match context {
                Some(label) => engine.create_or_update_profile(
                    &user,
                    PartialToneVector::default(),
                    &[(label, partial)],
                    None,
                )?,
                None => engine.create_or_update_profile(&user, partial, &[], None)?,
            };
            println!("{}", "profile updated".green());
            print_profile(&profile);
        }

        Commands::Memory {
            user,
            tier,
            context,
            json,
        } => {
            let snapshot = engine.get_memory(&user, parse_tier(&tier)?, context)?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "short_term": snapshot.short_term,
                        "long_term": snapshot.long_term,
                        "long_term_unavailable": snapshot.long_term_unavailable,
                    }))?
                );
            } else {
                if snapshot.long_term_unavailable {
                    println!("{}", "warning: long-term memory unavailable".yellow());
                }
                println!("{}", "short-term:".bold());
                for exchange in &snapshot.short_term {
                    println!(
                        "  [{}] ({}) {}",
                        exchange.timestamp.format("%Y-%m-%d %H:%M"),
                        exchange.context,
                        exchange.user_message
                    );
                }
                println!("{}", "long-term:".bold());
                for entry in &snapshot.long_term {
                    println!(
                        "  [{}] ({}) {} bytes  {}",
                        entry.last_reinforced_at.format("%Y-%m-%d %H:%M"),
                        entry.context,
                        entry.size_bytes,
                        entry.payload
                    );
                }
            }
        }

        Commands::ClearMemory { user, tier } => {
            engine.clear_memory(&user, parse_tier(&tier)?, None)?;
            println!("{}", "memory cleared".green());
        }

        Commands::Feedback {
            user,
            context,
            score,
        } => {
            let profile = engine.submit_feedback(&user, context, score, None)?;
            println!("{}", "feedback applied".green());
            print_profile(&profile);
        }

        Commands::Analytics { user } => {
            let analytics = engine.get_memory_analytics(&user)?;
            println!(
                "{} {}   {} {}   {} {:.3}",
                "entries:".bold(),
                analytics.entry_count,
                "bytes:".bold(),
                analytics.total_bytes,
                "mean weight:".bold(),
                analytics.mean_weight
            );
            for (context, count) in &analytics.context_distribution {
                println!("  {context}: {count}");
            }
        }

        Commands::Delete { user } => {
            engine.delete_profile(&user, None)?;
            println!("{}", "user deleted".green());
        }
    }

    Ok(())
}
