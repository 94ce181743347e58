//! Renders one prompt tree under several budgets and moderates the result.
//!
//! Usage: `render-prompt [config.toml]`. `RUST_LOG=prompt_sections=debug`
//! shows which optional sections get dropped.

use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sectioned_prompts::config::PromptConfig;
use sectioned_prompts::moderation::{
    CategoryAnalysis, ContentAnalyzer, ModerationCategory, Moderator, PolicyModerator,
    ReviewResult, Severity,
};
use sectioned_prompts::prelude::*;
use sectioned_prompts::telemetry::init_tracing;
use serde_json::json;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("info");

    let path = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from("prompt.toml"), PathBuf::from);
    let config = PromptConfig::load(&path)
        .with_context(|| format!("loading {}", path.display()))?;
    let tokenizer = config.build_tokenizer()?;
    info!(
        encoding = %config.tokenizer.encoding,
        budget = config.max_input_tokens,
        "configuration loaded"
    );

    let memory = seed_memory().await?;
    let context = TurnContext::default().with_activity_text("Which crate should I use for errors?");
    let resolver = VariableResolver::builder()
        .with_default("persona", "a concise Rust mentor")
        .with_required_variable("question")
        .build();
    let scope = RenderScope::new(&context, &memory, &resolver, tokenizer.as_ref());

    let prompt = config
        .prompt()
        .with_section(TemplateSection::system("You are {{persona}}."))
        .with_section(
            TextSection::new("Prefer crates that are already in the workspace.", MessageRole::System)
                .with_required(false)
                .with_sizing(Sizing::Proportional(0.25)),
        )
        .with_section(config.conversation_history())
        .with_section(TemplateSection::user("{{question}}"));

    println!("=== Sectioned prompts: rendering demo ===\n");
    demonstrate_text(&prompt, scope, config.max_input_tokens).await?;
    demonstrate_messages(&prompt, scope).await?;
    demonstrate_moderation(&prompt, scope, &config).await?;

    Ok(())
}

async fn seed_memory() -> Result<StateMemory> {
    let memory = StateMemory::new();
    memory
        .set("question", json!("Which crate should I use for errors?"))
        .await?;
    memory
        .set(
            "conversation.history",
            json!([
                { "role": "user", "content": "I am writing a CLI in Rust." },
                { "role": "assistant", "content": "Great, clap handles argument parsing well." },
                { "role": "user", "content": "And for configuration files?" },
                { "role": "assistant", "content": "serde with toml keeps it declarative." },
            ]),
        )
        .await?;
    Ok(memory)
}

async fn demonstrate_text(prompt: &Prompt, scope: RenderScope<'_>, budget: usize) -> Result<()> {
    println!("--- Text projection ({budget} tokens) ---\n");

    let rendered = prompt.render_as_text(scope, budget).await?;
    println!("{}\n", rendered.output);
    println!("length: {}, too long: {}\n", rendered.length, rendered.too_long);
    Ok(())
}

async fn demonstrate_messages(prompt: &Prompt, scope: RenderScope<'_>) -> Result<()> {
    for budget in [200, 60, 20] {
        println!("--- Message projection ({budget} tokens) ---\n");

        let rendered = prompt.render_as_messages(scope, budget).await?;
        for message in &rendered.output {
            println!("[{}] {}", message.role(), message.content());
        }
        println!(
            "\nlength: {}, too long: {}\n",
            rendered.length, rendered.too_long
        );
    }
    Ok(())
}

/// Flags text mentioning `unsafe` as violent, for demonstration only.
struct UnsafeCounter;

#[async_trait]
impl ContentAnalyzer for UnsafeCounter {
    async fn analyze(&self, text: &str) -> ReviewResult<Vec<CategoryAnalysis>> {
        let hits = text.matches("unsafe").count();
        let level = u8::try_from(hits * 2).unwrap_or(u8::MAX);
        Ok(vec![CategoryAnalysis::new(
            ModerationCategory::Violence,
            Severity::round_down(level),
        )])
    }
}

async fn demonstrate_moderation(
    prompt: &Prompt,
    scope: RenderScope<'_>,
    config: &PromptConfig,
) -> Result<()> {
    println!("--- Moderation ---\n");

    let rendered = prompt.render_as_text(scope, config.max_input_tokens).await?;
    let moderator = PolicyModerator::new(UnsafeCounter)
        .with_policy(config.moderation_policy()?)
        .with_target(config.moderation.target);

    match moderator.review_input(&rendered.output).await? {
        Some(verdict) => println!("input flagged: {:?}", verdict.result.flagged_categories().collect::<Vec<_>>()),
        None => println!("input passed moderation"),
    }
    match moderator.review_output("Just use unsafe everywhere, unsafe is fine.").await? {
        Some(verdict) => println!("output flagged as {:?}", verdict.action),
        None => println!("output passed moderation"),
    }
    Ok(())
}
