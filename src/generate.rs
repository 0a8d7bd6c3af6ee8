//! Photo generation driver.
//!
//! Sequences the whole run: load items and manifest, narrow the worklist,
//! then either print each prompt (dry run) or call the image service one
//! item at a time, writing artifacts and persisting the manifest after
//! every success.
//!
//! Runs are strictly sequential. The only waits are the pre-start delay,
//! the pause between live items and the rate-limit cool-down.

use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::artifacts::{self, RenditionSpec};
use crate::config::{Config, GenerationConfig};
use crate::images::{GenerateError, GeneratedImage, ImageGenerator, OpenAIImageGenerator};
use crate::loader;
use crate::manifest::{now_timestamp, Manifest, ManifestEntry};
use crate::models::Item;
use crate::prompt::build_prompt;
use crate::select::{self, Selection};

/// Options for one `photos generate` run.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub selection: Selection,
    pub dry_run: bool,
}

/// Outcome counts for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: usize,
}

/// Waits applied during a live run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pacing {
    pub start_delay: Duration,
    pub between_items: Duration,
    pub rate_limit_cooldown: Duration,
    /// `None` keeps retrying a rate-limited item indefinitely.
    pub max_rate_limit_retries: Option<u32>,
}

impl From<&GenerationConfig> for Pacing {
    fn from(config: &GenerationConfig) -> Self {
        Self {
            start_delay: Duration::from_secs(config.start_delay_secs),
            between_items: Duration::from_millis(config.pacing_ms),
            rate_limit_cooldown: Duration::from_secs(config.rate_limit_cooldown_secs),
            max_rate_limit_retries: config.max_rate_limit_retries,
        }
    }
}

/// Everything a live run writes to, plus how it paces itself.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub images_dir: PathBuf,
    pub manifest_path: PathBuf,
    pub renditions: RenditionSpec,
    pub pacing: Pacing,
}

impl RunContext {
    pub fn from_config(config: &Config) -> Self {
        Self {
            images_dir: config.paths.images_dir.clone(),
            manifest_path: config.paths.manifest_path(),
            renditions: RenditionSpec::from(&config.generation),
            pacing: Pacing::from(&config.generation),
        }
    }
}

/// Entry point for `photos generate` / `photos prompts`.
pub async fn run_generate(config: &Config, opts: &GenerateOptions) -> Result<RunSummary> {
    println!("=== Dailydays Photo Generator ===\n");

    let data_file = &config.paths.data_file;
    let items = loader::load_items(data_file)?;
    println!(
        "Loaded {} items from {}",
        items.len(),
        display_name(data_file)
    );

    let ctx = RunContext::from_config(config);
    let mut manifest = Manifest::load(&ctx.manifest_path)?;

    let (worklist, steps) = select::select_items(
        &items,
        &opts.selection,
        |id| manifest.contains(id),
        &mut rand::thread_rng(),
    );
    for step in &steps {
        println!("{}", step);
    }

    if worklist.is_empty() {
        println!("No items to generate. All done!");
        return Ok(RunSummary::default());
    }

    println!("\nWill generate {} images.", worklist.len());

    let summary = if opts.dry_run {
        run_dry(&worklist)
    } else {
        // Credential check happens before any output about cost or work.
        let generator = OpenAIImageGenerator::new(&config.generation)?;
        tracing::info!(model = generator.model_name(), "using image service");

        let estimated_cost = worklist.len() as f64 * config.generation.cost_per_image;
        println!("Estimated cost: ~${:.2}", estimated_cost);
        println!(
            "Starting in {} seconds... (Ctrl+C to cancel)\n",
            ctx.pacing.start_delay.as_secs()
        );
        tokio::time::sleep(ctx.pacing.start_delay).await;

        run_live(&generator, &worklist, &mut manifest, &ctx).await?
    };

    println!("\n=== Done ===");
    println!(
        "Generated: {} | Failed: {}",
        summary.succeeded, summary.failed
    );

    if !opts.dry_run && summary.succeeded > 0 {
        println!("Images saved to: {}", ctx.images_dir.display());
        println!("Manifest updated: {}", ctx.manifest_path.display());
    }

    Ok(summary)
}

/// Print every prompt without touching the service, the manifest or disk.
pub fn run_dry(items: &[Item]) -> RunSummary {
    let total = items.len();
    for (i, item) in items.iter().enumerate() {
        print!("[{}/{}]", i + 1, total);
        print_prompt_block(item, &build_prompt(item));
    }
    RunSummary {
        succeeded: total,
        failed: 0,
    }
}

fn print_prompt_block(item: &Item, prompt: &str) {
    println!("\n─── {}: {} ───", item.id, item.name);
    println!(
        "Room: {} | Category: {} | Size: {}",
        item.tags.room, item.tags.category, item.size
    );
    println!("Prompt ({} chars):", prompt.chars().count());
    println!("{}", prompt);
}

/// Generate every item in order, continuing past per-item failures.
///
/// Only setup problems (the images directory cannot be created) abort the
/// run; everything else is counted against the item and reported.
pub async fn run_live<G: ImageGenerator + ?Sized>(
    generator: &G,
    items: &[Item],
    manifest: &mut Manifest,
    ctx: &RunContext,
) -> Result<RunSummary> {
    std::fs::create_dir_all(&ctx.images_dir).with_context(|| {
        format!(
            "Failed to create images directory: {}",
            ctx.images_dir.display()
        )
    })?;

    let total = items.len();
    let mut summary = RunSummary::default();

    for (i, item) in items.iter().enumerate() {
        print!("[{}/{}]", i + 1, total);

        match generate_item(generator, item, manifest, ctx).await {
            Ok(entry) => {
                println!(
                    "  Full: {:.1}KB | Thumb: {:.1}KB",
                    entry.full_size as f64 / 1024.0,
                    entry.thumb_size as f64 / 1024.0
                );
                summary.succeeded += 1;
            }
            Err(e) => {
                println!("  Error generating {}: {:#}", item.id, e);
                tracing::warn!(id = %item.id, error = %e, "item failed");
                summary.failed += 1;
            }
        }

        if i + 1 < total {
            tokio::time::sleep(ctx.pacing.between_items).await;
        }
    }

    Ok(summary)
}

/// Generate, store and record a single item. The manifest is saved before
/// this returns `Ok`; if saving fails, the in-memory manifest is left as it
/// was.
pub async fn generate_item<G: ImageGenerator + ?Sized>(
    generator: &G,
    item: &Item,
    manifest: &mut Manifest,
    ctx: &RunContext,
) -> Result<ManifestEntry> {
    let prompt = build_prompt(item);
    println!("\nGenerating {}: {}...", item.id, item.name);

    let image = request_with_cooldown(generator, &prompt, &ctx.pacing).await?;

    let decoded = artifacts::decode_payload(&image.b64_json)?;
    let saved = artifacts::write_renditions(&decoded, &ctx.images_dir, &item.id, &ctx.renditions)?;

    let entry = ManifestEntry {
        name: item.name.clone(),
        prompt,
        generated: now_timestamp(),
        full_size: saved.full_size,
        thumb_size: saved.thumb_size,
        revised_prompt: image.revised_prompt,
        extra: Default::default(),
    };
    let previous = manifest.record(&item.id, entry.clone());
    if let Err(e) = manifest.save(&ctx.manifest_path) {
        // Unsaved entries must not ride along with a later save.
        match previous {
            Some(previous) => {
                manifest.record(&item.id, previous);
            }
            None => {
                manifest.remove(&item.id);
            }
        }
        return Err(e);
    }

    Ok(entry)
}

/// Call the service, sleeping through rate limits.
async fn request_with_cooldown<G: ImageGenerator + ?Sized>(
    generator: &G,
    prompt: &str,
    pacing: &Pacing,
) -> Result<GeneratedImage> {
    let mut retries = 0u32;
    loop {
        match generator.generate(prompt).await {
            Ok(image) => return Ok(image),
            Err(GenerateError::RateLimited(message)) => {
                if let Some(max) = pacing.max_rate_limit_retries {
                    if retries >= max {
                        return Err(anyhow!(
                            "still rate limited after {} retries: {}",
                            retries,
                            message
                        ));
                    }
                }
                retries += 1;
                tracing::debug!(retries, %message, "rate limited");
                println!(
                    "  Rate limited. Waiting {} seconds...",
                    pacing.rate_limit_cooldown.as_secs()
                );
                tokio::time::sleep(pacing.rate_limit_cooldown).await;
            }
            Err(e) => return Err(e.into()),
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
