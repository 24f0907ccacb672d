//! # RalphGen
//!
//! Command-line front end: generate, caption, export and browse memes.

use std::path::Path;

use anyhow::Context;
use clap::Parser;
use meme_core::{layout, FontFamily, GalleryBackend, GalleryStore};
use meme_client::captions::caption_commands;
use meme_client::{
    Action, CliArgs, ClientConfig, GalleryAction, GenerationClient, GenerationOptions,
    HttpGalleryBackend, Session,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,meme_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();
    let config = ClientConfig::from(&args);
    let backend = HttpGalleryBackend::new(&config.server)?;

    match args.action {
        Action::Generate {
            prompt,
            captions,
            font,
            out_dir,
            seed,
        } => {
            let font: FontFamily = font.parse()?;
            let endpoint = config.resolve_endpoint().await;
            tracing::info!("Generation endpoint: {}", endpoint);
            let generator = GenerationClient::new(&endpoint)?.with_options(GenerationOptions {
                seed,
                ..GenerationOptions::default()
            });
            run_generate(Session::new(generator, backend), &prompt, &captions, font, &out_dir)
                .await
        }
        Action::Gallery {
            command: GalleryAction::List,
        } => list_gallery(backend).await,
        Action::Gallery {
            command: GalleryAction::Delete { id },
        } => {
            backend
                .delete(&id)
                .await
                .with_context(|| format!("failed to delete {id}"))?;
            println!("Deleted {id}");
            Ok(())
        }
        Action::Config => {
            println!("{}", config.resolve_endpoint().await);
            Ok(())
        }
    }
}

async fn run_generate(
    mut session: Session<GenerationClient, HttpGalleryBackend>,
    prompt: &str,
    captions: &[String],
    font: FontFamily,
    out_dir: &Path,
) -> anyhow::Result<()> {
    eprintln!("Generating...");
    session.generate(prompt).await?;

    let (width, height) = (session.composition().width(), session.composition().height());
    for command in caption_commands(captions, font, width, height) {
        session.dispatch(command)?;
    }
    for event in session.drain_events() {
        tracing::debug!(?event, "Surface event");
    }

    let outcome = session.export(out_dir).await?;
    println!("{}", outcome.path.display());
    match outcome.gallery {
        Ok(item) => eprintln!("Saved to gallery as {}", item.id),
        Err(e) => eprintln!("Exported, but not saved to gallery: {e}"),
    }
    Ok(())
}

async fn list_gallery(backend: HttpGalleryBackend) -> anyhow::Result<()> {
    let base = backend.base().clone();
    let mut store = GalleryStore::new(backend);
    let count = store
        .fetch_all()
        .await
        .with_context(|| format!("failed to load gallery from {base}"))?
        .len();

    if count == 0 {
        println!("No memes yet");
        return Ok(());
    }
    for item in store.items() {
        let place = layout(item);
        let image = store
            .backend()
            .image_url(item)
            .map_or_else(|| "(inline)".to_string(), String::from);
        println!(
            "{}  x={:>5.1}% y={:>5.1}% rot={:>5.1}°  {}  {}",
            item.id, place.x_percent, place.y_percent, place.rotation_degrees, image, item.prompt
        );
    }
    Ok(())
}
