//! Terminal Notes Browser
//!
//! Drives the full NoteHub core from a terminal: the initial view is
//! prefetched and handed over as dehydrated JSON (the same path a server
//! render takes), hydrated into a fresh cache, and then browsed through the
//! `BrowsingController` with line commands.
//!
//! # Usage
//!
//! ```bash
//! # Against the local dev server
//! NOTEHUB_BASE_URL=http://127.0.0.1:4000/api/ cargo run --bin notes-browse
//!
//! # Start filtered on a tag (route segment, "All" for no filter)
//! cargo run --bin notes-browse -- Work
//! ```
//!
//! Configuration comes from `NOTEHUB_*` variables, optionally via `.env`.

use anyhow::{anyhow, Context};
use notehub_core::{
    BrowsingController, DehydratedState, HttpNotesClient, HydrationBridge, NewNote, NoteTag,
    NotehubConfig, NotesApi, NotesView, QueryCache,
};
use std::env;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::StreamExt;

const HELP: &str = "\
Commands:
  search <text>                     type into the search box (debounced)
  tag <Todo|Work|Personal|Meeting|Shopping|All>
  page <n> | next | prev
  create <Tag> <title> | <content>
  delete <id>
  show | stats | help | quit";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = NotehubConfig::from_env().context("Invalid NOTEHUB_* configuration")?;
    let initial_tag = match env::args().nth(1) {
        Some(segment) => NoteTag::parse_filter(&segment)?,
        None => None,
    };

    let client_config = config.client_config().with_auth_failure_hook(|| {
        tracing::error!("NoteHub rejected the credential; check NOTEHUB_TOKEN");
    });
    let api: Arc<dyn NotesApi> = Arc::new(HttpNotesClient::new(client_config)?);

    // Server half: prefetch and serialize
    let payload = HydrationBridge::prefetch(api.as_ref(), config.page_size, initial_tag)
        .await
        .to_json()?;
    tracing::info!("Dehydrated state: {} bytes", payload.len());

    // Client half: decode, seed, mount
    let cache = QueryCache::new();
    let state = DehydratedState::from_json(&payload)?;
    HydrationBridge::hydrate(&cache, &state);

    let controller = BrowsingController::mount(
        cache.clone(),
        api,
        config.browse_settings(),
        initial_tag,
    );

    let renderer = {
        let mut views = Box::pin(controller.watch());
        tokio::spawn(async move {
            let mut last: Option<NotesView> = None;
            while let Some(view) = views.next().await {
                if last.as_ref() != Some(&view) {
                    render(&view);
                    last = Some(view);
                }
            }
        })
    };

    println!("{}", HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));

        let outcome = match command {
            "quit" | "exit" => break,
            "help" => {
                println!("{}", HELP);
                Ok(())
            }
            "show" => {
                render(&controller.view());
                Ok(())
            }
            "stats" => {
                let stats = cache.stats();
                println!(
                    "cache: {} entries, {} in flight, {} loads started",
                    stats.entries, stats.in_flight, stats.loads_started
                );
                Ok(())
            }
            "search" => {
                controller.set_search_input(rest);
                Ok(())
            }
            _ => run_command(&controller, command, rest.trim()).await,
        };

        if let Err(e) = outcome {
            eprintln!("error: {}", e);
        }
    }

    renderer.abort();
    controller.unmount();
    Ok(())
}

async fn run_command(
    controller: &BrowsingController,
    command: &str,
    args: &str,
) -> anyhow::Result<()> {
    match command {
        "tag" => {
            controller.set_tag(NoteTag::parse_filter(args)?);
        }
        "page" => {
            let page = args
                .parse::<u32>()
                .with_context(|| format!("'{}' is not a page number", args))?;
            controller.set_page(page)?;
        }
        "next" => {
            controller.set_page(controller.params().page() + 1)?;
        }
        "prev" => {
            let page = controller.params().page();
            controller.set_page(page.saturating_sub(1))?;
        }
        "create" => {
            let (tag, rest) = args
                .split_once(' ')
                .ok_or_else(|| anyhow!("usage: create <Tag> <title> | <content>"))?;
            let tag: NoteTag = tag.parse()?;
            let (title, content) = rest.split_once('|').unwrap_or((rest, ""));
            let note = controller
                .create_note(NewNote::new(title.trim(), content.trim(), tag))
                .await?;
            println!("created {} \"{}\"", note.id, note.title);
        }
        "delete" => {
            if args.is_empty() {
                return Err(anyhow!("usage: delete <id>"));
            }
            let note = controller.delete_note(args).await?;
            println!("deleted {} \"{}\"", note.id, note.title);
        }
        other => return Err(anyhow!("unknown command '{}', try 'help'", other)),
    }
    Ok(())
}

fn render(view: &NotesView) {
    let params = &view.params;
    println!(
        "\n[search={:?} tag={} page={}]",
        params.search(),
        params.tag().map(|t| t.as_str()).unwrap_or(NoteTag::ALL_SEGMENT),
        params.page()
    );

    if view.is_loading {
        println!("  loading...");
        return;
    }
    if view.is_error {
        match &view.error {
            Some(e) if e.is_auth() => println!("  not authorized: {}", e),
            Some(e) => println!("  failed to load notes: {}", e),
            None => println!("  failed to load notes"),
        }
        return;
    }
    if view.items.is_empty() {
        println!("  no notes found");
    }
    for note in &view.items {
        println!("  {:<10} {:<9} {}", note.id, note.tag.as_str(), note.title);
    }

    if let Some(pagination) = &view.pagination {
        let pages: Vec<String> = pagination
            .pages()
            .map(|page| {
                if page == pagination.current_page {
                    format!("[{}]", page)
                } else {
                    page.to_string()
                }
            })
            .collect();
        println!("  pages: {}", pages.join(" "));
    }
    if view.is_placeholder {
        println!("  (showing previous results while loading)");
    } else if let Some(e) = &view.error {
        println!("  (refresh failed: {})", e);
    }
}
