use anchorite_config::Config;
use anchorite_engine::{
    Document, FailureNotifier, LocationDescriptor, NullViewport, RelocateOutcome, RelocateRequest,
    Relocator, SharedDocument, capture, match_by_context,
};
use anyhow::{Context, Result};
use std::sync::{Arc, Mutex};
use std::{
    env, fs,
    path::{Path, PathBuf},
    process,
};
use tracing_subscriber::EnvFilter;

/// Failure notice for terminal use; the engine decides when it fires.
struct PrintNotifier;

impl FailureNotifier for PrintNotifier {
    fn notify_failure(&self, page_kind: Option<&str>) {
        match page_kind {
            Some(kind) => eprintln!("Could not find the saved location on this {kind} page"),
            None => eprintln!("Could not find the saved location on this page"),
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("capture") => run_capture(&args),
        Some("relocate") => run_relocate(&args),
        _ => {
            print_usage(&args[0]);
            process::exit(1);
        }
    }
}

fn print_usage(program: &str) {
    eprintln!("Usage: {program} <command>");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  capture <page.html> <text> [out.json]");
    eprintln!("      Capture a relocation descriptor for the first occurrence of <text>.");
    eprintln!("      Written to [out.json], else appended to the configured library.");
    eprintln!("  relocate <page.html> <descriptor.json> [out.html]");
    eprintln!("      Relocate a saved descriptor against the page and print the outcome");
    eprintln!("      as JSON. With [out.html], also write the highlighted page.");
    eprintln!();
    eprintln!("Config file: {}", Config::config_path().display());
}

fn run_capture(args: &[String]) -> Result<()> {
    if !(4..=5).contains(&args.len()) {
        print_usage(&args[0]);
        process::exit(1);
    }
    let page_path = PathBuf::from(&args[2]);
    let text = &args[3];
    let out = args.get(4).map(PathBuf::from);

    let config = load_config();
    let tuning = config
        .as_ref()
        .map(|c| c.tuning.clone())
        .unwrap_or_default();

    let html = fs::read_to_string(&page_path)
        .with_context(|| format!("failed to read page {}", page_path.display()))?;
    let doc = Document::parse_html(&html);

    // An empty context pair makes the matcher a plain first-occurrence search.
    let found = match_by_context(&doc, "", text, "", &tuning);
    let Some(span) = found.span else {
        eprintln!("Error: '{text}' does not occur in {}", page_path.display());
        process::exit(1);
    };
    let Some(descriptor) = capture(&doc, span, &tuning) else {
        eprintln!("Error: selection is empty after trimming");
        process::exit(1);
    };

    println!("{}", serde_json::to_string_pretty(&descriptor)?);

    if let Some(out) = out {
        fs::write(&out, serde_json::to_string_pretty(&descriptor)?)
            .with_context(|| format!("failed to write descriptor {}", out.display()))?;
        tracing::info!(path = %out.display(), "descriptor written");
    } else if let Some(library) = config.map(|c| c.library_path) {
        append_to_library(&library, &descriptor)?;
        tracing::info!(path = %library.display(), "descriptor appended to library");
    }
    Ok(())
}

fn run_relocate(args: &[String]) -> Result<()> {
    if !(4..=5).contains(&args.len()) {
        print_usage(&args[0]);
        process::exit(1);
    }
    let page_path = PathBuf::from(&args[2]);
    let descriptor_path = PathBuf::from(&args[3]);
    let out = args.get(4).map(PathBuf::from);

    let tuning = load_config().map(|c| c.tuning).unwrap_or_default();

    let html = fs::read_to_string(&page_path)
        .with_context(|| format!("failed to read page {}", page_path.display()))?;
    let raw = fs::read_to_string(&descriptor_path)
        .with_context(|| format!("failed to read descriptor {}", descriptor_path.display()))?;
    let descriptor: LocationDescriptor = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse descriptor {}", descriptor_path.display()))?;

    let doc: SharedDocument = Arc::new(Mutex::new(Document::parse_html(&html)));
    let relocator = Relocator::new(Arc::clone(&doc), NullViewport, PrintNotifier, tuning);
    let request = RelocateRequest {
        descriptor,
        primary_context: true,
        page_kind: None,
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    let response = match runtime.block_on(relocator.relocate(request)) {
        RelocateOutcome::Completed(response) => response,
        // One request at a time here, nothing can supersede it.
        RelocateOutcome::Superseded => return Ok(()),
    };

    println!("{}", serde_json::to_string(&response)?);

    if response.success {
        if let Some(out) = out {
            let highlighted = doc
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .to_html();
            fs::write(&out, highlighted)
                .with_context(|| format!("failed to write page {}", out.display()))?;
            tracing::info!(path = %out.display(), "highlighted page written");
        }
    } else {
        process::exit(1);
    }
    Ok(())
}

fn load_config() -> Option<Config> {
    match Config::load() {
        Ok(found) => found,
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            process::exit(1);
        }
    }
}

/// Appends `descriptor` to the JSON array stored at `library`, creating the
/// file and its parent directories on first use.
fn append_to_library(library: &Path, descriptor: &LocationDescriptor) -> Result<()> {
    let mut entries: Vec<LocationDescriptor> = if library.exists() {
        let raw = fs::read_to_string(library)
            .with_context(|| format!("failed to read library {}", library.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse library {}", library.display()))?
    } else {
        Vec::new()
    };
    entries.push(descriptor.clone());

    if let Some(parent) = library.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(library, serde_json::to_string_pretty(&entries)?)
        .with_context(|| format!("failed to write library {}", library.display()))?;
    Ok(())
}
