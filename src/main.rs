//! ChronoMap - Entry Point
//!
//! Terminal driver for the temporal map core. It sets up the async runtime,
//! wires the cache and generator into the temporal controller, and reads
//! commands from stdin.

use chronomap::cache::{DirectoryStore, JsonSnapshotCache, MemoryStore, SnapshotCache};
use chronomap::core::calendar::format_year;
use chronomap::core::config::ChronoConfig;
use chronomap::core::error::Result;
use chronomap::core::types::{Locale, Vec2};
use chronomap::llm::generator::{LlmSnapshotGenerator, SnapshotGenerator};
use chronomap::render::scene::MapScene;
use chronomap::render::viewport::{ViewportController, ViewportTransform};
use chronomap::simulation::layout::LayoutSeed;
use chronomap::simulation::runner::LayoutRunner;
use chronomap::snapshot::model::Snapshot;
use chronomap::spatial::projection::GeoProjector;
use chronomap::spatial::route::InteractionRouter;
use chronomap::temporal::controller::{TemporalController, TemporalSettings};
use chronomap::temporal::state::{Phase, TemporalView, Token};

use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

/// ChronoMap - explore world history year by year
#[derive(Parser, Debug)]
#[command(name = "chronomap")]
#[command(about = "Temporal world-history map: year resolution, map geometry and relationship layout")]
struct Args {
    /// Year to open on (negative for BC)
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    year: i64,

    /// Map viewport width in pixels
    #[arg(long, default_value_t = 960.0)]
    width: f64,

    /// Map viewport height in pixels
    #[arg(long, default_value_t = 600.0)]
    height: f64,

    /// Relationship canvas width
    #[arg(long, default_value_t = 320.0)]
    graph_width: f64,

    /// Relationship canvas height
    #[arg(long, default_value_t = 240.0)]
    graph_height: f64,

    /// Persist snapshots as JSON files in this directory (in-memory otherwise)
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// TOML config file
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Generator language: en or zh
    #[arg(long, default_value = "en")]
    locale: String,

    /// Never call the generator; serve cache and built-in data only
    #[arg(long)]
    offline: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chronomap=info")),
        )
        .init();

    tracing::info!("ChronoMap starting...");

    let config = match &args.config {
        Some(path) => ChronoConfig::load(path)?,
        None => ChronoConfig::default(),
    };

    let rt = Runtime::new()?;
    let _guard = rt.enter();

    let cache: Arc<dyn SnapshotCache> = match &args.cache_dir {
        Some(dir) => {
            tracing::info!("Caching snapshots in {}", dir.display());
            Arc::new(JsonSnapshotCache::with_prefix(
                DirectoryStore::open(dir)?,
                config.cache_prefix.clone(),
            ))
        }
        None => Arc::new(JsonSnapshotCache::with_prefix(
            MemoryStore::new(),
            config.cache_prefix.clone(),
        )),
    };

    let generator: Option<Arc<dyn SnapshotGenerator>> = if args.offline {
        None
    } else {
        match LlmSnapshotGenerator::from_env() {
            Ok(generator) => Some(Arc::new(generator)),
            Err(e) => {
                tracing::warn!("{} - running on cache and built-in data only", e);
                None
            }
        }
    };

    let locale = Locale::from_code(&args.locale).unwrap_or_else(|| {
        tracing::warn!("Unknown locale {:?}, using English", args.locale);
        Locale::English
    });

    let controller = TemporalController::with_locale(
        TemporalSettings::from_config(&config),
        cache,
        generator,
        locale,
    );
    let projector = GeoProjector::new(config.projector_config(args.width, args.height));
    let router = InteractionRouter::new(config.arc_curvature);
    let mut viewport = ViewportController::new(args.width, args.height, config.viewport_limits());
    let runner = LayoutRunner::new(config.force_config(), config.layout_frame_interval());

    spawn_view_reporter(&controller, &runner, args.graph_width, args.graph_height);

    // Display welcome message
    println!("\n=== CHRONOMAP ===");
    println!("World history, one year at a time");
    println!();
    println!("Commands:");
    println!("  year <n> / y <n>   - Jump to a year (negative for BC)");
    println!("  next / n, prev / p - Step {} years", config.manual_step);
    println!("  play / pause       - Auto-advance {} years every {} ms", config.autoplay_step, config.autoplay_interval_ms);
    println!("  refresh / r        - Regenerate the current year");
    println!("  lang <en|zh>       - Switch generator language");
    println!("  select <name>      - Select a civilization; `clear` to deselect");
    println!("  click <x> <y>      - Select whatever is drawn at a screen point");
    println!("  zoom <in|out|f>    - Zoom about the center; `pan <dx> <dy>`; `reset`");
    if controller.has_generator() {
        println!("  search <text>      - Find the year an event refers to");
    }
    println!("  show / s           - Show the current scene");
    println!("  quit / q           - Exit");
    println!();

    controller.request_year(args.year);

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        let (command, rest) = match input.split_once(' ') {
            Some((command, rest)) => (command, rest.trim()),
            None => (input, ""),
        };

        match command {
            "quit" | "q" => break,
            "year" | "y" => match rest.parse::<i64>() {
                Ok(year) => {
                    let ticket = controller.request_year(year);
                    println!("Requested {}", format_year(ticket.year));
                }
                Err(_) => println!("Usage: year <number>"),
            },
            "next" | "n" => {
                let ticket = controller.next();
                println!("Requested {}", format_year(ticket.year));
            }
            "prev" | "p" => {
                let ticket = controller.previous();
                println!("Requested {}", format_year(ticket.year));
            }
            "play" => {
                controller.set_autoplay(true);
                println!("Auto-advance on");
            }
            "pause" => {
                controller.set_autoplay(false);
                println!("Auto-advance off");
            }
            "refresh" | "r" => {
                let ticket = controller.refresh();
                println!("Refreshing {}", format_year(ticket.year));
            }
            "lang" => match Locale::from_code(rest) {
                Some(locale) => match controller.set_locale(locale) {
                    Some(ticket) => println!("Language {}; reloading {}", locale.code(), format_year(ticket.year)),
                    None => println!("Language already {}", locale.code()),
                },
                None => println!("Usage: lang <en|zh>"),
            },
            "select" => match controller.select_civilization(rest) {
                Ok(()) => println!("Selected {}", rest),
                Err(e) => println!("{}", e),
            },
            "clear" => controller.clear_selection(),
            "click" => {
                let coords: Vec<f64> = rest.split_whitespace().filter_map(|s| s.parse().ok()).collect();
                let [x, y] = coords[..] else {
                    println!("Usage: click <x> <y>");
                    continue;
                };
                click(&controller, &projector, &router, viewport.transform(), Vec2::new(x, y));
            }
            "zoom" => {
                let t = match rest {
                    "in" => viewport.zoom_in(),
                    "out" => viewport.zoom_out(),
                    other => match other.parse::<f64>() {
                        Ok(factor) => viewport.zoom_by(factor),
                        Err(_) => {
                            println!("Usage: zoom <in|out|factor>");
                            continue;
                        }
                    },
                };
                println!("View: {}", t.to_svg());
            }
            "pan" => {
                let deltas: Vec<f64> = rest.split_whitespace().filter_map(|s| s.parse().ok()).collect();
                let [dx, dy] = deltas[..] else {
                    println!("Usage: pan <dx> <dy>");
                    continue;
                };
                println!("View: {}", viewport.pan_by(dx, dy).to_svg());
            }
            "reset" => println!("View: {}", viewport.reset().to_svg()),
            "search" => {
                if rest.is_empty() {
                    println!("Usage: search <text>");
                    continue;
                }
                match rt.block_on(controller.search(rest)) {
                    Ok(ticket) => println!("Found {}", format_year(ticket.year)),
                    Err(e) => println!("Search failed: {}", e),
                }
            }
            "show" | "s" => display_scene(&controller.view(), &projector, &router, &runner),
            _ => println!("Unknown command. Try: year <n>, next, prev, play, show, quit"),
        }
    }

    controller.shutdown();
    runner.stop();
    println!("\nGoodbye! Last year viewed: {}.", format_year(controller.year()));
    Ok(())
}

/// Print each newly resolved or failed year and lay out its graph
fn spawn_view_reporter(controller: &TemporalController, runner: &LayoutRunner, width: f64, height: f64) {
    let mut rx = controller.subscribe();
    let runner = runner.clone();
    tokio::spawn(async move {
        let mut reported: Option<Token> = None;
        while rx.changed().await.is_ok() {
            let view = rx.borrow_and_update().clone();
            match &view.phase {
                Phase::Resolved { year, snapshot } if reported != Some(view.token) => {
                    reported = Some(view.token);
                    println!("\n[{}] {}", format_year(*year), snapshot.summary);
                    runner.start(&snapshot.relationships, width, height, LayoutSeed::Phyllotaxis);
                }
                Phase::Failed { year, reason } if reported != Some(view.token) => {
                    reported = Some(view.token);
                    println!("\n[{}] {}", format_year(*year), reason);
                }
                _ => {}
            }
        }
    });
}

fn click(
    controller: &TemporalController,
    projector: &GeoProjector,
    router: &InteractionRouter,
    transform: ViewportTransform,
    screen: Vec2,
) {
    let Some(snapshot) = controller.view().displayed else {
        println!("Nothing on the map yet");
        return;
    };
    let scene = MapScene::build(&snapshot, projector, router);
    match scene.hit_test(screen, &transform) {
        Some(glyph) => match controller.select_civilization(&glyph.name) {
            Ok(()) => println!("Selected {}", glyph.name),
            Err(e) => println!("{}", e),
        },
        None => {
            controller.clear_selection();
            println!("Selection cleared");
        }
    }
}

/// Display the displayed snapshot as drawables
fn display_scene(view: &TemporalView, projector: &GeoProjector, router: &InteractionRouter, runner: &LayoutRunner) {
    println!();
    let status = match &view.phase {
        Phase::Idle => "idle".to_string(),
        Phase::PendingDebounce { .. } => "waiting".to_string(),
        Phase::Resolving { .. } => "loading".to_string(),
        Phase::Resolved { .. } => "ready".to_string(),
        Phase::Failed { reason, .. } => format!("error: {}", reason),
    };
    println!(
        "--- {} | {} | {}{} ---",
        format_year(view.year),
        status,
        view.locale.code(),
        if view.autoplay { " | playing" } else { "" }
    );

    let Some(snapshot) = &view.displayed else {
        println!("  (no snapshot displayed)");
        return;
    };
    if snapshot.year != view.year {
        println!("  Showing {} while {} loads", format_year(snapshot.year), format_year(view.year));
    }

    let scene = MapScene::build(snapshot, projector, router);
    for glyph in &scene.glyphs {
        let marker = if view.selected.as_deref() == Some(glyph.name.as_str()) { "*" } else { " " };
        println!(
            " {} {} at ({:.0}, {:.0}) r={:.0}",
            marker, glyph.name, glyph.center.x, glyph.center.y, glyph.radius
        );
    }
    for route in &scene.routes {
        println!(
            "  {} [{}] {:.0} km  {}",
            route.title,
            route.kind.as_str(),
            route.distance_km,
            route.path.svg_path()
        );
    }

    if let Some(name) = &view.selected {
        display_civilization(snapshot, name);
    }

    if let Some(published) = runner.latest() {
        println!(
            "  Relationships (tick {}, alpha {:.3}):",
            published.frame.iteration, published.frame.alpha
        );
        for (id, pos) in published.layout.ids().iter().zip(&published.frame.positions) {
            println!("    {} ({:.0}, {:.0})", id, pos.x, pos.y);
        }
    }
}

fn display_civilization(snapshot: &Snapshot, name: &str) {
    let Some(civ) = snapshot.civilization(name) else {
        return;
    };
    println!();
    println!("  {}", civ.name);
    if !civ.overview.is_empty() {
        println!("    {}", civ.overview);
    }
    if !civ.government.kind.is_empty() {
        println!("    Government: {}", civ.government.kind);
    }
    if !civ.government.leaders.is_empty() {
        println!("    Leaders: {}", civ.government.leaders.join(", "));
    }
    if !civ.society.population.is_empty() {
        println!("    Population: {}", civ.society.population);
    }
    for person in &civ.figures {
        println!("    {} - {} ({})", person.name, person.role, person.lifespan);
    }
}
