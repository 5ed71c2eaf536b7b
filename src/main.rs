mod command_line;
mod config;
mod error;
mod executor;
mod index;
mod model;
mod registry;
mod state;
mod ui;

use anyhow::{Context, Result};
use calloop::EventLoop;
use calloop_wayland_source::WaylandSource;
use smithay_client_toolkit::{
    shell::wlr_layer::{Layer, KeyboardInteractivity, Anchor},
    shell::WaylandSurface,
};
use wayland_client::{Connection, globals::registry_queue_init};
use crate::config::load_config;
use crate::index::ApplicationIndex;
use crate::model::ApplicationEntry;
use crate::registry::desktop::DesktopRegistry;
use crate::state::AppState;
use crate::ui::wayland::WaylandApp;
use crate::ui::render::Renderer;
use crate::ui::icons::IconCache;
use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file to use instead of the default location
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print matching applications as JSON lines instead of opening the launcher
    #[arg(long, value_name = "QUERY", num_args = 0..=1, default_missing_value = "")]
    list: Option<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    // 1. Load Config
    let config = load_config(args.config.as_deref())?;

    // 2. Build the application index
    let registry = DesktopRegistry::from_env(&config.registry);
    log::debug!("Application dirs: {:?}", registry.application_dirs());
    let index = ApplicationIndex::new(registry);
    if index.is_empty() {
        log::warn!("No applications found");
    }

    if let Some(query) = args.list {
        return print_entries(&index, &query);
    }

    // 3. Setup Wayland Connection & Event Loop
    let mut event_loop: EventLoop<WaylandApp> = EventLoop::try_new()?;
    let conn = Connection::connect_to_env().context("failed to connect to the Wayland compositor")?;
    let (globals, event_queue) = registry_queue_init::<WaylandApp>(&conn)?;
    let qh = event_queue.handle();

    // 4. Init State & UI
    let (tx_icons, rx_icons) = calloop::channel::channel::<(String, Option<tiny_skia::Pixmap>)>();
    let renderer = Renderer::new(IconCache::new(tx_icons));
    let app_state = AppState::new(config.clone(), index);
    let mut app = WaylandApp::new(&globals, &qh, app_state, renderer)?;

    // 5. Create Layer Surface
    let surface = app.compositor_state.create_surface(&qh);
    let layer_surface = app.layer_shell_state.create_layer_surface(
        &qh,
        surface,
        Layer::Overlay,
        Some("launcher"),
        None,
    );

    layer_surface.set_anchor(Anchor::empty());
    layer_surface.set_size(config.theme.width, config.theme.height);
    layer_surface.set_keyboard_interactivity(KeyboardInteractivity::Exclusive);
    layer_surface.commit();
    app.layer_surface = Some(layer_surface);

    // Icon update handler
    let conn_icons = conn.clone();
    let qh_icons = qh.clone();
    event_loop
        .handle()
        .insert_source(rx_icons, move |event, _, app: &mut WaylandApp| {
            if let calloop::channel::Event::Msg((name, pixmap)) = event {
                app.renderer.insert_icon(name, pixmap);
                app.draw(&conn_icons, &qh_icons);
            }
        })
        .map_err(|err| anyhow::anyhow!("failed to register icon channel: {}", err))?;

    WaylandSource::new(conn.clone(), event_queue)
        .insert(event_loop.handle())
        .map_err(|err| anyhow::anyhow!("failed to register Wayland source: {}", err))?;

    // 6. Run Loop
    while !app.should_exit {
        event_loop.dispatch(None, &mut app)?;
    }

    Ok(())
}

fn print_entries(index: &ApplicationIndex, query: &str) -> Result<()> {
    let stdout = io::stdout();
    write_entries(&mut stdout.lock(), index, query)?;
    Ok(())
}

/// One JSON object per line. A closed pipe (`--list | head`) ends the output quietly.
fn write_entries<W: Write>(out: &mut W, index: &ApplicationIndex, query: &str) -> io::Result<()> {
    let entries: Vec<&ApplicationEntry> = if query.is_empty() {
        index.all_entries().iter().collect()
    } else {
        index.filter(query)
    };

    for entry in entries {
        let item = serde_json::json!({
            "name": entry.display_name,
            "icon": entry.icon_identifier,
            "id": entry.id(),
            "exec": entry.handle.as_ref().and_then(|info| info.exec.as_deref()),
        });
        match writeln!(out, "{}", item) {
            Err(err) if err.kind() == io::ErrorKind::BrokenPipe => return Ok(()),
            result => result?,
        }
    }

    match out.flush() {
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        result => result,
    }
}
