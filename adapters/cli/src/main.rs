#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs the Monster Defence simulation headlessly.

mod config;

use std::{collections::HashMap, io, path::PathBuf};

use anyhow::{bail, Context, Result as AnyResult};
use clap::Parser;
use monster_defence_core::{
    DrawableHandle, Event, GridDimensions, PixelPosition, TileIndex, TileKind, TowerKind,
};
use monster_defence_rendering::{
    cell_center, pixel_at, render_text, FrameInput, HeadlessBackend, HeadlessScene,
    RenderingBackend,
};
use monster_defence_system_input::{InputRouter, PointerTarget, TowerPicker};
use monster_defence_system_scheduler::TickScheduler;
use monster_defence_world::{self as world, query, World};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::GameConfig;

#[derive(Parser, Debug)]
#[command(name = "monster-defence")]
#[command(about = "Runs a headless Monster Defence session")]
struct Args {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of tile columns, overriding the config file
    #[arg(long)]
    columns: Option<u32>,

    /// Number of tile rows, overriding the config file
    #[arg(long)]
    rows: Option<u32>,

    /// Tile edge length in pixels, overriding the config file
    #[arg(long)]
    tile_size: Option<u32>,

    /// Number of frames to simulate
    #[arg(long, default_value_t = 100)]
    frames: u64,

    /// Tower to place before the first tick, as `<kind>@<tile>`
    #[arg(long = "place", value_name = "KIND@TILE", value_parser = parse_placement)]
    placements: Vec<Placement>,

    /// Prints the final frame as text
    #[arg(long)]
    print_frame: bool,
}

/// Tower placement requested on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Placement {
    kind: TowerKind,
    tile: TileIndex,
}

fn parse_placement(value: &str) -> Result<Placement, String> {
    let (kind, tile) = value
        .split_once('@')
        .ok_or_else(|| format!("expected `<kind>@<tile>`, got `{value}`"))?;
    let kind = kind.parse::<TowerKind>().map_err(|error| error.to_string())?;
    let tile = tile
        .trim()
        .parse::<u32>()
        .map_err(|error| format!("invalid tile index `{tile}`: {error}"))?;

    Ok(Placement {
        kind,
        tile: TileIndex::new(tile),
    })
}

/// Event counters reported once the run finishes.
#[derive(Debug, Default)]
struct RunTally {
    placed: usize,
    rejected: usize,
    spawned: usize,
    despawned: usize,
}

impl RunTally {
    fn record(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::TowerPlaced { .. } => self.placed += 1,
                Event::TowerPlacementRejected { tile, reason } => {
                    self.rejected += 1;
                    warn!(tile = tile.get(), %reason, "placement rejected");
                }
                Event::ProjectileSpawned { .. } => self.spawned += 1,
                Event::ProjectileDespawned { .. } => self.despawned += 1,
                Event::TickAdvanced { .. }
                | Event::TowerSelected { .. }
                | Event::SelectionDiscarded { .. }
                | Event::ProjectileAdvanced { .. } => {}
            }
        }
    }
}

/// Everything a frame touches: routing, scheduling and the world itself.
#[derive(Debug)]
struct Session {
    world: World,
    router: InputRouter,
    scheduler: TickScheduler,
    tally: RunTally,
    events: Vec<Event>,
}

impl Session {
    fn new(world: World, router: InputRouter) -> Self {
        Self {
            world,
            router,
            scheduler: TickScheduler::new(),
            tally: RunTally::default(),
            events: Vec::new(),
        }
    }

    /// Routes the frame's pointer-downs, then ticks once.
    fn update(&mut self, input: FrameInput, scene: &mut HeadlessScene) {
        let pointer_downs: Vec<PixelPosition> =
            input.pointer_downs.into_iter().map(pixel_at).collect();
        let mut commands = Vec::new();
        self.router.handle(&pointer_downs, &mut commands);
        self.scheduler.handle(input.frame, &mut commands);

        for command in commands {
            world::apply(&mut self.world, command, scene, &mut self.events);
        }
        self.tally.record(&self.events);
        self.events.clear();
    }
}

/// Entry point for the Monster Defence command-line interface.
fn main() -> AnyResult<()> {
    init_tracing();

    let args = Args::parse();
    let mut config = GameConfig::load(args.config.as_deref())?;
    if let Some(columns) = args.columns {
        config.map_columns = columns;
    }
    if let Some(rows) = args.rows {
        config.map_rows = rows;
    }
    if let Some(tile_size) = args.tile_size {
        config.tile_size = tile_size;
    }
    let settings = config.validate().context("invalid game configuration")?;
    let dimensions = settings.rules.dimensions();

    let mut scene = HeadlessScene::new();
    let world = World::new(settings.rules, TileKind::Background, &mut scene);
    let mut picker = TowerPicker::new(settings.picker, dimensions.cell_size());
    picker.install(&mut scene);
    let picker_icons = picker.icons().to_vec();
    let router = InputRouter::new(picker, dimensions);

    println!("{}", query::welcome_banner(&world));

    let backend = script_placements(&router, dimensions, &args.placements, args.frames)?;
    let mut session = Session::new(world, router);

    let summary = backend.run(&mut scene, |input, scene| {
        session.update(input, scene);
        Ok(())
    })?;

    let tally = &session.tally;
    info!(
        frames = summary.frames_run,
        presented = summary.frames_presented,
        tick = query::tick(&session.world),
        towers_placed = tally.placed,
        placements_rejected = tally.rejected,
        projectiles_spawned = tally.spawned,
        projectiles_despawned = tally.despawned,
        projectiles_live = query::projectiles(&session.world).len(),
        scene_drawables = scene.drawable_count(),
        "run finished"
    );

    if args.print_frame {
        let glyphs = glyph_table(&session.world, &picker_icons);
        let frame = render_text(&scene, dimensions, |handle, _| glyphs.get(&handle).copied());
        println!("{frame}");
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .compact()
        .init();
}

/// Turns `--place` requests into picker and tile clicks delivered on the
/// first frame, before its tick.
fn script_placements(
    router: &InputRouter,
    dimensions: GridDimensions,
    placements: &[Placement],
    frames: u64,
) -> AnyResult<HeadlessBackend> {
    let picker = router.picker();
    let cell = dimensions.cell_size();
    let mut backend = HeadlessBackend::new(frames);

    for placement in placements {
        let Some(slot) = picker.slot_for(placement.kind) else {
            bail!("the tower picker does not offer {} towers", placement.kind);
        };
        let Some(icon) = picker.icon_position(slot) else {
            bail!("picker slot {} has no icon", slot.get());
        };
        let Some(tile) = dimensions.position_of(placement.tile) else {
            bail!(
                "tile {} lies outside the {}x{} field",
                placement.tile,
                dimensions.columns(),
                dimensions.rows()
            );
        };

        let tile_click = cell_center(tile, cell);
        if let Some(PointerTarget::Picker(covering)) = router.resolve(pixel_at(tile_click)) {
            warn!(
                tile = placement.tile.get(),
                slot = covering.get(),
                "tile is covered by a picker icon; the click selects a tower instead"
            );
        }

        backend = backend
            .with_pointer_down(0, cell_center(icon, cell))
            .with_pointer_down(0, tile_click);
    }

    Ok(backend)
}

fn glyph_table(world: &World, picker_icons: &[DrawableHandle]) -> HashMap<DrawableHandle, char> {
    let mut glyphs = HashMap::new();

    for tile in query::grid(world).tiles() {
        let _ = glyphs.insert(tile.drawable(), '.');
    }
    for kind in TowerKind::ALL {
        let glyph = match kind {
            TowerKind::Grass => 'G',
            TowerKind::Fire => 'F',
        };
        for tower in query::towers(world, kind) {
            let _ = glyphs.insert(tower.drawable(), glyph);
        }
    }
    for projectile in query::projectiles(world) {
        let _ = glyphs.insert(projectile.drawable(), '*');
    }
    for icon in picker_icons {
        let _ = glyphs.remove(icon);
    }

    glyphs
}
