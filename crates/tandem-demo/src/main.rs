//! Headless two-peer session.
//!
//! Builds a small cooperative level for each player, links the two game
//! controllers over an in-memory transport and plays a fixed script: player
//! one sends a gem through a portal, pulls the shared lever that opens both
//! doors, and player two picks the gem up and walks to the goal.
//!
//! ```text
//! tandem-demo [config.json]
//! ```
//!
//! The optional config file holds a JSON object with `controller` and `sync`
//! sections; missing fields keep their defaults. Set `RUST_LOG` to change the
//! log filter (default `info`).

use std::fs;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::EnvFilter;

use tandem_core::content::registry::ContentRegistry;
use tandem_core::content::{ItemKind, PlayerSlot, TileContent};
use tandem_core::position::{Direction, Position};
use tandem_core::{ControllerConfig, GameController, Interaction, Map, Outcome};
use tandem_sync::{MemoryTransport, PeerNode, SyncConfig};

const WIDTH: u32 = 6;
const HEIGHT: u32 = 3;

const ONE_START: Position = Position::new(0, 1);
const TWO_START: Position = Position::new(2, 1);
const LEVER: Position = Position::new(1, 1);
const DOOR: Position = Position::new(4, 1);
const GOAL: Position = Position::new(5, 1);
const EXIT_PAD: Position = Position::new(3, 1);

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
struct DemoConfig {
    controller: ControllerConfig,
    sync: SyncConfig,
}

impl DemoConfig {
    fn load(path: Option<String>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(&path).with_context(|| format!("reading config {path}"))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {path}"))
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let config = DemoConfig::load(std::env::args().nth(1))?;
    info!(?config, "starting session");

    let registry = ContentRegistry::standard();
    let (first, second) = MemoryTransport::pair();
    let one = PeerNode::spawn(
        "one",
        GameController::with_config(level_for(PlayerSlot::One, &registry)?, config.controller),
        first,
        config.sync,
    )?;
    let two = PeerNode::spawn(
        "two",
        GameController::with_config(level_for(PlayerSlot::Two, &registry)?, config.controller),
        second,
        config.sync,
    )?;

    let result = play(&one, &two, config.sync.create_timeout());

    one.shutdown();
    two.shutdown();
    one.join();
    two.join();
    result
}

/// Both halves share the corridor, the lever and a sealed door. Player one
/// starts on a portal holding a gem; player two waits next to the exit pad.
fn level_for(viewer: PlayerSlot, registry: &ContentRegistry) -> Result<Map> {
    let cells = (WIDTH * HEIGHT) as usize;
    let index = |p: Position| (p.y as usize) * WIDTH as usize + p.x as usize;

    let ground = vec![ContentRegistry::GROUND; cells];
    let mut structure = vec![ContentRegistry::EMPTY; cells];
    for x in 0..WIDTH as i32 {
        structure[index(Position::new(x, 0))] = ContentRegistry::WALL;
        structure[index(Position::new(x, HEIGHT as i32 - 1))] = ContentRegistry::WALL;
    }
    structure[index(DOOR)] = ContentRegistry::SEALED_DOOR;
    structure[index(GOAL)] = ContentRegistry::GOAL;

    let mut map = Map::from_layers(WIDTH, HEIGHT, viewer, &[ground, structure], registry)?;
    map.place(LEVER, TileContent::trigger(DOOR))?;
    match viewer {
        PlayerSlot::One => {
            map.place(ONE_START, TileContent::portal(viewer, EXIT_PAD))?;
            map.place(ONE_START, TileContent::player(viewer))?;
            map.set_inventory(Some(ItemKind::Gem));
        }
        PlayerSlot::Two => {
            map.place(EXIT_PAD, TileContent::portal(viewer, ONE_START))?;
            map.place(TWO_START, TileContent::player(viewer))?;
        }
    }
    Ok(map)
}

fn play(one: &PeerNode, two: &PeerNode, patience: Duration) -> Result<()> {
    let one_id = one.lock()?.id();
    let two_id = two.lock()?.id();

    let script = [
        ("one", Interaction::use_at(ONE_START, Direction::East, one_id)),
        ("one", Interaction::use_at(ONE_START, Direction::East, one_id)),
        ("two", Interaction::step(TWO_START, Direction::East, two_id)),
        ("two", Interaction::use_at(EXIT_PAD, Direction::East, two_id)),
        ("two", Interaction::step(EXIT_PAD, Direction::East, two_id)),
        ("two", Interaction::step(DOOR, Direction::East, two_id)),
    ];

    for (turn, (peer, interaction)) in script.into_iter().enumerate() {
        let actor = if peer == "one" { one } else { two };
        info!(turn, peer, %interaction, "acting");
        match actor.trigger_action(interaction)? {
            Outcome::Committed {
                handler,
                updates,
                transaction,
            } => info!(turn, ?handler, updates, shared = transaction.is_some(), "committed"),
            other => bail!("turn {turn} by {peer} failed: {other:?}"),
        }
        settle(one, two, patience)?;
        report_effects("one", one)?;
        report_effects("two", two)?;
    }

    let done = two.lock()?.live_map().level_complete();
    if !done {
        bail!("player two never reached the goal");
    }
    info!("level complete");
    Ok(())
}

/// Waits until neither peer has a chain open, then applies both queues.
fn settle(one: &PeerNode, two: &PeerNode, patience: Duration) -> Result<()> {
    let deadline = Instant::now() + patience;
    while one.lock()?.chain_depth() > 0 || two.lock()?.chain_depth() > 0 {
        if Instant::now() >= deadline {
            bail!("peers did not settle within {patience:?}");
        }
        thread::sleep(Duration::from_millis(5));
    }
    let applied = (one.apply_pending()?, two.apply_pending()?);
    info!(one = applied.0, two = applied.1, "applied pending updates");
    Ok(())
}

fn report_effects(peer: &str, node: &PeerNode) -> Result<()> {
    let mut controller = node.lock()?;
    for effect in controller.live_map_mut().drain_effects() {
        info!(peer, position = %effect.position, effect = ?effect.effect, "effect");
    }
    Ok(())
}
