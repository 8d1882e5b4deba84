use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use glam::{Vec2, Vec3};
use rand::rngs::StdRng;
use rand::SeedableRng;

use ardice::{DiceApp, NodeId, PlaneSpec, SceneEngine, ScreenRect, SimEngine};

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse()?;

    let engine = Arc::new(SimEngine::new());
    stage_demo_planes(&engine);

    let rng = match options.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let handle: Arc<dyn SceneEngine> = engine.clone();
    let mut app = DiceApp::with_rng(handle, &options.asset, rng)
        .context("failed to set up the dice demo")?;

    let mode = app.start();
    println!("Session running ({mode:?})");

    let detected = engine.pump_events(&mut app);
    println!("Detected {detected} plane(s)");

    for tap in &options.taps {
        match app.handle_tap(*tap)? {
            Some(_) => println!("Tap ({:.0}, {:.0}) placed a die", tap.x, tap.y),
            None => println!("Tap ({:.0}, {:.0}) missed the detected planes", tap.x, tap.y),
        }
    }

    app.roll_all();
    print_scene(&engine, app.dice());

    if !options.keep {
        app.clear_all();
        print_scene(&engine, app.dice());
    }

    app.stop();
    Ok(())
}

/// Two table-sized surfaces splitting the view down the middle.
fn stage_demo_planes(engine: &SimEngine) {
    engine.stage_plane(PlaneSpec {
        world_position: Vec3::new(0.0, 0.0, -0.5),
        center: Vec2::ZERO,
        extent: Vec2::new(0.6, 0.4),
        screen: ScreenRect::new(Vec2::ZERO, Vec2::new(640.0, 360.0)),
    });
    engine.stage_plane(PlaneSpec {
        world_position: Vec3::new(0.8, 0.0, -0.9),
        center: Vec2::new(0.02, 0.05),
        extent: Vec2::new(0.35, 0.5),
        screen: ScreenRect::new(Vec2::new(640.0, 0.0), Vec2::new(1280.0, 360.0)),
    });
}

fn print_scene(engine: &SimEngine, dice: &[NodeId]) {
    println!("Placed dice: {}", dice.len());
    for die in dice {
        let name = engine.node_name(*die).unwrap_or_else(|| "?".into());
        if let Some(position) = engine.node_position(*die) {
            println!(
                " - {} pos=({:.3}, {:.3}, {:.3})",
                name, position.x, position.y, position.z
            );
        }
    }
}

struct CliOptions {
    asset: PathBuf,
    seed: Option<u64>,
    taps: Vec<Vec2>,
    keep: bool,
}

impl CliOptions {
    fn parse() -> Result<Self> {
        let mut args = env::args().skip(1);
        let Some(asset) = args.next() else {
            return Err(anyhow!(
                "Usage: ardice <die-asset.xml> [--seed N] [--taps x,y[;x,y...]] [--keep]"
            ));
        };
        let mut seed = None;
        let mut taps = default_taps();
        let mut keep = false;
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--seed" => {
                    let value = args
                        .next()
                        .ok_or_else(|| anyhow!("--seed expects a value"))?;
                    seed = Some(value.parse().context("--seed expects an integer")?);
                }
                "--taps" => {
                    let value = args
                        .next()
                        .ok_or_else(|| anyhow!("--taps expects a value"))?;
                    taps = parse_taps(&value)?;
                }
                "--keep" => keep = true,
                other => {
                    return Err(anyhow!(
                        "Unknown argument: {other}. Expected --seed, --taps or --keep"
                    ));
                }
            }
        }
        Ok(Self {
            asset: PathBuf::from(asset),
            seed,
            taps,
            keep,
        })
    }
}

/// One tap on each demo plane plus one that lands on empty space.
fn default_taps() -> Vec<Vec2> {
    vec![
        Vec2::new(320.0, 180.0),
        Vec2::new(900.0, 240.0),
        Vec2::new(1200.0, 700.0),
    ]
}

fn parse_taps(value: &str) -> Result<Vec<Vec2>> {
    value
        .split(';')
        .map(|pair| {
            let (x, y) = pair
                .split_once(',')
                .ok_or_else(|| anyhow!("invalid tap {pair:?}: expected x,y"))?;
            let x = x
                .trim()
                .parse::<f32>()
                .with_context(|| format!("invalid tap coordinate {x:?}"))?;
            let y = y
                .trim()
                .parse::<f32>()
                .with_context(|| format!("invalid tap coordinate {y:?}"))?;
            Ok(Vec2::new(x, y))
        })
        .collect()
}
