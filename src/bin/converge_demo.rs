//! Convergence demo binary
//!
//! Walks one actor through a patrol / combat-interrupt / stand-down
//! cycle and prints what each axis is doing per tick.

use composure::core::config::EngineConfig;
use composure::core::error::Result;
use composure::manager::goal::StateOverrides;
use composure::registry::StateRegistry;
use composure::world::ActorWorld;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = EngineConfig::default();
    let registry = StateRegistry::with_defaults();

    println!("Composure convergence demo");
    println!("==========================");
    println!("{} named states registered", registry.len());
    println!();

    let mut world = ActorWorld::new(registry, config).with_motion_latency(2);
    let actor = world.spawn_actor();

    // Patrol, get interrupted by combat mid-transition, stand down.
    let script = [
        (0u64, "patrol_walk"),
        (4, "fire_crouched"),
        (18, "idle_relaxed"),
    ];

    for tick in 0..32u64 {
        if let Some((_, name)) = script.iter().find(|(at, _)| *at == tick) {
            println!("tick {:>2}: >>> request '{}'", tick, name);
            world.request_state(actor, name, StateOverrides::default())?;
        }

        world.tick();

        let snapshot = world.snapshot(actor)?;
        println!(
            "tick {:>2}: posture={:?} movement={:?} weapon={:?} mental={:?} converged={}",
            tick,
            snapshot.posture,
            snapshot.movement,
            snapshot.weapon,
            snapshot.mental,
            world.is_converged(actor)?,
        );

    }

    println!();
    let stats = world.stats(actor)?;
    println!(
        "lifecycle: {} starts, {} finishes, {} cancellations",
        stats.starts, stats.finishes, stats.cancellations
    );
    match world.current_state_name(actor)? {
        Some(name) => println!("settled in '{}'", name),
        None => println!("still transitioning"),
    }

    Ok(())
}
