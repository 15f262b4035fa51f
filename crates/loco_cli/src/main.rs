//! Scenario runner: drives a predicted authority/proxy character pair
//! through a scripted locomotion scenario at a fixed timestep and prints the
//! resulting event trace.

use anyhow::{bail, Result};
use clap::Parser;
use log::info;
use serde::Serialize;

use loco_core::engine::scenario::{
    clear_confirms, deliver_confirms, deliver_requests, ScenarioPeer,
};
use loco_core::{CharacterParams, DebugSettings, LocomotionEvent, NetRole};

#[derive(Parser, Debug)]
#[command(name = "loco_cli", about = "Locomotion core scenario runner")]
struct Args {
    /// Scenario to run: walk, sprint, roll, ragdoll
    #[arg(long, default_value = "walk")]
    scenario: String,

    /// Simulation length in ticks
    #[arg(long, default_value_t = 240)]
    ticks: u32,

    /// Fixed timestep in seconds
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,

    /// Emit the event trace as JSON lines instead of plain text
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct TraceLine {
    tick: u32,
    peer: &'static str,
    event: LocomotionEvent,
}

#[derive(Serialize)]
struct Summary {
    scenario: String,
    ticks: u32,
    final_speed: f32,
    final_gait: String,
    final_state: String,
    final_yaw: f32,
}

struct World {
    proxy: ScenarioPeer,
    authority: ScenarioPeer,
}

impl World {
    fn new() -> Self {
        let debug = DebugSettings::from_env().shared();
        let proxy = ScenarioPeer::spawn(CharacterParams {
            role: NetRole::AutonomousProxy,
            locally_controlled: true,
            networked: true,
            debug: debug.clone(),
            ..Default::default()
        });
        let mut authority = ScenarioPeer::spawn(CharacterParams {
            role: NetRole::Authority,
            locally_controlled: false,
            networked: true,
            debug,
            ..Default::default()
        });
        clear_confirms(&mut authority);
        Self { proxy, authority }
    }

    /// One network-coupled step: both peers simulate, then requests and
    /// confirms are exchanged.
    fn step(&mut self, dt: f32) {
        self.proxy.tick(dt);
        self.authority.tick(dt);
        deliver_requests(&mut self.proxy, &mut self.authority);
        deliver_confirms(&mut self.authority, &mut self.proxy);
        clear_confirms(&mut self.authority);
    }
}

fn drive(world: &mut World, scenario: &str, tick: u32, ticks: u32) -> Result<()> {
    let proxy = &mut world.proxy;
    match scenario {
        "walk" => {
            if tick == 0 {
                proxy.character.set_movement_input(1.0, 0.0);
            }
        }
        "sprint" => {
            if tick == 0 {
                proxy.character.set_movement_input(1.0, 0.0);
                proxy.with_links(|character, links| character.sprint_pressed(links));
            }
            // Let go near the end to watch the gait decay.
            if tick == ticks.saturating_sub(60) {
                proxy.with_links(|character, links| character.sprint_released(links));
                proxy.character.set_movement_input(0.0, 0.0);
            }
        }
        "roll" => {
            // Double-tap the stance action a few frames in.
            if tick == 5 || tick == 8 {
                proxy.with_links(|character, links| character.stance_pressed(links));
            }
        }
        "ragdoll" => {
            if tick == 10 {
                proxy.with_links(|character, links| character.ragdoll_pressed(links));
            }
            if tick == ticks.saturating_sub(60) {
                proxy.with_links(|character, links| character.ragdoll_pressed(links));
            }
        }
        other => bail!("unknown scenario: {other}"),
    }
    Ok(())
}

fn print_events(args: &Args, tick: u32, peer: &'static str, events: Vec<LocomotionEvent>) {
    for event in events {
        if args.json {
            let line = TraceLine { tick, peer, event };
            println!("{}", serde_json::to_string(&line).expect("trace line serializes"));
        } else {
            println!("[{tick:4}] {peer:9} {event:?}");
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut world = World::new();
    info!("running scenario '{}' for {} ticks", args.scenario, args.ticks);

    for tick in 0..args.ticks {
        drive(&mut world, &args.scenario, tick, args.ticks)?;
        world.step(args.dt);

        let proxy_events = world.proxy.character.drain_events();
        print_events(&args, tick, "proxy", proxy_events);
        let authority_events = world.authority.character.drain_events();
        print_events(&args, tick, "authority", authority_events);
    }

    let character = &world.proxy.character;
    let summary = Summary {
        scenario: args.scenario.clone(),
        ticks: args.ticks,
        final_speed: character.speed(),
        final_gait: character.gait().name().to_string(),
        final_state: character.movement_state().name().to_string(),
        final_yaw: character.yaw(),
    };
    if args.json {
        println!("{}", serde_json::to_string(&summary)?);
    } else {
        println!(
            "-- {}: state={} gait={} speed={:.0} yaw={:.1} after {} ticks",
            summary.scenario,
            summary.final_state,
            summary.final_gait,
            summary.final_speed,
            summary.final_yaw,
            summary.ticks
        );
    }
    Ok(())
}
