//! A traffic light driven synchronously, then through the event queue.
//!
//! Run with `RUST_LOG=finite_machine=debug` to see the machine's own logs.

use finite_machine::{
    ErrorHandler, ErrorKind, HookContext, HookKind, MachineBuilder, TransitionBuilder, ANY,
    CANCELLED,
};
use serde_json::json;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

finite_machine::state_enum! {
    enum Light {
        Green = "green",
        Yellow = "yellow",
        Red = "red",
        Off = "off",
    }
    final: [Off]
}

type Ctx<'a> = HookContext<'a, Light, ()>;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let machine = MachineBuilder::new()
        .initial(Light::Green)
        .log_transitions(true)
        .event("slow", TransitionBuilder::new().from(Light::Green).to(Light::Yellow))
        .event("stop", TransitionBuilder::new().from(Light::Yellow).to(Light::Red))
        .event("ready", TransitionBuilder::new().from(Light::Red).to(Light::Yellow))
        .event("go", TransitionBuilder::new().from(Light::Yellow).to(Light::Green))
        .event(
            "power_off",
            TransitionBuilder::new()
                .from_any()
                .to(Light::Off)
                .when(|_, args| args.first() == Some(&json!("maintenance"))),
        )
        .on_enter(ANY, |ctx: &Ctx<'_>| println!("entered: {}", ctx.event()))
        .once(HookKind::Exit, "red", |_: &Ctx<'_>| {
            println!("red light held once more");
            CANCELLED
        })
        .handle(
            ErrorKind::InvalidState,
            ErrorHandler::new(|_, err| println!("ignored: {err}")),
        )
        .build()?;

    println!("{machine}");

    machine.trigger("slow", &[])?;
    machine.trigger("stop", &[])?;
    // The first attempt to leave red is cancelled by the once callback.
    machine.trigger("ready", &[])?;
    machine.trigger("ready", &[])?;
    machine.trigger_strict("slow", &[])?;

    for event in ["go", "slow", "stop"] {
        machine.call(&format!("async.{event}"), &[])?;
    }
    machine.event_queue().wait_until_idle(Duration::from_secs(1));
    println!("after queued events: {:?}", machine.current());

    machine.trigger("power_off", &[json!("maintenance")])?;
    println!("terminated: {}", machine.terminated());
    Ok(())
}
