//! Demo: step keys across a fan-out
//!
//! Builds the keys a plan would hold for `etl.extract -> etl.load`, where
//! `etl.load` runs once per file emitted by `etl.extract`.

use anyhow::Result;
use dagkey::{NodePath, StaticStepHandle, StepHandle, UnresolvedStepHandle};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dagkey=debug".into()),
        )
        .init();

    let etl = NodePath::new("etl")?;
    let extract = StaticStepHandle::new(etl.child("extract")?);
    let load = UnresolvedStepHandle::new(etl.child("load")?);

    println!("=== Plan ===");
    println!("  {}", extract);
    println!("  {}", load);

    // extract finished and emitted these items (one duplicate)
    let emitted = ["a_csv", "b_csv", "a_csv", "c_csv"];
    let instances = load.resolve_all(emitted);

    println!("\n=== Execution ===");
    for instance in &instances {
        let decoded = StepHandle::from_key(&instance.to_key())?;
        println!(
            "  {} -> kind={} template={}",
            instance,
            decoded.kind(),
            instance.unresolved_form()
        );
    }

    Ok(())
}
