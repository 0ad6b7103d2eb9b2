//! Export command implementation.

use exo_event_core::WIRE_FORMAT;
use exo_event_testkit::file::to_json;
use exo_event_testkit::vectors::builtin_registry;

pub fn run() -> anyhow::Result<()> {
    let description = format!("Golden vectors for the {} wire format", WIRE_FORMAT);
    println!("{}", to_json(&builtin_registry(), &description)?);
    Ok(())
}
