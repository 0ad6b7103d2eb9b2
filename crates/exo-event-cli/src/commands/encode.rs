//! Encode command implementation.

use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::Context;
use exo_event_core::{canonical_bytes, hash_canonical};
use exo_event_testkit::record::EventRecord;

pub fn run(input: Option<PathBuf>) -> anyhow::Result<()> {
    // Read JSON from file or stdin
    let json = match input {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    let record: EventRecord = serde_json::from_str(&json).context("invalid event record")?;
    let event = record.to_event().context("event rejected")?;
    let bytes = canonical_bytes(&event).context("event rejected")?;

    println!("canonical: {}", hex::encode(&bytes));
    println!("digest: {}", hash_canonical(&bytes));
    Ok(())
}
