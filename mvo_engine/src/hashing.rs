//! MVO Engine — Canonical Hashing
//!
//! Deterministic canonical serialization + SHA-256 hashing of requests
//! and results, used to prove that a seeded run reproduces.
//!
//! Rules:
//!   - `engine_version` is always the first field
//!   - struct fields in declaration order (serde_json `preserve_order`)
//!   - UTF-8 JSON, no whitespace
//!   - non-finite floats (infeasible trials) encode as `null`

use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::domain::MvoResult;
use crate::engine::PlanRequest;
use crate::error::EngineResult;
use crate::simulator::SimulationSettings;
use crate::ENGINE_VERSION;

fn canonical_bytes<T: Serialize>(label: &str, body: &T) -> EngineResult<Vec<u8>> {
    let mut root = Map::new();
    root.insert(
        "engine_version".to_string(),
        Value::Number(ENGINE_VERSION.into()),
    );
    root.insert(label.to_string(), serde_json::to_value(body)?);
    Ok(serde_json::to_string(&Value::Object(root))?.into_bytes())
}

fn hex_digest(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Canonical serialization of an `MvoResult` to UTF-8 JSON bytes.
pub fn canonical_serialize(result: &MvoResult) -> EngineResult<Vec<u8>> {
    canonical_bytes("result", result)
}

/// SHA-256 of the canonical result encoding. Lowercase hex.
pub fn result_hash(result: &MvoResult) -> EngineResult<String> {
    Ok(hex_digest(&canonical_serialize(result)?))
}

/// SHA-256 identifying a request together with the settings it ran under.
pub fn request_hash(request: &PlanRequest, settings: &SimulationSettings) -> EngineResult<String> {
    #[derive(Serialize)]
    struct Keyed<'a> {
        request: &'a PlanRequest,
        settings: &'a SimulationSettings,
    }
    let bytes = canonical_bytes("input", &Keyed { request, settings })?;
    Ok(hex_digest(&bytes))
}
