//! Seed discovery inside a ComfyUI prompt graph.

use serde_json::Value;

/// Finds the generation seed in a decoded prompt graph.
///
/// Scans the prompt's nodes in stored order and returns the first
/// `inputs.seed` value that is an actual non-negative integer; floats and
/// numeric strings are passed over. Absence is normal: `None` comes back
/// for a missing or empty prompt and for graphs without such a node.
///
/// This is a best-effort heuristic tied to the one graph shape the tool is
/// used with (a sampler node exposing `seed` directly in its inputs), not a
/// general graph query.
pub fn find_seed(prompt: Option<&Value>) -> Option<u64> {
    let nodes = prompt?.as_object()?;
    for node in nodes.values() {
        let Some(inputs) = node.get("inputs").and_then(Value::as_object) else {
            continue;
        };
        match inputs.get("seed") {
            Some(Value::Number(seed)) if seed.is_u64() => return seed.as_u64(),
            _ => {}
        }
    }
    None
}
