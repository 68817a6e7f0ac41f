//! Dedup key derivation for cooldown records.
//!
//! Keys are deterministic strings: the same (target, condition) pair always
//! maps to the same store key, so overwriting the value is the only write
//! operation the store ever needs.

/// Dedup key for a Conditional task: derived from the probe target and the
/// matched status code.
pub fn dedup_key(check_url: &str, matched_status: u16) -> String {
    format!("cooldown:{check_url}:{matched_status}")
}

/// Dedup key for a Scheduled task, derived from task identity.
///
/// Scheduled tasks don't consult the cooldown gate in the current decision
/// path, but the key shape is fixed here so a future gate reuses it.
pub fn scheduled_dedup_key(task_name: &str) -> String {
    format!("cooldown:scheduled:{task_name}")
}
