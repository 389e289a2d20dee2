use crate::annotations;
use crate::cri::SandboxRequest;
use fast_glob::glob_match;
use log::trace;
use std::collections::{BTreeMap, HashMap};

/// Request annotations allowed into the runtime spec. Without patterns
/// everything passes; with patterns a key must match at least one. Reserved
/// and sizing keys never pass, they are computed.
pub fn passthrough_annotations(
    requested: &HashMap<String, String>,
    patterns: Option<&[String]>,
) -> BTreeMap<String, String> {
    requested
        .iter()
        .filter(|(key, _)| {
            let key = key.as_str();
            if annotations::is_reserved(key) || annotations::is_sizing(key) {
                trace!("Ignoring requested reserved annotation {}", key);
                return false;
            }
            true
        })
        .filter(|(key, _)| match patterns {
            None => true,
            Some(patterns) => {
                let matched = patterns.iter().any(|p| glob_match(p, key.as_str()));
                if !matched {
                    trace!("Dropping annotation {}", key);
                }
                matched
            }
        })
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Writes the bookkeeping annotations. Runs after every other annotation
/// source so these keys always carry the computed values.
pub fn stamp_reserved(
    spec_annotations: &mut BTreeMap<String, String>,
    id: &str,
    request: &SandboxRequest,
) {
    let metadata = &request.metadata;
    let reserved = [
        (annotations::SANDBOX_ID, id),
        (
            annotations::CONTAINER_TYPE,
            annotations::CONTAINER_TYPE_SANDBOX,
        ),
        (annotations::SANDBOX_NAMESPACE, metadata.namespace.as_str()),
        (annotations::SANDBOX_UID, metadata.uid.as_str()),
        (annotations::SANDBOX_NAME, metadata.name.as_str()),
        (annotations::SANDBOX_LOG_DIR, request.log_directory.as_str()),
    ];
    for (key, value) in reserved {
        if let Some(previous) =
            spec_annotations.insert(key.to_string(), value.to_string())
        {
            trace!("Reserved annotation {} replaces {:?}", key, previous);
        }
    }
}
