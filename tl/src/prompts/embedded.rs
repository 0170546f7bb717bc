//! Embedded prompts
//!
//! Compiled into the binary from the .pmt files at build time.

use tracing::debug;

/// Planning prompt used by the decomposer
pub const DECOMPOSE: &str = include_str!("../../prompts/decompose.pmt");

/// Per-task instruction used by the executor
pub const TASK: &str = include_str!("../../prompts/task.pmt");

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "decompose" => Some(DECOMPOSE),
        "task" => Some(TASK),
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_embedded_decompose() {
        let prompt = get_embedded("decompose").unwrap();
        assert!(prompt.contains("numbered list"));
        assert!(prompt.contains("{{prompt}}"));
    }

    #[test]
    fn test_get_embedded_task() {
        let prompt = get_embedded("task").unwrap();
        assert!(prompt.contains("{{task}}"));
        assert!(prompt.contains("{{completion_phrase}}"));
    }

    #[test]
    fn test_get_embedded_unknown() {
        assert!(get_embedded("nonexistent").is_none());
    }
}
