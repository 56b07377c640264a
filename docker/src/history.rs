//! Dependency-layer counting from the image config blob.
//!
//! The config blob's `history` array records one entry per build step,
//! newest last. Entries produced by the image's own build sit above the
//! final image-command marker (a `created_by` containing `ENTRYPOINT` or
//! `MAINTAINER`); everything below it came from the base image. The
//! dependency-layer count is the number of non-empty entries below that
//! marker — empty entries (`empty_layer: true`) leave no file behind and
//! never appear in the manifest's layer list.

use buildinfo_core::{Error, Result};

const IMAGE_COMMAND_MARKERS: [&str; 2] = ["ENTRYPOINT", "MAINTAINER"];

/// Count the dependency layers recorded in a config blob.
pub fn dependency_layer_count(config: &str) -> Result<usize> {
    let value: serde_json::Value =
        serde_json::from_str(config).map_err(|e| Error::InvalidConfig(e.to_string()))?;
    let history = value
        .get("history")
        .and_then(|h| h.as_array())
        .ok_or_else(|| Error::InvalidConfig("could not find 'history' in image config".to_string()))?;

    let mut count = history.len();
    let mut above_marker = true;
    for entry in history.iter().rev() {
        if above_marker {
            count -= 1;
        }
        let created_by = entry.get("created_by").and_then(|v| v.as_str()).unwrap_or("");
        if IMAGE_COMMAND_MARKERS.iter().any(|m| created_by.contains(m)) {
            above_marker = false;
        } else if !above_marker
            && entry
                .get("empty_layer")
                .and_then(|v| v.as_bool())
                .unwrap_or(false)
        {
            count -= 1;
        }
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(history: &str) -> String {
        format!(r#"{{ "architecture": "amd64", "os": "linux", "history": {} }}"#, history)
    }

    #[test]
    fn test_counts_base_layers_below_entrypoint() {
        // Two base layers, then the ENTRYPOINT line, then two build steps.
        let cfg = config(
            r#"[
                { "created_by": "/bin/sh -c #(nop) ADD file:base in /" },
                { "created_by": "/bin/sh -c apt-get update" },
                { "created_by": "/bin/sh -c #(nop) ENTRYPOINT [\"/app\"]", "empty_layer": true },
                { "created_by": "/bin/sh -c make build" },
                { "created_by": "/bin/sh -c #(nop) COPY out /out" }
            ]"#,
        );
        assert_eq!(dependency_layer_count(&cfg).unwrap(), 2);
    }

    #[test]
    fn test_empty_base_layers_are_not_counted() {
        let cfg = config(
            r#"[
                { "created_by": "/bin/sh -c #(nop) ADD file:base in /" },
                { "created_by": "/bin/sh -c #(nop) ENV PATH=/usr/bin", "empty_layer": true },
                { "created_by": "/bin/sh -c #(nop) MAINTAINER someone", "empty_layer": true },
                { "created_by": "/bin/sh -c make build" }
            ]"#,
        );
        // One real base layer; the ENV entry is empty; the MAINTAINER
        // marker itself and everything above belong to the new image.
        assert_eq!(dependency_layer_count(&cfg).unwrap(), 1);
    }

    #[test]
    fn test_no_marker_means_no_dependencies() {
        let cfg = config(
            r#"[
                { "created_by": "/bin/sh -c step one" },
                { "created_by": "/bin/sh -c step two" }
            ]"#,
        );
        assert_eq!(dependency_layer_count(&cfg).unwrap(), 0);
    }

    #[test]
    fn test_missing_history_is_an_error() {
        let result = dependency_layer_count(r#"{ "architecture": "amd64" }"#);
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(dependency_layer_count("not json").is_err());
    }
}
