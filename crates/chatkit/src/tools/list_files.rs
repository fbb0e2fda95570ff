use std::path::{Path, PathBuf};

use chatkit_core::tool::{Error as ToolError, Tool, ToolResult, derive_spec};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::task::spawn_blocking;

use super::resolve;

const MAX_ENTRIES: usize = 50;

#[derive(Deserialize, JsonSchema)]
pub struct ListFilesParameters {
    #[schemars(description = "The glob pattern, relative to `path`.")]
    pattern: String,
    #[schemars(description = "Directory to search in, relative to the \
                              working directory. Default to the working \
                              directory itself.")]
    path: Option<String>,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct ListFilesOutput {
    files: Vec<String>,
    truncated: bool,
}

/// A tool for finding files using glob patterns.
pub struct ListFilesTool {
    root: PathBuf,
    parameter_schema: Value,
}

impl ListFilesTool {
    /// Creates a new tool resolving relative paths against `root`.
    #[inline]
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        ListFilesTool {
            root: root.into(),
            parameter_schema: derive_spec::<ListFilesParameters>("list_files")
                .parameters,
        }
    }
}

impl Tool for ListFilesTool {
    type Input = ListFilesParameters;
    type Output = ListFilesOutput;

    fn name(&self) -> &str {
        "list_files"
    }

    fn description(&self) -> &str {
        r#"
Find files and directories using glob patterns.
This tool supports standard glob syntax like *, ?, and ** for recursive searches,
and returns at most 50 entries."#
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    #[allow(clippy::manual_async_fn)]
    fn execute(
        &self,
        input: ListFilesParameters,
    ) -> impl Future<Output = ToolResult<ListFilesOutput>> + Send + 'static {
        let root = self.root.clone();
        async move {
            if Path::new(&input.pattern).is_absolute() {
                return Err(ToolError::invalid_input()
                    .with_reason("`pattern` must be relative to `path`"));
            }
            let dir = match &input.path {
                Some(path) => resolve(&root, path)?,
                None => root,
            };

            let pattern = dir.join(&input.pattern);
            let pattern = glob::glob(&pattern.to_string_lossy()).map_err(|err| {
                ToolError::invalid_input().with_reason(err.to_string())
            })?;

            spawn_blocking(move || {
                let mut files = vec![];
                let mut truncated = false;
                for item in pattern.flatten() {
                    if files.len() >= MAX_ENTRIES {
                        truncated = true;
                        break;
                    }
                    files.push(item.to_string_lossy().into_owned());
                }
                ListFilesOutput { files, truncated }
            })
            .await
            .map_err(|_| {
                ToolError::execution_error().with_reason("Failed to list files")
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("chatkit-list-files-{name}-{}", std::process::id()));
        fs::create_dir_all(dir.join("src")).unwrap();
        fs::write(dir.join("src/main.rs"), "fn main() {}").unwrap();
        fs::write(dir.join("src/lib.rs"), "").unwrap();
        fs::write(dir.join("README.md"), "").unwrap();
        dir
    }

    #[tokio::test]
    async fn test_list_files() {
        let dir = scratch_dir("basic");
        let tool = ListFilesTool::new(&dir);

        let output = tool
            .execute(ListFilesParameters {
                pattern: "**/*.rs".to_owned(),
                path: None,
            })
            .await
            .unwrap();
        assert_eq!(output.files.len(), 2);
        assert!(output.files.iter().all(|f| f.ends_with(".rs")));
        assert!(!output.truncated);

        let output = tool
            .execute(ListFilesParameters {
                pattern: "*.rs".to_owned(),
                path: Some("src".to_owned()),
            })
            .await
            .unwrap();
        assert_eq!(output.files.len(), 2);

        fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_input_validation() {
        let tool = ListFilesTool::new("/");

        let err = tool
            .execute(ListFilesParameters {
                pattern: "/*.*".to_owned(),
                path: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), chatkit_core::tool::ErrorKind::InvalidInput);

        let err = tool
            .execute(ListFilesParameters {
                pattern: "[".to_owned(),
                path: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), chatkit_core::tool::ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_truncated() {
        let dir = std::env::temp_dir()
            .join(format!("chatkit-list-files-many-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        for idx in 0..(MAX_ENTRIES + 5) {
            fs::write(dir.join(format!("{idx}.txt")), "").unwrap();
        }

        let output = ListFilesTool::new(&dir)
            .execute(ListFilesParameters {
                pattern: "*.txt".to_owned(),
                path: None,
            })
            .await
            .unwrap();
        assert_eq!(output.files.len(), MAX_ENTRIES);
        assert!(output.truncated);

        fs::remove_dir_all(&dir).ok();
    }
}
