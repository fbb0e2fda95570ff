//! A set of built-in tools that models can use.

mod list_files;
mod read_file;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chatkit_core::tool::{AnyTool, Error as ToolError, Toolset};

pub use list_files::ListFilesTool;
pub use read_file::ReadFileTool;

/// The built-in file tools. Every path they take is relative to one root
/// directory.
#[derive(Clone, Debug)]
pub struct FileTools {
    root: PathBuf,
}

impl FileTools {
    /// Creates the tool set rooted at `root`.
    #[inline]
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }
}

impl Toolset for FileTools {
    fn tools(self: Arc<Self>) -> Vec<AnyTool> {
        vec![
            AnyTool::new(ListFilesTool::new(self.root.clone())),
            AnyTool::new(ReadFileTool::new(self.root.clone())),
        ]
    }
}

/// Resolves `path` against `root`. Absolute paths are rejected.
fn resolve(root: &Path, path: &str) -> Result<PathBuf, ToolError> {
    let path = Path::new(path);
    if path.is_absolute() {
        return Err(ToolError::invalid_input()
            .with_reason("paths must be relative to the working directory"));
    }
    Ok(root.join(path))
}

#[cfg(test)]
mod tests {
    use chatkit_core::tool::{ErrorKind, Tool, ToolRegistry};
    use chatkit_model::ApiKind;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_advertised_parameters() {
        let mut registry = ToolRegistry::new(ApiKind::Responses);
        registry.register_all(Arc::new(FileTools::new("/")));

        let tools = registry.list_for_api();
        assert_eq!(tools.len(), 2);
        for tool in &tools {
            let params = &tool["parameters"];
            assert_eq!(params["type"], "object");
            assert_eq!(params["additionalProperties"], false);
            assert!(params.get("$schema").is_none());
            assert!(params.get("title").is_none());
        }

        let list_files = &tools[0]["parameters"];
        assert_eq!(list_files["required"], json!(["pattern"]));
        assert_eq!(list_files["properties"]["path"]["type"], "string");
        let read_file = &tools[1]["parameters"];
        assert_eq!(read_file["properties"]["start_line"]["type"], "number");
    }

    #[tokio::test]
    async fn test_absolute_paths_rejected() {
        let err = resolve(Path::new("/tmp"), "/etc/passwd").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(
            resolve(Path::new("/tmp"), "notes/a.txt").unwrap(),
            Path::new("/tmp/notes/a.txt")
        );

        let input = serde_json::from_value(json!({ "path": "/etc/passwd" }))
            .unwrap();
        let err = ReadFileTool::new("/tmp").execute(input).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let input = serde_json::from_value(json!({
            "pattern": "*",
            "path": "/etc",
        }))
        .unwrap();
        let err = ListFilesTool::new("/tmp").execute(input).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
