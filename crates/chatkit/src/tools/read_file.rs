use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;

use chatkit_core::tool::{Error as ToolError, Tool, ToolResult, derive_spec};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::task::spawn_blocking;

use super::resolve;

const MAX_LINES: usize = 50;

#[derive(Deserialize, JsonSchema)]
pub struct ReadFileParameters {
    #[schemars(
        description = "Path to the file, relative to the working directory."
    )]
    path: String,
    #[schemars(description = "1-based start line to read from, default to 1.")]
    start_line: Option<usize>,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct ReadFileOutput {
    path: String,
    content: String,
    /// The 1-based line to continue from, if the file has more lines.
    #[serde(skip_serializing_if = "Option::is_none")]
    next_line: Option<usize>,
}

/// A tool for reading file content with line numbers.
pub struct ReadFileTool {
    root: PathBuf,
    parameter_schema: Value,
}

impl ReadFileTool {
    /// Creates a new tool resolving relative paths against `root`.
    #[inline]
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        ReadFileTool {
            root: root.into(),
            parameter_schema: derive_spec::<ReadFileParameters>("read_file")
                .parameters,
        }
    }
}

impl Tool for ReadFileTool {
    type Input = ReadFileParameters;
    type Output = ReadFileOutput;

    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        r#"
Reads a file and returns its contents prefixed with line numbers.
Returns up to 50 lines from the 1-based start line, and the line to continue from
if there are more."#
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    #[allow(clippy::manual_async_fn)]
    fn execute(
        &self,
        input: ReadFileParameters,
    ) -> impl Future<Output = ToolResult<ReadFileOutput>> + Send + 'static {
        let root = self.root.clone();
        async move {
            let path = resolve(&root, &input.path)?;
            let start_line = input.start_line.unwrap_or(1);
            if start_line == 0 {
                return Err(ToolError::invalid_input()
                    .with_reason("`start_line` must be 1-based"));
            }

            let (content, next_line) = spawn_blocking(move || {
                let file = File::open(&path).map_err(|err| {
                    ToolError::execution_error().with_reason(err.to_string())
                })?;
                format_reader_section(file, start_line)
            })
            .await
            .map_err(|_| {
                ToolError::execution_error().with_reason("Failed to read file")
            })??;

            Ok(ReadFileOutput {
                path: input.path,
                content,
                next_line,
            })
        }
    }
}

/// Formats up to [`MAX_LINES`] lines from `start_line`, returning the text
/// and the next line number if the reader has more.
fn format_reader_section<R: Read>(
    reader: R,
    start_line: usize,
) -> Result<(String, Option<usize>), ToolError> {
    let mut lines = Vec::new();
    let mut has_more = false;
    for line in BufReader::new(reader).lines().skip(start_line - 1) {
        let line = line.map_err(|err| {
            ToolError::execution_error().with_reason(err.to_string())
        })?;
        if lines.len() >= MAX_LINES {
            has_more = true;
            break;
        }
        lines.push(line);
    }

    let mut result = String::new();
    if !lines.is_empty() {
        let last_line_no = start_line + lines.len() - 1;
        let width = last_line_no.to_string().len();
        for (offset, line) in lines.iter().enumerate() {
            let line_no = start_line + offset;
            result.push_str(&format!("{line_no:>width$}: {line}\n"));
        }
    }

    let next_line = has_more.then_some(start_line + lines.len());
    Ok((result, next_line))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn test_format_lines() {
        let input = b"first\nsecond\nthird\n";

        let (output, next_line) =
            format_reader_section(Cursor::new(input), 2).unwrap();
        assert_eq!(output, "2: second\n3: third\n");
        assert_eq!(next_line, None);
    }

    #[test]
    fn test_respects_limit() {
        let mut input = Vec::new();
        for _ in 0..(MAX_LINES + 10) {
            input.extend_from_slice(b"line\n");
        }

        let (output, next_line) =
            format_reader_section(Cursor::new(input), 1).unwrap();
        assert_eq!(output.lines().count(), MAX_LINES);
        assert_eq!(next_line, Some(MAX_LINES + 1));
        assert!(output.starts_with(" 1: line\n"));
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let tool = ReadFileTool::new(std::env::temp_dir());
        let err = tool
            .execute(ReadFileParameters {
                path: "chatkit-surely-missing.txt".to_owned(),
                start_line: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), chatkit_core::tool::ErrorKind::ExecutionError);

        let err = tool
            .execute(ReadFileParameters {
                path: "whatever.txt".to_owned(),
                start_line: Some(0),
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), chatkit_core::tool::ErrorKind::InvalidInput);
    }
}
