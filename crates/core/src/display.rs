//! The collaborators the agent talks to at the edges: where user input
//! comes from and where messages go.

use std::collections::VecDeque;
use std::io;

use chatkit_model::ToolResult;

use crate::Error;

/// Renders what happens in a conversation.
///
/// All methods are fire-and-forget, and the agent doesn't wait for the
/// output to be seen.
pub trait DisplaySink: Send + Sync {
    /// Shows a notice, e.g. the closing message.
    fn show(&self, message: &str);

    /// Shows a non-empty text reply from the model.
    fn show_assistant_reply(&self, text: &str);

    /// Shows a finished tool call with its raw arguments.
    fn show_tool_call(&self, name: &str, arguments: &str, result: &ToolResult);

    /// Shows the error that is about to end the run.
    fn show_error(&self, error: &Error) {
        self.show(&error.to_string());
    }
}

impl<T: DisplaySink + ?Sized> DisplaySink for &T {
    #[inline]
    fn show(&self, message: &str) {
        (**self).show(message)
    }

    #[inline]
    fn show_assistant_reply(&self, text: &str) {
        (**self).show_assistant_reply(text)
    }

    #[inline]
    fn show_tool_call(&self, name: &str, arguments: &str, result: &ToolResult) {
        (**self).show_tool_call(name, arguments, result)
    }

    #[inline]
    fn show_error(&self, error: &Error) {
        (**self).show_error(error)
    }
}

/// A sink that discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct SilentSink;

impl DisplaySink for SilentSink {
    fn show(&self, _message: &str) {}

    fn show_assistant_reply(&self, _text: &str) {}

    fn show_tool_call(&self, _: &str, _: &str, _: &ToolResult) {}
}

/// A source of user input lines.
#[async_trait::async_trait]
pub trait InputSource: Send {
    /// Reads the next line, or `None` when the input is exhausted.
    async fn read_line(&mut self) -> io::Result<Option<String>>;
}

/// Lines are popped from the front.
#[async_trait::async_trait]
impl InputSource for VecDeque<String> {
    #[inline]
    async fn read_line(&mut self) -> io::Result<Option<String>> {
        Ok(self.pop_front())
    }
}
