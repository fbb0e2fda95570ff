//! A terminal chat demonstrating how to use `chatkit` as a library.

#[macro_use]
extern crate tracing;

use std::env;
use std::process::ExitCode;
use std::sync::Arc;

use chatkit::core::tool::ToolRegistry;
use chatkit::core::{AgentBuilder, Error};
use chatkit::terminal::{StdinInput, TerminalSink};
use chatkit::tools::FileTools;
use chatkit_mcp::{McpClient, McpTools, StdioTransport};
use chatkit_model::{ApiKind, Transport};
use chatkit_openai::{
    ChatCompletionsTransport, OpenAIConfigBuilder, ResponsesTransport,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let Ok(api_key) = env::var("OPENAI_API_KEY") else {
        eprintln!("OPENAI_API_KEY environment variable is not set");
        return ExitCode::FAILURE;
    };
    let mut config = OpenAIConfigBuilder::with_api_key(api_key);
    if let Ok(base_url) = env::var("OPENAI_BASE_URL") {
        config = config.with_base_url(base_url);
    }
    if let Ok(model) = env::var("OPENAI_MODEL") {
        config = config.with_model(model);
    }
    let config = config.build();
    debug!("using {config:?}");

    let selector =
        env::var("CHATKIT_API").unwrap_or_else(|_| "responses".to_owned());
    let mut registry = match ToolRegistry::for_api(&selector) {
        Ok(registry) => registry,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };

    let root = match env::current_dir() {
        Ok(root) => root,
        Err(err) => {
            eprintln!("cannot get the working directory: {err}");
            return ExitCode::FAILURE;
        }
    };
    registry.register_all(Arc::new(FileTools::new(root)));

    let mcp_server = env::var("CHATKIT_MCP_SERVER")
        .ok()
        .and_then(|cmdline| StdioTransport::from_command_line(&cmdline));
    let mut mcp_client = None;
    if let Some(transport) = mcp_server {
        match load_mcp_tools(transport, &mut registry).await {
            Ok(client) => mcp_client = Some(client),
            Err(err) => {
                eprintln!("cannot load tools from the MCP server: {err}");
                return ExitCode::FAILURE;
            }
        }
    }

    let kind = registry.adapter().kind();
    let result = match kind {
        ApiKind::Responses => {
            run(ResponsesTransport::new(config), registry).await
        }
        ApiKind::ChatCompletions => {
            run(ChatCompletionsTransport::new(config), registry).await
        }
    };
    if let Some(client) = mcp_client {
        client.shutdown().await;
    }
    match result {
        Ok(()) => ExitCode::SUCCESS,
        // The sink has shown the error already.
        Err(_) => ExitCode::FAILURE,
    }
}

async fn load_mcp_tools(
    mut transport: StdioTransport,
    registry: &mut ToolRegistry,
) -> Result<Arc<McpClient>, chatkit_mcp::Error> {
    transport.start()?;
    let client = Arc::new(McpClient::new(transport));
    match McpTools::load(Arc::clone(&client)).await {
        Ok(tools) => {
            registry.register_all(Arc::new(tools));
            Ok(client)
        }
        Err(err) => {
            client.shutdown().await;
            Err(err)
        }
    }
}

async fn run<T: Transport + 'static>(
    transport: T,
    registry: ToolRegistry,
) -> Result<(), Error> {
    let mut agent = AgentBuilder::with_transport(transport)
        .with_registry(Arc::new(registry))
        .with_developer_prompt(
            include_str!("./developer_prompt.md")
                .replace("{{HOST_OS}}", host_os()),
        )
        .build()?;
    agent.run(&mut StdinInput::new(), &TerminalSink).await
}

#[inline]
fn host_os() -> &'static str {
    let os = std::env::consts::OS;
    match os {
        "linux" => "Linux",
        "macos" => "macOS",
        "windows" => "Windows",
        _ => "some other OS",
    }
}
