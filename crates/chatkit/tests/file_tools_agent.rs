use std::collections::VecDeque;
use std::fs;
use std::sync::Arc;

use chatkit::core::AgentBuilder;
use chatkit::core::display::SilentSink;
use chatkit::core::tool::ToolRegistry;
use chatkit::tools::FileTools;
use chatkit_model::{ApiKind, Message};
use chatkit_test_model::{PresetResponse, ScriptedTransport};
use serde_json::json;

#[tokio::test]
async fn test_read_file_through_agent() {
    let root = std::env::temp_dir()
        .join(format!("chatkit-agent-{}", std::process::id()));
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("todo.txt"), "buy milk\nwalk the dog\n").unwrap();

    let mut transport = ScriptedTransport::new(ApiKind::ChatCompletions);
    transport.add_response(PresetResponse::tool_call(
        "call_1",
        "read_file",
        r#"{"path":"todo.txt"}"#,
    ));
    transport.add_response(PresetResponse::message("You need to buy milk."));

    let mut registry = ToolRegistry::new(ApiKind::ChatCompletions);
    registry.register_all(Arc::new(FileTools::new(&root)));
    let names: Vec<_> =
        registry.specs().iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["list_files", "read_file"]);

    let mut agent = AgentBuilder::with_transport(transport.clone())
        .with_registry(Arc::new(registry))
        .build()
        .unwrap();
    let mut input: VecDeque<String> = ["What's on my list?", "stop"]
        .into_iter()
        .map(ToOwned::to_owned)
        .collect();
    agent.run(&mut input, &SilentSink).await.unwrap();

    let Some(Message::ToolResult(result)) = agent.conversation().get(2) else {
        panic!("expected a tool result: {:?}", agent.conversation());
    };
    assert_eq!(
        result.output,
        json!({
            "path": "todo.txt",
            "content": "1: buy milk\n2: walk the dog\n",
        })
    );

    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].tools.len(), 2);
    assert_eq!(requests[1].input.last().unwrap()["role"], "tool");

    fs::remove_dir_all(&root).ok();
}
