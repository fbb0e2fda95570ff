use chatkit_model::TransportRequest;
use serde::Serialize;
use serde_json::Value;

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResponsesRequest<'a> {
    model: &'a str,
    input: &'a [Value],
    #[serde(skip_serializing_if = "is_empty")]
    tools: &'a [Value],
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Value],
    #[serde(skip_serializing_if = "is_empty")]
    tools: &'a [Value],
}

#[inline]
fn is_empty(values: &&[Value]) -> bool {
    values.is_empty()
}

// -----------
// Conversions
// -----------

#[inline]
pub fn create_responses_request<'a>(
    req: &'a TransportRequest,
    model: &'a str,
) -> ResponsesRequest<'a> {
    ResponsesRequest {
        model,
        input: &req.input,
        tools: &req.tools,
    }
}

#[inline]
pub fn create_chat_completion_request<'a>(
    req: &'a TransportRequest,
    model: &'a str,
) -> ChatCompletionRequest<'a> {
    ChatCompletionRequest {
        model,
        messages: &req.input,
        tools: &req.tools,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const MODEL: &str = "gpt-4o-mini";

    fn request_body<T: Serialize>(req: T) -> Value {
        serde_json::to_value(req).unwrap()
    }

    fn request(tools: Vec<Value>) -> TransportRequest {
        TransportRequest {
            input: vec![json!({ "role": "user", "content": "Hi" })],
            tools,
        }
    }

    #[test]
    fn test_tools_omitted_when_empty() {
        let req = request(vec![]);
        let body = request_body(create_responses_request(&req, MODEL));
        assert_eq!(
            body,
            json!({
                "model": "gpt-4o-mini",
                "input": [{ "role": "user", "content": "Hi" }],
            })
        );

        let body = request_body(create_chat_completion_request(&req, MODEL));
        assert_eq!(body["messages"][0]["content"], "Hi");
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn test_tools_passed_through() {
        let tool = json!({ "type": "function", "function": { "name": "add" } });
        let req = request(vec![tool.clone()]);
        let body = request_body(create_chat_completion_request(&req, MODEL));
        assert_eq!(body["tools"], json!([tool]));
        assert!(body.get("input").is_none());
    }
}
