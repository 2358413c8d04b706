use crate::core::search::SearchService;
use crate::domain::model::{SearchArguments, SUPPORTED_ENGINES};
use crate::domain::protocol::{
    CallToolParams, Implementation, InitializeParams, InitializeResult, JsonRpcError,
    JsonRpcRequest, JsonRpcResponse, ListToolsResult, ServerCapabilities, Tool, ToolAnnotations,
    ToolsCapability, JSONRPC_VERSION,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

pub const SERVER_NAME: &str = "SerpApi MCP Server";
pub const SEARCH_TOOL: &str = "search";

const INSTRUCTIONS: &str = "Use the `search` tool to query SerpApi. Put engine-specific \
parameters (q, engine, location, num, ...) in `params` and pick `mode` \"complete\" for the \
full response or \"compact\" to drop metadata fields.";

/// 單一 HTTP 請求的處理結果
#[derive(Debug, Clone, PartialEq)]
pub enum McpOutcome {
    /// 一般 JSON-RPC 回應（包含方法層級的錯誤）
    Reply(JsonRpcResponse),
    /// 無法解析或不合 JSON-RPC 格式的訊息
    Rejected(JsonRpcResponse),
    /// 通知，不需回應內容
    Accepted,
}

/// MCP JSON-RPC 分派器；無狀態，每個請求獨立處理
#[derive(Clone)]
pub struct McpHandler {
    search: SearchService,
}

impl McpHandler {
    pub fn new(search: SearchService) -> Self {
        Self { search }
    }

    pub fn tools(&self) -> Vec<Tool> {
        vec![search_tool(self.search.default_engine())]
    }

    pub async fn handle_body(&self, api_key: &str, body: &[u8]) -> McpOutcome {
        let value: Value = match serde_json::from_slice(body) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!("rejecting unparsable MCP body: {}", e);
                return McpOutcome::Rejected(JsonRpcResponse::failure(
                    Value::Null,
                    JsonRpcError::parse_error(e),
                ));
            }
        };

        if value.is_array() {
            return McpOutcome::Rejected(JsonRpcResponse::failure(
                Value::Null,
                JsonRpcError::invalid_request("batch requests are not supported"),
            ));
        }

        let id = value.get("id").cloned().unwrap_or(Value::Null);
        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                return McpOutcome::Rejected(JsonRpcResponse::failure(
                    id,
                    JsonRpcError::invalid_request(e),
                ))
            }
        };

        if request.jsonrpc != JSONRPC_VERSION {
            return McpOutcome::Rejected(JsonRpcResponse::failure(
                id,
                JsonRpcError::invalid_request(format!(
                    "unsupported jsonrpc version '{}'",
                    request.jsonrpc
                )),
            ));
        }

        match self.handle(api_key, request).await {
            Some(response) => McpOutcome::Reply(response),
            None => McpOutcome::Accepted,
        }
    }

    /// 通知回傳 None
    pub async fn handle(&self, api_key: &str, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let Some(id) = request.id.clone() else {
            tracing::debug!(method = %request.method, "received notification");
            return None;
        };

        tracing::debug!(method = %request.method, "handling MCP request");

        let result = match request.method.as_str() {
            "initialize" => self.initialize(request.params),
            "ping" => Ok(json!({})),
            "tools/list" => self.list_tools(),
            "tools/call" => self.call_tool(api_key, request.params).await,
            other => Err(JsonRpcError::method_not_found(other)),
        };

        Some(match result {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => {
                tracing::debug!(code = error.code, "MCP request failed: {}", error.message);
                JsonRpcResponse::failure(id, error)
            }
        })
    }

    fn initialize(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let params: InitializeParams = parse_params(params)?;

        if let Some(client) = &params.client_info {
            tracing::info!("MCP client connected: {} {}", client.name, client.version);
        }

        let result = InitializeResult {
            protocol_version: InitializeResult::negotiate_version(params.protocol_version.as_deref())
                .to_string(),
            capabilities: ServerCapabilities {
                tools: ToolsCapability {
                    list_changed: false,
                },
            },
            server_info: Implementation {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            instructions: Some(INSTRUCTIONS.to_string()),
        };

        serde_json::to_value(result).map_err(JsonRpcError::internal_error)
    }

    fn list_tools(&self) -> Result<Value, JsonRpcError> {
        serde_json::to_value(ListToolsResult {
            tools: self.tools(),
        })
        .map_err(JsonRpcError::internal_error)
    }

    async fn call_tool(&self, api_key: &str, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let params: CallToolParams = match params {
            Some(params) => serde_json::from_value(params).map_err(JsonRpcError::invalid_params)?,
            None => return Err(JsonRpcError::invalid_params("missing tool call params")),
        };

        if params.name != SEARCH_TOOL {
            return Err(JsonRpcError::invalid_params(format!(
                "Unknown tool: {}",
                params.name
            )));
        }

        let arguments: SearchArguments = parse_params(params.arguments)?;
        let result = self.search.call(api_key, &arguments).await;

        serde_json::to_value(result).map_err(JsonRpcError::internal_error)
    }
}

/// 缺少或為 null 的參數使用預設值
fn parse_params<T: DeserializeOwned + Default>(params: Option<Value>) -> Result<T, JsonRpcError> {
    match params {
        None | Some(Value::Null) => Ok(T::default()),
        Some(value) => serde_json::from_value(value).map_err(JsonRpcError::invalid_params),
    }
}

fn search_tool(default_engine: &str) -> Tool {
    let description = format!(
        "Universal search tool supporting all SerpApi engines and result types.\n\n\
         Covers weather, stock and general web search through a single interface and returns \
         the SerpApi response as JSON.\n\n\
         Arguments:\n\
         - params: engine-specific parameters. Common ones: q (search query, required for most \
         engines), engine (default \"{default_engine}\"), location, num.\n\
         - mode: \"complete\" (default) returns the full response; \"compact\" removes \
         search_metadata, search_parameters, search_information, pagination and \
         serpapi_pagination.\n\n\
         Examples:\n\
         - Weather: {{\"params\": {{\"q\": \"weather in London\", \"engine\": \"google\"}}, \"mode\": \"complete\"}}\n\
         - Stock: {{\"params\": {{\"q\": \"AAPL stock\", \"engine\": \"google\"}}, \"mode\": \"complete\"}}\n\
         - General: {{\"params\": {{\"q\": \"coffee shops\", \"engine\": \"google_light\", \"location\": \"Austin, TX\"}}, \"mode\": \"complete\"}}\n\
         - Compact: {{\"params\": {{\"q\": \"news\"}}, \"mode\": \"compact\"}}\n\n\
         Supported engines: {engines}",
        default_engine = default_engine,
        engines = SUPPORTED_ENGINES.join(", "),
    );

    Tool {
        name: SEARCH_TOOL.to_string(),
        description,
        input_schema: json!({
            "type": "object",
            "properties": {
                "params": {
                    "type": "object",
                    "description": "Engine-specific SerpApi parameters such as q, engine, location and num",
                    "additionalProperties": true,
                    "default": {}
                },
                "mode": {
                    "type": "string",
                    "enum": ["complete", "compact"],
                    "default": "complete",
                    "description": "complete returns the full response, compact strips metadata fields"
                }
            }
        }),
        annotations: Some(ToolAnnotations {
            title: Some("SerpApi Search".to_string()),
            read_only_hint: Some(true),
            open_world_hint: Some(true),
        }),
    }
}
