// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Two-phase tool-call orchestration pipeline.
//!
//! Phase one is a constrained intent probe: the latest user turn plus the
//! assembled tool catalog go to the model with auto tool-choice and a low
//! output budget, asking it to either answer "no tool needed" or emit tool
//! invocations. Tool turns accumulate on a working copy of the context and
//! never leak into the caller's sequence. Phase two generates the final
//! structured reply over the (possibly tool-augmented) working copy.
//!
//! Any failure in the tool phase or augmented generation triggers exactly
//! one fallback: plain generation over the original, unmodified context.
//! A second failure propagates.

use std::sync::Arc;
use std::time::Duration;

use parley_config::SettingsManager;
use parley_core::ParleyError;
use parley_core::traits::{ChatBackend, ToolGateway};
use parley_core::types::{
    ChatMessage, ChatRequest, QualifiedToolName, Role, ToolChoice, ToolInvocation,
};
use tracing::{debug, info, warn};

use crate::tools;

/// Timeout for a single gateway tool call.
pub const TOOL_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Output budget for the intent probe.
const PROBE_MAX_TOKENS: u32 = 128;

/// Output budget for the group participation judgment.
const JUDGMENT_MAX_TOKENS: u32 = 10;

/// Turns considered by the group participation judgment.
const JUDGMENT_WINDOW: usize = 10;

const PROBE_INSTRUCTION: &str = "Decide only whether a tool call is needed. \
If one is, invoke it directly; if not, reply NO.";

const JUDGMENT_PROMPT: &str = r#"
You are a participant in a group chat, deciding whether to join the
conversation unprompted. Reply when someone asks a question or seeks advice
(even without addressing you), expresses confusion, shares something worth
reacting to, or raises a topic you have a clear take on. Stay silent when
others are talking among themselves, the topic has nothing to do with you,
the thread is already crowded, or a mention is directed at someone else.

Analyze the recent conversation and decide whether to join in.
Reply with exactly "YES" or "NO" and nothing else.
"#;

const GROUP_FRAMING: &str = "
You are speaking in a group chat. Keep in mind:
    - Everything you say is visible to every member
    - Stay natural, join the discussion like any other member
    - Do not act like a bot; have your own opinions and personality
";

const REPLY_FORMAT: &str = r#"
Reply strictly in the following JSON format, with no other content:
{
  "reply": [
    "first segment",
    "second segment",
    "possibly more segments..."
  ]
}

Content rules:
1. No markdown formatting; return pure JSON only
2. Segment count varies; keep to one concise segment about 80% of the time
3. Split into segments when the topic clearly shifts, when a code block or
   example needs to stand alone, or when a longer reply reads naturally as
   separate messages
4. Each segment is one complete sentence or semantic unit; no trailing period
5. A block of code stays intact as a single segment
6. Write like a real person chatting online: casual, direct, not verbose
"#;

/// Runs the decide-then-call protocol for one reply.
pub struct ReplyPipeline {
    settings: Arc<SettingsManager>,
    backend: Arc<dyn ChatBackend>,
    gateway: Arc<dyn ToolGateway>,
}

impl ReplyPipeline {
    pub fn new(
        settings: Arc<SettingsManager>,
        backend: Arc<dyn ChatBackend>,
        gateway: Arc<dyn ToolGateway>,
    ) -> Self {
        Self {
            settings,
            backend,
            gateway,
        }
    }

    /// Produces the final structured reply for `context`.
    ///
    /// The caller's sequence is never mutated; tool turns live on a working
    /// copy that is discarded unless generation over it succeeds.
    pub async fn run(
        &self,
        context: &[ChatMessage],
        is_group: bool,
    ) -> Result<String, ParleyError> {
        if !self.settings.chat_enabled() {
            return Err(ParleyError::Config("chat is currently disabled".to_string()));
        }
        if self.settings.current_chat_service().is_none() {
            return Err(ParleyError::Config(
                "no model service configured".to_string(),
            ));
        }

        if !self.settings.tools_enabled() {
            debug!("tool augmentation disabled, using plain generation");
            return self.generate(context.to_vec(), is_group).await;
        }

        match self.run_augmented(context, is_group).await {
            Ok(reply) => Ok(reply),
            Err(e) => {
                warn!(error = %e, "tool-augmented path failed, falling back to plain generation");
                self.generate(context.to_vec(), is_group).await
            }
        }
    }

    /// Tool catalog assembly, intent probe, tool execution, and generation
    /// over the augmented working copy.
    async fn run_augmented(
        &self,
        context: &[ChatMessage],
        is_group: bool,
    ) -> Result<String, ParleyError> {
        let mut working = context.to_vec();

        // Built-ins always; gateway catalog unioned in when any server is
        // enabled. An unreachable gateway degrades to built-ins only.
        let mut catalog = tools::builtin_descriptors();
        if !self.settings.enabled_tool_servers().is_empty() {
            match self.gateway.list_tools().await {
                Ok(remote) => {
                    info!(
                        builtin = catalog.len(),
                        remote = remote.len(),
                        "tool catalog assembled"
                    );
                    catalog.extend(remote);
                }
                Err(e) => {
                    warn!(error = %e, "tool discovery failed, continuing with built-in tools only");
                }
            }
        }

        let latest = working.last().map(|m| m.content.as_str()).unwrap_or("");
        let probe = ChatRequest {
            messages: vec![ChatMessage::text(
                Role::User,
                format!("{PROBE_INSTRUCTION}\nQuestion: {latest}"),
            )],
            tools: Some(catalog),
            tool_choice: Some(ToolChoice::Auto),
            json_response: false,
            max_tokens: Some(PROBE_MAX_TOKENS),
            enable_search: false,
        };
        let response = self.backend.complete(probe).await?;

        if !response.tool_calls.is_empty() {
            info!(count = response.tool_calls.len(), "tool calls detected");
            working.push(ChatMessage::assistant_tool_calls(
                response.content.clone(),
                response.tool_calls.clone(),
            ));
            // Invocation order and call-id correlation are preserved; an
            // error text is a valid tool result, not a pipeline failure.
            for call in &response.tool_calls {
                let result = self.execute_tool(call).await;
                working.push(ChatMessage::tool_result(&call.id, result));
            }
        }

        self.generate(working, is_group).await
    }

    /// Resolves and executes one invocation: built-in in-process, otherwise
    /// a gateway call with a bounded timeout.
    async fn execute_tool(&self, call: &ToolInvocation) -> String {
        if let Some(result) = tools::call_builtin(&call.name, &call.arguments) {
            debug!(tool = %call.name, "built-in tool executed");
            return result;
        }

        let name = match QualifiedToolName::parse(&call.name) {
            Ok(name) => name,
            Err(e) => {
                warn!(tool = %call.name, error = %e, "invalid tool name");
                return format!("tool call failed: {e}");
            }
        };

        match self.gateway.call(&name, &call.arguments, TOOL_CALL_TIMEOUT).await {
            Ok(text) => text,
            Err(ParleyError::Timeout { duration }) => {
                warn!(tool = %name, ?duration, "tool call timed out");
                "tool call timed out, try again later".to_string()
            }
            Err(e) => {
                warn!(tool = %name, error = %e, "tool call failed");
                format!("tool call failed: {e}")
            }
        }
    }

    /// Final generation: persona plus reply-format framing prepended as a
    /// system turn, response constrained to one structured JSON payload.
    async fn generate(
        &self,
        messages: Vec<ChatMessage>,
        is_group: bool,
    ) -> Result<String, ParleyError> {
        let mut full = Vec::with_capacity(messages.len() + 1);
        full.push(ChatMessage::text(Role::System, self.system_prompt(is_group)));
        full.extend(messages);

        let request = ChatRequest {
            messages: full,
            tools: None,
            tool_choice: None,
            json_response: true,
            max_tokens: None,
            enable_search: self.settings.search_enabled(),
        };
        let response = self.backend.complete(request).await?;
        if response.content.trim().is_empty() {
            return Err(ParleyError::EmptyResponse);
        }
        Ok(response.content)
    }

    fn system_prompt(&self, is_group: bool) -> String {
        let mut prompt = self.settings.persona();
        if is_group {
            prompt.push_str(GROUP_FRAMING);
        }
        prompt.push_str(REPLY_FORMAT);
        prompt
    }

    /// Decides whether to join a group conversation unprompted, from the
    /// last few turns. Assistant turns are unwrapped from their structured
    /// payload so the judge sees what was actually said.
    pub async fn should_reply_in_group(
        &self,
        context: &[ChatMessage],
    ) -> Result<bool, ParleyError> {
        if self.settings.current_chat_service().is_none() {
            return Ok(false);
        }

        let window_start = context.len().saturating_sub(JUDGMENT_WINDOW);
        let transcript: Vec<String> = context[window_start..]
            .iter()
            .map(|msg| match msg.role {
                Role::Assistant => format!("you replied: {}", unwrap_reply_payload(&msg.content)),
                _ => msg.content.clone(),
            })
            .collect();

        let request = ChatRequest {
            messages: vec![
                ChatMessage::text(
                    Role::System,
                    format!("{}{JUDGMENT_PROMPT}", self.settings.persona()),
                ),
                ChatMessage::text(
                    Role::User,
                    format!("Group chat log\n{}", transcript.join("\n")),
                ),
            ],
            tools: None,
            tool_choice: None,
            json_response: false,
            max_tokens: Some(JUDGMENT_MAX_TOKENS),
            enable_search: false,
        };
        let response = self.backend.complete(request).await?;
        let judgment = response.content.trim().to_uppercase();
        info!(judgment = %judgment, "group participation judgment");
        Ok(judgment == "YES")
    }
}

/// Extracts the segment list from a structured reply payload, falling back
/// to the raw text for anything that does not parse.
fn unwrap_reply_payload(payload: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(payload) {
        Ok(value) => match value.get("reply").and_then(|r| r.as_array()) {
            Some(segments) => segments
                .iter()
                .filter_map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(" "),
            None => payload.to_string(),
        },
        Err(_) => payload.to_string(),
    }
}
