//! LLM Client Layer - Anthropic API integration and structured output
//!
//! This module provides:
//! - Message types for LLM communication
//! - LlmClient trait for API abstraction
//! - AnthropicClient implementation
//! - Structured output via forced tool use

pub mod anthropic;
pub mod client;
pub mod structured;
pub mod types;

pub use anthropic::{AnthropicClient, AnthropicConfig};
pub use client::{LlmClient, MockLlmClient};
pub use structured::{StructuredOutput, invoke_structured};
pub use types::{
    CompletionRequest, CompletionResponse, Message, Role, StopReason, ToolCall, ToolChoice,
    ToolDefinition, Usage,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_exports() {
        let _role = Role::System;
        let _stop = StopReason::EndTurn;
        let _choice = ToolChoice::Auto;
    }
}
