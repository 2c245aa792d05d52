//! Model decisions made inside the search loop.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::post::PostHeader;

/// Posts to load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PostsToLoad {
    /// list of posts to load
    pub posts: Vec<PostHeader>,
}

/// The two ways the loop can continue after a critique pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum LoopChoice {
    Search,
    Summary,
}

/// Decision on the next action to take in loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LoopDecision {
    /// whether to keep searching or end the workflow
    pub loop_decision: LoopChoice,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loop_choice_wire_names() {
        let decision: LoopDecision =
            serde_json::from_str(r#"{"loop_decision":"SUMMARY"}"#).unwrap();
        assert_eq!(decision.loop_decision, LoopChoice::Summary);
        assert_eq!(serde_json::to_string(&LoopChoice::Search).unwrap(), "\"SEARCH\"");
    }

    #[test]
    fn test_loop_choice_rejects_other_values() {
        let result = serde_json::from_str::<LoopDecision>(r#"{"loop_decision":"LOAD"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_posts_to_load_empty() {
        let posts: PostsToLoad = serde_json::from_str(r#"{"posts":[]}"#).unwrap();
        assert!(posts.posts.is_empty());
    }
}
