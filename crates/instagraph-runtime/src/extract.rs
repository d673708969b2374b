//! Input routing and prompt construction.
//!
//! A leading `+` turns the request into a patch against the working graph;
//! anything starting with `http` is fetched first and its paragraph text is
//! used as the input.

use instagraph_core::KnowledgeGraph;
use serde_json::json;

pub const PATCH_PREFIX: char = '+';
pub const URL_PREFIX: &str = "http";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    /// Build a new graph from free text.
    Fresh(String),
    /// Revise the working graph according to an instruction.
    Patch(String),
}

/// Plain prefix check, no URL validation.
pub fn is_url(input: &str) -> bool {
    input.starts_with(URL_PREFIX)
}

pub fn detect_mode(input: &str) -> InputMode {
    match input.strip_prefix(PATCH_PREFIX) {
        Some(instruction) => InputMode::Patch(instruction.to_string()),
        None => InputMode::Fresh(input.to_string()),
    }
}

impl InputMode {
    pub fn is_patch(&self) -> bool {
        matches!(self, InputMode::Patch(_))
    }

    /// Input text with the patch prefix removed, otherwise untouched.
    pub fn text(&self) -> &str {
        match self {
            InputMode::Fresh(text) | InputMode::Patch(text) => text,
        }
    }
}

/// Render the single user message sent to the model.
///
/// Patches bundle the instruction with the current graph; with no current
/// graph the bundle carries `null` and the model builds from the instruction.
pub fn build_prompt(mode: &InputMode, current: Option<&KnowledgeGraph>, language: &str) -> String {
    match mode {
        InputMode::Fresh(text) => format!(
            "Help me understand the following by describing it as a detailed knowledge graph.\n\
             Requirements:\n\
             1. Write all node labels and relationship descriptions in {language}; proper nouns may keep their original spelling.\n\
             2. Give every node a specific, precise type.\n\
             3. Describe every relationship concretely and unambiguously.\n\
             4. Include as many relevant entities and relationships as possible so the graph is complete and deep.\n\
             5. Use colors to tell node and edge categories apart, always light tones that read well with black text.\n\
             \n\
             Content:\n{text}"
        ),
        InputMode::Patch(instruction) => {
            let bundle = json!({
                "instruction": instruction,
                "knowledge_graph": current,
            });
            format!(
                "Update the knowledge graph below according to the instruction. \
                 Keep every node and edge the instruction does not touch, and describe \
                 all nodes and relationships in {language} (proper nouns may keep their \
                 original spelling).\n{bundle}"
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn graph() -> KnowledgeGraph {
        KnowledgeGraph::from_value(json!({
            "metadata": {"createdDate": "d", "lastUpdated": "d", "description": "people"},
            "nodes": [{"id": "alice", "label": "Alice", "type": "Person", "color": "#FFE4E1"}],
            "edges": []
        }))
        .unwrap()
    }

    #[test]
    fn test_detect_mode() {
        assert_eq!(
            detect_mode("Rust is a language"),
            InputMode::Fresh("Rust is a language".into())
        );
        assert_eq!(detect_mode("+ add Bob"), InputMode::Patch(" add Bob".into()));
        assert_eq!(detect_mode("+add Bob"), InputMode::Patch("add Bob".into()));
        assert_eq!(detect_mode("+"), InputMode::Patch(String::new()));
        // Only a leading plus counts.
        assert!(!detect_mode("1 + 1").is_patch());
    }

    #[test]
    fn test_is_url_is_prefix_only() {
        assert!(is_url("https://example.com"));
        assert!(is_url("http://x"));
        assert!(is_url("httpfoo"));
        assert!(!is_url("see https://example.com"));
    }

    #[test]
    fn test_fresh_prompt_mentions_language_and_content() {
        let prompt = build_prompt(&InputMode::Fresh("Tokio runs futures".into()), None, "English");
        assert!(prompt.contains("in English"));
        assert!(prompt.ends_with("Tokio runs futures"));
    }

    #[test]
    fn test_patch_prompt_bundles_graph() {
        let g = graph();
        let prompt = build_prompt(&InputMode::Patch("add Bob".into()), Some(&g), "Chinese");
        let start = prompt.find('{').unwrap();
        let bundle: Value = serde_json::from_str(&prompt[start..]).unwrap();
        assert_eq!(bundle["instruction"], "add Bob");
        assert_eq!(bundle["knowledge_graph"]["nodes"][0]["id"], "alice");
    }

    #[test]
    fn test_patch_prompt_without_graph_sends_null() {
        let prompt = build_prompt(&InputMode::Patch("add Bob".into()), None, "Chinese");
        let start = prompt.find('{').unwrap();
        let bundle: Value = serde_json::from_str(&prompt[start..]).unwrap();
        assert!(bundle["knowledge_graph"].is_null());
    }
}
