//! Prompt assembly for chat turns

use crate::types::{ChatMessage, Intent, IntentCategory, RetrievedChunk, Role};

/// Base assistant persona and behavior rules
const SYSTEM_PROMPT: &str = r#"You are NexusAI, an intelligent enterprise assistant with the following capabilities:

1. **Information Retrieval**: You can answer questions based on provided context and knowledge. Always cite sources when available.

2. **Task Automation**: You can help users with tasks like:
   - Generating reports (daily, weekly, monthly summaries)
   - Sending notifications and reminders
   - Scheduling meetings and events
   - Data analysis and insights

3. **Response Guidelines**:
   - Be concise but thorough
   - If you don't have information, clearly state "I don't have that information in my knowledge base"
   - For task requests, confirm what action you'll take before executing
   - Always maintain a professional, helpful tone
   - Use markdown formatting for better readability

4. **Grounding**:
   - Never hallucinate or make up information
   - If uncertain, ask clarifying questions
   - Cite sources when referencing specific data

Current capabilities are limited to conversational assistance. For actual task execution (emails, scheduling, etc.), you'll simulate the actions and describe what would happen."#;

/// Builds the outbound message list for the completion gateway
pub struct PromptBuilder;

impl PromptBuilder {
    /// Format retrieved chunks as a numbered context block
    pub fn build_context(chunks: &[RetrievedChunk]) -> String {
        let mut context = String::new();
        for (i, chunk) in chunks.iter().enumerate() {
            context.push_str(&format!(
                "[{}] {} (section {})\n{}\n\n",
                i + 1,
                chunk.document_name,
                chunk.chunk_index + 1,
                chunk.content
            ));
        }
        context
    }

    /// Unique source document names in retrieval order, for citation display
    pub fn source_names(chunks: &[RetrievedChunk]) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for chunk in chunks {
            if !names.contains(&chunk.document_name) {
                names.push(chunk.document_name.clone());
            }
        }
        names
    }

    /// Assemble the full message list: persona, intent guidance, grounding
    /// context, then the conversation history verbatim.
    pub fn build_messages(
        history: &[ChatMessage],
        retrieved: &[RetrievedChunk],
        intent: &Intent,
    ) -> Vec<ChatMessage> {
        let mut system = String::from(SYSTEM_PROMPT);

        match intent.category {
            IntentCategory::TaskExecution => {
                system.push_str(
                    "\n\nThe user is asking for a task to be performed. Confirm the exact action before simulating it.",
                );
            }
            IntentCategory::DecisionSupport => {
                system.push_str(
                    "\n\nThe user is weighing a decision. Lay out the relevant trade-offs before recommending.",
                );
            }
            IntentCategory::InformationQuery | IntentCategory::General => {}
        }

        if !retrieved.is_empty() {
            system.push_str(
                "\n\nRelevant excerpts from the user's documents. Ground your answer in them and cite the document names:\n\n",
            );
            system.push_str(&Self::build_context(retrieved));
        }

        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(ChatMessage::new(Role::System, system));
        messages.extend(history.iter().cloned());
        messages
    }
}
