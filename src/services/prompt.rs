//! Outbound prompt composition.

use crate::models::Attachment;

/// Deterministic concatenation of the current message and any document
/// attachments, in the order supplied. Image attachments are intentionally
/// excluded: the text wire path carries no multimodal payload, and forwarding
/// image data is a documented extension point rather than wired-up behavior.
/// No history is injected; each submission is stateless for the model.
pub fn build_prompt(message: &str, attachments: &[Attachment]) -> String {
    let mut prompt = String::new();
    prompt.push_str(message.trim());
    prompt.push('\n');

    let documents: Vec<&Attachment> = attachments.iter().filter(|a| a.is_document()).collect();
    if !documents.is_empty() {
        prompt.push_str("\n\nAttached Documents:\n");
        for (i, doc) in documents.iter().enumerate() {
            prompt.push_str(&format!("\n--- Document {}: {} ---\n", i + 1, doc.file_name));
            prompt.push_str(&doc.content);
            prompt.push('\n');
        }
    }

    prompt
}
