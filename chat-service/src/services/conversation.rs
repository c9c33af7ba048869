//! Turns the client's chat history and attachments into provider content.
//!
//! Only image attachments are embedded in the current turn. Audio, video, PDF
//! and text uploads pass validation and are listed back to the client, but
//! they are not forwarded to the provider.

use crate::error::ChatError;
use crate::models::{ChatTurn, Content, ContentRole, EncodedFile, Segment};

/// Build the provider content list.
///
/// Every turn but the last becomes a history entry. The last turn is the
/// current user message: one inline segment per image attachment, followed by
/// exactly one text segment (empty when there are no turns at all).
pub fn assemble(turns: &[ChatTurn], files: &[EncodedFile]) -> Result<Vec<Content>, ChatError> {
    let history = match turns.split_last() {
        Some((_, history)) => history,
        None => &[],
    };

    let mut contents: Vec<Content> = history
        .iter()
        .map(|turn| Content {
            role: if turn.is_user() {
                ContentRole::User
            } else {
                ContentRole::Model
            },
            parts: vec![Segment::Text(turn.content.clone())],
        })
        .collect();

    let mut current_parts = Vec::with_capacity(files.len() + 1);
    for file in files.iter().filter(|f| f.is_image()) {
        let data = file.decode().map_err(|e| {
            ChatError::Internal(format!("Failed to decode attachment {}: {}", file.name, e))
        })?;
        current_parts.push(Segment::InlineMedia {
            mime_type: file.mime_type.clone(),
            data,
        });
    }
    current_parts.push(Segment::Text(current_text(turns).to_string()));

    contents.push(Content {
        role: ContentRole::User,
        parts: current_parts,
    });

    Ok(contents)
}

/// Text of the current (last) turn, or `""` for an empty conversation.
pub fn current_text(turns: &[ChatTurn]) -> &str {
    turns.last().map(|turn| turn.content.as_str()).unwrap_or("")
}

/// Strip the `models/` prefix that catalog listings put on identifiers.
pub fn normalize_model_id(model: &str) -> String {
    model.replace("models/", "")
}
