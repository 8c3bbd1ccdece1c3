use crate::archive::NormalizedConversation;

/// Join every title and message body into one lower-cased scanning buffer.
///
/// Each piece is followed by a single space so adjacent texts never fuse
/// into one word.
pub fn flatten(conversations: &[NormalizedConversation]) -> String {
    let capacity: usize = conversations
        .iter()
        .map(|c| c.title.len() + 1 + c.messages.iter().map(|m| m.text.len() + 1).sum::<usize>())
        .sum();

    let mut buffer = String::with_capacity(capacity);
    for conv in conversations {
        buffer.push_str(&conv.title.to_lowercase());
        buffer.push(' ');
        for msg in &conv.messages {
            buffer.push_str(&msg.text.to_lowercase());
            buffer.push(' ');
        }
    }
    buffer
}
