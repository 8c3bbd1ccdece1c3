//! Built-in demo archive for trying the tool without a real export.

use crate::archive::{RawConversation, RawMessage, SENDER_ASSISTANT, SENDER_HUMAN};

const DEMO: &[(&str, &str, &[&str])] = &[
    (
        "Debug React useEffect infinite loop",
        "2024-02-03T09:15:00Z",
        &[
            "My useEffect keeps firing and the component re-renders forever. Here is the function.",
            "The dependency array includes an object that is recreated on every render. Memoize it.",
            "Still seeing the error in the console, can you help me debug this bug?",
            "Move the fetch into a callback and check the stack trace for the first update.",
        ],
    ),
    (
        "Python script to clean CSV data",
        "2024-02-05T14:02:00Z",
        &[
            "Write a python script that loads a csv dataset and drops duplicate rows.",
            "Here is a pandas script that reads the file and calls drop_duplicates.",
            "Can you also add a summary of the columns?",
        ],
    ),
    (
        "Blog post draft on remote work",
        "2024-02-08T18:40:00Z",
        &[
            "Help me draft a blog article about remote work. Keep the tone friendly.",
            "Here is a first draft with a headline and three sections.",
            "Rewrite the intro paragraph and polish the conclusion.",
        ],
    ),
    (
        "Quarterly sales strategy review",
        "2024-02-12T11:20:00Z",
        &[
            "Review our quarterly sales numbers and suggest a pricing strategy for next quarter.",
            "Compare the revenue by customer segment before changing prices.",
            "Outline the steps for a roadmap we can present to investors.",
        ],
    ),
    (
        "Explain Rust ownership",
        "2024-02-15T08:05:00Z",
        &[
            "Explain how ownership and borrowing work in rust. What is a lifetime?",
            "Each value has one owner; references borrow without taking ownership.",
        ],
    ),
    (
        "Fix failing API integration test",
        "2024-02-18T16:45:00Z",
        &[
            "The api test fails with a 401 error after the server upgrade. How do I fix it?",
            "The token header name changed; update the client and re-run the test.",
        ],
    ),
];

/// Demo conversations, alternating human and assistant messages.
pub fn sample_conversations() -> Vec<RawConversation> {
    DEMO.iter()
        .enumerate()
        .map(|(i, &(title, created_at, texts))| RawConversation {
            uuid: format!("demo-{:02}", i + 1),
            name: Some(title.to_string()),
            created_at: created_at.to_string(),
            updated_at: created_at.to_string(),
            chat_messages: Some(
                texts
                    .iter()
                    .enumerate()
                    .map(|(j, text)| RawMessage {
                        uuid: format!("demo-{:02}-{:02}", i + 1, j + 1),
                        sender: if j % 2 == 0 { SENDER_HUMAN } else { SENDER_ASSISTANT }
                            .to_string(),
                        text: text.to_string(),
                        created_at: created_at.to_string(),
                    })
                    .collect(),
            ),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::{export_archive, normalize, parse_archive};

    #[test]
    fn test_sample_shape() {
        let convs = sample_conversations();
        assert_eq!(convs.len(), DEMO.len());
        let first = normalize(&convs).remove(0);
        assert!(first.messages[0].is_human());
        assert!(!first.messages[1].is_human());
    }

    #[test]
    fn test_sample_export_round_trip() {
        let convs = sample_conversations();
        let json = export_archive(&convs).unwrap();
        let reparsed = parse_archive(json.as_bytes()).unwrap();
        assert_eq!(reparsed, convs);
        assert_eq!(normalize(&reparsed), normalize(&convs));
    }
}
