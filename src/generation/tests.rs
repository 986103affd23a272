use super::*;
use crate::extraction::FileType;
use crate::store::DocumentMetadata;
use chrono::{TimeZone, Utc};

fn retrieved(id: &str, text: &str, filename: &str) -> RetrievedDocument {
    RetrievedDocument {
        id: id.to_string(),
        text: text.to_string(),
        metadata: DocumentMetadata {
            filename: filename.to_string(),
            file_type: FileType::Pdf,
            upload_date: Utc
                .with_ymd_and_hms(2024, 6, 1, 0, 0, 0)
                .single()
                .expect("valid timestamp"),
        },
    }
}

#[test]
fn prompt_includes_context_and_question() {
    let documents = vec![
        retrieved("a", "The campus library opens at 8am.", "campus.pdf"),
        retrieved("b", "Fees are due each semester.", "fees.pdf"),
    ];

    let prompt = build_prompt("When does the library open?", &documents);

    assert!(prompt.contains("The campus library opens at 8am."));
    assert!(prompt.contains("Fees are due each semester."));
    assert!(prompt.contains("Question: When does the library open?"));
    // Context is ordered by retrieval rank
    let library_pos = prompt.find("library opens").expect("context present");
    let fees_pos = prompt.find("Fees are due").expect("context present");
    assert!(library_pos < fees_pos);
}

#[test]
fn sources_follow_retrieval_order() {
    let documents = vec![
        retrieved("a", "text a", "first.pdf"),
        retrieved("b", "text b", "second.pdf"),
    ];

    assert_eq!(
        source_filenames(&documents),
        vec!["first.pdf".to_string(), "second.pdf".to_string()]
    );
}

#[test]
fn format_sources_renders_list() {
    let answer = Answer {
        text: "an answer".to_string(),
        sources: vec!["first.pdf".to_string(), "second.pdf".to_string()],
    };

    assert_eq!(format_sources(&answer), "- first.pdf\n- second.pdf");
}

#[test]
fn format_sources_empty_when_no_sources() {
    let answer = Answer {
        text: NO_CONTEXT_REPLY.to_string(),
        sources: Vec::new(),
    };

    assert_eq!(format_sources(&answer), "");
}
