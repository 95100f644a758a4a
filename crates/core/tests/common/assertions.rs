//! Assertion helpers over emitted event sequences.

use mm_protocol::ipc::Event;

/// Contents of every `LogReplaced` event, in order.
#[allow(dead_code)]
pub fn log_contents(events: &[Event]) -> Vec<(String, String)> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::LogReplaced { company, content } => Some((company.clone(), content.clone())),
            _ => None,
        })
        .collect()
}

/// Whether the sequence contains a `ProcessCompleted` for `company`.
#[allow(dead_code)]
pub fn has_completed(events: &[Event], company: &str) -> bool {
    events
        .iter()
        .any(|e| matches!(e, Event::ProcessCompleted { company: c } if c == company))
}

/// Assert that the log was cleared for `company` before any of its content arrived.
#[allow(dead_code)]
pub fn assert_cleared_before_content(events: &[Event], company: &str) {
    let cleared = events.iter().position(|e| {
        matches!(e, Event::LogCleared { company: Some(c) } if c == company)
    });
    let first_content = events.iter().position(|e| {
        matches!(e, Event::LogReplaced { company: c, .. } if c == company)
    });

    let Some(cleared) = cleared else {
        panic!("No LogCleared for {} in {:?}", company, events);
    };
    if let Some(first_content) = first_content {
        assert!(
            cleared < first_content,
            "LogCleared for {} must precede its content: {:?}",
            company,
            events
        );
    }
}
