//! Displayed log of the selected company.
//!
//! Log fetches are issued with a `LogTicket`. A response is applied only if
//! its ticket belongs to the current selection and is newer than whatever
//! was applied last, so a slow response for a previous company (or an
//! older request for the same one) can never overwrite newer content.

use tracing::debug;

/// Identifies one log request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogTicket {
    pub generation: u64,
    pub seq: u64,
}

#[derive(Debug, Default)]
pub struct LogBuffer {
    company: Option<String>,
    content: String,
    generation: u64,
    next_seq: u64,
    last_applied_seq: Option<u64>,
}

impl LogBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch the buffer to another company (or none).
    ///
    /// Clears the content and invalidates every outstanding ticket.
    /// Returns the new generation.
    pub fn switch_to(&mut self, company: Option<String>) -> u64 {
        self.generation += 1;
        self.company = company;
        self.content.clear();
        self.last_applied_seq = None;
        debug!(company = ?self.company, generation = self.generation, "log buffer switched");
        self.generation
    }

    /// Reserve a ticket for a new request against the current company.
    pub fn begin_request(&mut self) -> LogTicket {
        self.next_seq += 1;
        LogTicket {
            generation: self.generation,
            seq: self.next_seq,
        }
    }

    fn accepts(&self, ticket: LogTicket) -> bool {
        ticket.generation == self.generation
            && self.company.is_some()
            && self.last_applied_seq.map_or(true, |last| ticket.seq > last)
    }

    /// Replace the content with a fetched log.
    ///
    /// Returns false when the response is stale and was discarded.
    pub fn apply(&mut self, ticket: LogTicket, content: String) -> bool {
        if !self.accepts(ticket) {
            debug!(?ticket, generation = self.generation, "discarding stale log response");
            return false;
        }
        self.content = content;
        self.last_applied_seq = Some(ticket.seq);
        true
    }

    /// Replace the content with an error notice for a failed fetch.
    pub fn apply_error(&mut self, ticket: LogTicket, message: &str) -> bool {
        let Some(company) = self.company.clone() else {
            return false;
        };
        self.apply(
            ticket,
            format!("Error loading logs for {}: {}", company, message),
        )
    }

    pub fn company(&self) -> Option<&str> {
        self.company.as_deref()
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_switch_clears_content() {
        let mut buffer = LogBuffer::new();
        buffer.switch_to(Some("Acme".to_string()));
        let ticket = buffer.begin_request();
        assert!(buffer.apply(ticket, "line one\n".to_string()));

        buffer.switch_to(Some("Globex".to_string()));

        assert_eq!(buffer.content(), "");
        assert_eq!(buffer.company(), Some("Globex"));
    }

    #[test]
    fn test_response_for_previous_company_is_discarded() {
        let mut buffer = LogBuffer::new();
        buffer.switch_to(Some("Acme".to_string()));
        let slow = buffer.begin_request();

        buffer.switch_to(Some("Globex".to_string()));
        let fresh = buffer.begin_request();
        assert!(buffer.apply(fresh, "globex log".to_string()));

        assert!(!buffer.apply(slow, "acme log".to_string()));
        assert_eq!(buffer.content(), "globex log");
    }

    #[test]
    fn test_older_request_cannot_overwrite_newer_response() {
        let mut buffer = LogBuffer::new();
        buffer.switch_to(Some("Acme".to_string()));
        let first = buffer.begin_request();
        let second = buffer.begin_request();

        assert!(buffer.apply(second, "newer".to_string()));
        assert!(!buffer.apply(first, "older".to_string()));
        assert_eq!(buffer.content(), "newer");
    }

    #[test]
    fn test_apply_error_formats_message() {
        let mut buffer = LogBuffer::new();
        buffer.switch_to(Some("Acme".to_string()));
        let ticket = buffer.begin_request();

        assert!(buffer.apply_error(ticket, "connection refused"));
        assert_eq!(
            buffer.content(),
            "Error loading logs for Acme: connection refused"
        );
    }

    #[test]
    fn test_nothing_applies_without_selection() {
        let mut buffer = LogBuffer::new();
        buffer.switch_to(None);
        let ticket = buffer.begin_request();

        assert!(!buffer.apply(ticket, "orphan".to_string()));
        assert!(!buffer.apply_error(ticket, "boom"));
        assert_eq!(buffer.content(), "");
    }
}
