//! Terminal stage: renders the human-readable report
//!
//! Always runs last. No routing occurs after this stage.

use crate::pipeline::record::{RequestRecord, Stage};
use tracing::debug;

const RULE: &str = "==================================================";

/// Placeholder used when no handler stored a result
const NO_RESULT: &str = "No result generated";

/// Finalizer stage: fold the record into a formatted report
///
/// The report embeds the original query, the stamped timestamp (defaulting
/// to now when absent), the arrow-joined transition log, and the stored
/// result or a placeholder.
pub fn run(mut record: RequestRecord) -> RequestRecord {
    let result = record.result.as_deref().unwrap_or(NO_RESULT);
    let timestamp = record.formatted_timestamp();
    let history = record.route_history();

    let report = format!(
        "\n{RULE}\n\
         AGENT RESPONSE\n\
         {RULE}\n\
         \n\
         Original Query: {}\n\
         Processed at: {timestamp}\n\
         Route History: {history}\n\
         \n\
         {result}\n\
         \n\
         {RULE}\n",
        record.input
    );

    record.result = Some(report);
    record.next = Stage::Done;

    debug!(stage = "final", "report generated");
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn stamped(input: &str) -> RequestRecord {
        let mut record = RequestRecord::new(input);
        record.timestamp = Some(
            DateTime::parse_from_rfc3339("2024-05-01T12:34:56Z")
                .unwrap()
                .with_timezone(&Utc),
        );
        record
    }

    #[test]
    fn test_report_embeds_query_timestamp_and_history() {
        let mut record = stamped("Calculate 2 + 2");
        record.push_transition("router", "math");
        record.push_transition("math", "final");
        record.result = Some("Mathematical Solution:\n4".to_string());

        let record = run(record);
        let report = record.result.unwrap();

        assert!(report.contains("Original Query: Calculate 2 + 2"));
        assert!(report.contains("Processed at: 2024-05-01 12:34:56"));
        assert!(report.contains("Route History: router -> math -> math -> final"));
        assert!(report.contains("Mathematical Solution:\n4"));
        assert_eq!(record.next, Stage::Done);
    }

    #[test]
    fn test_report_uses_placeholder_when_no_result() {
        let record = run(stamped("anything"));
        assert!(record.result.unwrap().contains("No result generated"));
    }

    #[test]
    fn test_report_is_banner_framed() {
        let record = run(stamped("anything"));
        let report = record.result.unwrap();
        assert_eq!(report.matches(RULE).count(), 3);
        assert_eq!(RULE.len(), 50);
    }
}
