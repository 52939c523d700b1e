//! Parsing of flat bulk permission-check strings.
//!
//! A batch is a single string of records separated by `;`, each record a
//! fixed-order list of `:`-separated fields:
//!
//! ```text
//! resourceType:resourceId:permission:subjectType:subjectId[:subjectRelation]
//! ```
//!
//! Record order is load-bearing: the permission service answers with a pair
//! array aligned by index, and results are zipped back against the parsed
//! items in submission order.

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Separator between check records in a batch string.
pub const RECORD_SEPARATOR: char = ';';
/// Separator between fields within a record.
pub const FIELD_SEPARATOR: char = ':';

/// One parsed permission check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkCheckItem {
    pub resource_type: String,
    pub resource_id: String,
    pub permission: String,
    pub subject_type: String,
    pub subject_id: String,
    /// Optional relation on the subject side. `None` when the record had
    /// five fields.
    pub subject_relation: Option<String>,
}

impl BulkCheckItem {
    /// `type:id` reference to the checked resource.
    pub fn resource_ref(&self) -> String {
        format!("{}:{}", self.resource_type, self.resource_id)
    }

    /// `type:id[#relation]` reference to the checked subject.
    pub fn subject_ref(&self) -> String {
        let mut subject = format!("{}:{}", self.subject_type, self.subject_id);
        if let Some(relation) = &self.subject_relation {
            subject.push('#');
            subject.push_str(relation);
        }
        subject
    }
}

/// Parse a batch string into check items, preserving input order.
///
/// Records and fields are whitespace-trimmed; empty records and empty fields
/// are dropped before the field count is checked. A record that does not end
/// up with exactly 5 or 6 fields fails the whole batch, as does a batch with
/// no records at all.
pub fn parse_checks(input: &str) -> Result<Vec<BulkCheckItem>, ParseError> {
    let mut items = Vec::new();

    for record in input.split(RECORD_SEPARATOR) {
        let record = record.trim();
        if record.is_empty() {
            continue;
        }

        let fields: Vec<&str> = record
            .split(FIELD_SEPARATOR)
            .map(str::trim)
            .filter(|field| !field.is_empty())
            .collect();

        if !(5..=6).contains(&fields.len()) {
            return Err(ParseError::malformed(record));
        }

        items.push(BulkCheckItem {
            resource_type: fields[0].to_string(),
            resource_id: fields[1].to_string(),
            permission: fields[2].to_string(),
            subject_type: fields[3].to_string(),
            subject_id: fields[4].to_string(),
            subject_relation: fields.get(5).map(|relation| relation.to_string()),
        });
    }

    if items.is_empty() {
        return Err(ParseError::EmptyBatch);
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn two_records_parse_in_order() {
        let items =
            parse_checks("document:doc1:view:user:john;folder:folder1:read:user:jane").unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].resource_ref(), "document:doc1");
        assert_eq!(items[0].permission, "view");
        assert_eq!(items[0].subject_ref(), "user:john");
        assert_eq!(items[1].resource_ref(), "folder:folder1");
        assert_eq!(items[1].subject_ref(), "user:jane");
    }

    #[test]
    fn sixth_field_is_subject_relation() {
        let items = parse_checks("document:doc1:view:group:eng:member").unwrap();

        assert_eq!(items[0].subject_relation.as_deref(), Some("member"));
        assert_eq!(items[0].subject_ref(), "group:eng#member");
    }

    #[test]
    fn five_fields_leave_subject_relation_absent() {
        let items = parse_checks("document:doc1:view:user:john").unwrap();

        assert_eq!(items[0].subject_relation, None);
        assert_eq!(items[0].subject_ref(), "user:john");
    }

    #[test]
    fn short_record_fails_whole_batch_naming_it() {
        let err =
            parse_checks("document:doc1:view:user:john;document:doc1:view").unwrap_err();

        assert!(matches!(err, ParseError::MalformedRecord { .. }));
        assert!(err.to_string().contains("document:doc1:view"));
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case(";;;")]
    fn empty_input_is_rejected(#[case] input: &str) {
        assert_eq!(parse_checks(input), Err(ParseError::EmptyBatch));
    }

    #[rstest]
    #[case("document:doc1:view")]
    #[case("document:doc1:view:user")]
    #[case("a:b:c:d:e:f:g")]
    fn wrong_arity_is_rejected(#[case] record: &str) {
        assert!(matches!(
            parse_checks(record),
            Err(ParseError::MalformedRecord { .. })
        ));
    }

    #[test]
    fn whitespace_and_empty_records_are_tolerated() {
        let items =
            parse_checks(" document : doc1 : view : user : john ; ;folder:f1:read:user:jane;")
                .unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].resource_type, "document");
        assert_eq!(items[0].subject_id, "john");
    }

    #[test]
    fn empty_fields_are_dropped_before_counting() {
        // A doubled separator collapses, leaving too few fields.
        let err = parse_checks("document::view:user:john").unwrap_err();
        assert!(matches!(err, ParseError::MalformedRecord { .. }));

        // A trailing separator collapses harmlessly.
        let items = parse_checks("document:doc1:view:user:john:").unwrap();
        assert_eq!(items[0].subject_relation, None);
    }
}
