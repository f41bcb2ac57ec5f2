//! The fixed field catalog every extraction tries to fill.
//!
//! The list is advisory to the model: it is embedded in the prompt, but the
//! reply is never checked against it (see [`crate::output::ExtractionResult`]).

/// Field names in the order they are presented to the model and rendered.
pub const RFP_FIELDS: [&str; 20] = [
    "Bid Number",
    "Title",
    "Due Date",
    "Bid Submission Type",
    "Term of Bid",
    "Pre Bid Meeting Details",
    "Installation Requirements",
    "Bid Bond Requirement",
    "Delivery Timeline",
    "Payment Terms",
    "Required Documentation",
    "Manufacturer Registration",
    "Cooperative Contract Options",
    "Product Models",
    "Product Part Numbers",
    "Product Categories",
    "Contact Information",
    "Issuing Organization",
    "Bid Objective Summary",
    "Technical Specifications",
];

/// An ordered, immutable set of field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSchema {
    fields: &'static [&'static str],
}

/// The RFP catalog.
pub static RFP_SCHEMA: FieldSchema = FieldSchema {
    fields: &RFP_FIELDS,
};

impl FieldSchema {
    /// The built-in 20-field RFP schema.
    pub fn rfp() -> &'static FieldSchema {
        &RFP_SCHEMA
    }

    pub fn fields(&self) -> &'static [&'static str] {
        self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains(&name)
    }

    /// Field names joined with `", "`, as they appear in the prompt.
    pub fn joined(&self) -> String {
        self.fields.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn catalog_has_twenty_unique_fields() {
        let schema = FieldSchema::rfp();
        assert_eq!(schema.len(), 20);
        let unique: HashSet<_> = schema.fields().iter().collect();
        assert_eq!(unique.len(), 20);
    }

    #[test]
    fn catalog_order_is_stable() {
        let fields = FieldSchema::rfp().fields();
        assert_eq!(fields[0], "Bid Number");
        assert_eq!(fields[2], "Due Date");
        assert_eq!(fields[19], "Technical Specifications");
    }

    #[test]
    fn joined_uses_comma_space() {
        let joined = FieldSchema::rfp().joined();
        assert!(joined.starts_with("Bid Number, Title, Due Date, "));
        assert!(joined.ends_with("Bid Objective Summary, Technical Specifications"));
    }

    #[test]
    fn contains_is_exact_match() {
        let schema = FieldSchema::rfp();
        assert!(schema.contains("Payment Terms"));
        assert!(!schema.contains("payment terms"));
        assert!(!schema.contains("Budget"));
    }
}
