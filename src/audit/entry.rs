//! Audit entry data structures
//!
//! Defines the structure of audit log entries including operation types,
//! entity types, and the entry format itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::diff::generate_diff;

/// Types of operations that can be audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Entity was created
    Create,
    /// Entity was deleted
    Delete,
    /// A budget period was closed with its rollover
    Close,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Create => write!(f, "CREATE"),
            Operation::Delete => write!(f, "DELETE"),
            Operation::Close => write!(f, "CLOSE"),
        }
    }
}

/// Types of entities that can be audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    BudgetPeriod,
    BudgetAllocation,
    Transaction,
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityType::BudgetPeriod => write!(f, "BudgetPeriod"),
            EntityType::BudgetAllocation => write!(f, "BudgetAllocation"),
            EntityType::Transaction => write!(f, "Transaction"),
        }
    }
}

/// A single audit log entry
///
/// Records one operation on an entity with optional before/after values
/// for tracking changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// When the operation occurred (UTC)
    pub timestamp: DateTime<Utc>,

    /// Type of operation performed
    pub operation: Operation,

    /// Type of entity affected
    pub entity_type: EntityType,

    /// ID of the affected entity
    pub entity_id: String,

    /// Human-readable description of the entity (e.g., period key)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_name: Option<String>,

    /// JSON representation of the entity before the operation (for updates/deletes)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<serde_json::Value>,

    /// JSON representation of the entity after the operation (for creates/updates)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<serde_json::Value>,

    /// Human-readable diff summary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff_summary: Option<String>,
}

impl AuditEntry {
    /// Create a new audit entry for a create operation
    pub fn create<T: Serialize>(
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            operation: Operation::Create,
            entity_type,
            entity_id: entity_id.into(),
            entity_name,
            before: None,
            after: serde_json::to_value(entity).ok(),
            diff_summary: None,
        }
    }

    /// Create a new audit entry for a delete operation
    pub fn delete<T: Serialize>(
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            operation: Operation::Delete,
            entity_type,
            entity_id: entity_id.into(),
            entity_name,
            before: serde_json::to_value(entity).ok(),
            after: None,
            diff_summary: None,
        }
    }

    /// Create a new audit entry for closing a budget period
    ///
    /// The diff summary captures what the close changed (status, rollover).
    pub fn close<T: Serialize>(
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        before: &T,
        after: &T,
    ) -> Self {
        let before = serde_json::to_value(before).ok();
        let after = serde_json::to_value(after).ok();
        let diff_summary = match (&before, &after) {
            (Some(b), Some(a)) => generate_diff(b, a),
            _ => None,
        };
        Self {
            timestamp: Utc::now(),
            operation: Operation::Close,
            entity_type: EntityType::BudgetPeriod,
            entity_id: entity_id.into(),
            entity_name,
            before,
            after,
            diff_summary,
        }
    }

    /// Format the entry for human-readable output
    pub fn format_human_readable(&self) -> String {
        let mut output = format!(
            "[{}] {} {} {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            self.operation,
            self.entity_type,
            self.entity_id
        );

        if let Some(name) = &self.entity_name {
            output.push_str(&format!(" ({})", name));
        }

        if let Some(diff) = &self.diff_summary {
            output.push_str(&format!("\n  Changes: {}", diff));
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_operation_display() {
        assert_eq!(Operation::Create.to_string(), "CREATE");
        assert_eq!(Operation::Delete.to_string(), "DELETE");
        assert_eq!(Operation::Close.to_string(), "CLOSE");
    }

    #[test]
    fn test_entity_type_display() {
        assert_eq!(EntityType::BudgetPeriod.to_string(), "BudgetPeriod");
        assert_eq!(EntityType::Transaction.to_string(), "Transaction");
    }

    #[test]
    fn test_create_entry() {
        let data = json!({"key": "2025-01-15", "total_income": 200000});
        let entry = AuditEntry::create(
            EntityType::BudgetPeriod,
            "per-12345678",
            Some("2025-01-15".to_string()),
            &data,
        );

        assert_eq!(entry.operation, Operation::Create);
        assert_eq!(entry.entity_type, EntityType::BudgetPeriod);
        assert_eq!(entry.entity_id, "per-12345678");
        assert!(entry.before.is_none());
        assert!(entry.after.is_some());
    }

    #[test]
    fn test_close_entry() {
        let before = json!({"status": "active", "rollover_out": 0});
        let after = json!({"status": "closed", "rollover_out": 2500});

        let entry = AuditEntry::close("per-12345678", Some("2025-01-01".to_string()), &before, &after);

        assert_eq!(entry.operation, Operation::Close);
        assert_eq!(entry.entity_type, EntityType::BudgetPeriod);
        assert!(entry.before.is_some());
        assert!(entry.after.is_some());

        let diff = entry.diff_summary.unwrap();
        assert!(diff.contains("status"));
        assert!(diff.contains("rollover_out"));
    }

    #[test]
    fn test_serialization() {
        let data = json!({"description": "Grocery Store"});
        let entry = AuditEntry::create(EntityType::Transaction, "txn-123", None, &data);

        let json = serde_json::to_string(&entry).unwrap();
        let deserialized: AuditEntry = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.operation, Operation::Create);
        assert_eq!(deserialized.entity_type, EntityType::Transaction);
    }

    #[test]
    fn test_human_readable_format() {
        let data = json!({"key": "2025-01-15"});
        let entry = AuditEntry::create(
            EntityType::BudgetPeriod,
            "per-12345678",
            Some("2025-01-15".to_string()),
            &data,
        );

        let formatted = entry.format_human_readable();
        assert!(formatted.contains("CREATE"));
        assert!(formatted.contains("BudgetPeriod"));
        assert!(formatted.contains("per-12345678"));
        assert!(formatted.contains("2025-01-15"));
    }
}
