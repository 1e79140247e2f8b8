//! View table validator
//!
//! Checks a view table for entries that would be skipped or misbehave at
//! runtime: empty fields, duplicate class bindings, out-of-range alphas.

use crate::config::ViewTable;
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationIssue {
    EmptyField {
        index: usize,
        field: &'static str,
    },
    DuplicateClassBinding {
        class_binding: String,
        indices: Vec<usize>,
    },
    DuplicateViewName {
        view_name: String,
        indices: Vec<usize>,
    },
    AlphaOutOfRange {
        view_name: String,
        alpha: f32,
    },
    UnknownClassBinding {
        view_name: String,
        class_binding: String,
    },
    /// Negative, NaN, or too large for a `Duration`
    UnusableMessageHold {
        secs: f32,
    },
}

impl ValidationIssue {
    pub fn severity(&self) -> ValidationSeverity {
        match self {
            ValidationIssue::EmptyField { .. } => ValidationSeverity::Error,
            ValidationIssue::DuplicateClassBinding { .. }
            | ValidationIssue::DuplicateViewName { .. }
            | ValidationIssue::AlphaOutOfRange { .. }
            | ValidationIssue::UnknownClassBinding { .. }
            | ValidationIssue::UnusableMessageHold { .. } => ValidationSeverity::Warning,
        }
    }

    pub fn message(&self) -> String {
        match self {
            ValidationIssue::EmptyField { index, field } => {
                format!("Entry #{} has an empty '{}'", index, field)
            }
            ValidationIssue::DuplicateClassBinding {
                class_binding,
                indices,
            } => {
                format!(
                    "Class binding '{}' is declared by entries {:?}; only the first is used",
                    class_binding, indices
                )
            }
            ValidationIssue::DuplicateViewName { view_name, indices } => {
                format!(
                    "View name '{}' is shared by entries {:?}; lookups by type will see all of them",
                    view_name, indices
                )
            }
            ValidationIssue::AlphaOutOfRange { view_name, alpha } => {
                format!(
                    "View '{}' has debug_mask_alpha {} outside 0.0..=1.0",
                    view_name, alpha
                )
            }
            ValidationIssue::UnknownClassBinding {
                view_name,
                class_binding,
            } => {
                format!(
                    "View '{}' binds '{}', which no view type is registered for; it will be skipped",
                    view_name, class_binding
                )
            }
            ValidationIssue::UnusableMessageHold { secs } => {
                format!(
                    "message_hold_secs {} is not a usable duration; messages will hold for the default",
                    secs
                )
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationSeverity {
    Error,
    Warning,
}

/// Issues found in one table, in discovery order.
pub struct ValidationResult {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// True when at least one issue would break the table at runtime
    pub fn has_errors(&self) -> bool {
        !self.errors().is_empty()
    }

    pub fn errors(&self) -> Vec<&ValidationIssue> {
        self.of_severity(ValidationSeverity::Error)
    }

    pub fn warnings(&self) -> Vec<&ValidationIssue> {
        self.of_severity(ValidationSeverity::Warning)
    }

    fn of_severity(&self, severity: ValidationSeverity) -> Vec<&ValidationIssue> {
        self.issues
            .iter()
            .filter(|issue| issue.severity() == severity)
            .collect()
    }
}

/// Validate a view table on its own.
pub fn validate_table(table: &ViewTable) -> ValidationResult {
    let mut issues = Vec::new();

    for (index, entry) in table.views.iter().enumerate() {
        check_not_empty(&mut issues, index, "view_name", &entry.view_name);
        check_not_empty(&mut issues, index, "class_binding", &entry.class_binding);
        check_not_empty(&mut issues, index, "asset_path", &entry.asset_path);

        if !(0.0..=1.0).contains(&entry.debug_mask_alpha) {
            issues.push(ValidationIssue::AlphaOutOfRange {
                view_name: entry.view_name.clone(),
                alpha: entry.debug_mask_alpha,
            });
        }
    }

    if Duration::try_from_secs_f32(table.manager.message_hold_secs).is_err() {
        issues.push(ValidationIssue::UnusableMessageHold {
            secs: table.manager.message_hold_secs,
        });
    }

    for (class_binding, indices) in group_indices(table, |e| &e.class_binding) {
        issues.push(ValidationIssue::DuplicateClassBinding {
            class_binding,
            indices,
        });
    }
    for (view_name, indices) in group_indices(table, |e| &e.view_name) {
        issues.push(ValidationIssue::DuplicateViewName { view_name, indices });
    }

    ValidationResult { issues }
}

/// Validate a table against the class bindings a host actually registers.
pub fn validate_against_bindings<'a>(
    table: &ViewTable,
    known_bindings: impl IntoIterator<Item = &'a str>,
) -> ValidationResult {
    let known: Vec<&str> = known_bindings.into_iter().collect();
    let mut result = validate_table(table);

    for entry in &table.views {
        if !entry.class_binding.is_empty() && !known.contains(&entry.class_binding.as_str()) {
            result.issues.push(ValidationIssue::UnknownClassBinding {
                view_name: entry.view_name.clone(),
                class_binding: entry.class_binding.clone(),
            });
        }
    }

    result
}

fn check_not_empty(
    issues: &mut Vec<ValidationIssue>,
    index: usize,
    field: &'static str,
    value: &str,
) {
    if value.trim().is_empty() {
        issues.push(ValidationIssue::EmptyField { index, field });
    }
}

/// Non-empty keys that appear on more than one entry, in first-seen order.
fn group_indices<F>(table: &ViewTable, key: F) -> Vec<(String, Vec<usize>)>
where
    F: Fn(&crate::config::ViewConfigEntry) -> &String,
{
    let mut order: Vec<String> = Vec::new();
    let mut seen: HashMap<String, Vec<usize>> = HashMap::new();

    for (index, entry) in table.views.iter().enumerate() {
        let value = key(entry);
        if value.is_empty() {
            continue;
        }
        let slot = seen.entry(value.clone()).or_default();
        if slot.is_empty() {
            order.push(value.clone());
        }
        slot.push(index);
    }

    order
        .into_iter()
        .filter_map(|k| {
            let indices = seen.remove(&k)?;
            (indices.len() > 1).then_some((k, indices))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewConfigEntry;

    fn table(views: Vec<ViewConfigEntry>) -> ViewTable {
        ViewTable {
            views,
            ..ViewTable::default()
        }
    }

    #[test]
    fn test_default_table_is_clean() {
        let table = ViewTable::embedded_default().unwrap();
        let result = validate_table(&table);
        assert!(result.issues.is_empty());
    }

    #[test]
    fn test_empty_fields_are_errors() {
        let result = validate_table(&table(vec![ViewConfigEntry::new("", "Game.A", " ")]));
        assert!(result.has_errors());
        assert_eq!(result.errors().len(), 2);
        assert!(result.issues.contains(&ValidationIssue::EmptyField {
            index: 0,
            field: "asset_path"
        }));
    }

    #[test]
    fn test_duplicates_are_warnings() {
        let result = validate_table(&table(vec![
            ViewConfigEntry::new("A", "Game.A", "UI/A"),
            ViewConfigEntry::new("B", "Game.B", "UI/B"),
            ViewConfigEntry::new("A2", "Game.A", "UI/A2"),
        ]));

        assert!(!result.has_errors());
        assert_eq!(
            result.warnings(),
            vec![&ValidationIssue::DuplicateClassBinding {
                class_binding: "Game.A".to_string(),
                indices: vec![0, 2],
            }]
        );
    }

    #[test]
    fn test_alpha_range() {
        let result = validate_table(&table(vec![
            ViewConfigEntry::new("A", "Game.A", "UI/A").with_debug_alpha(1.5)
        ]));
        assert_eq!(result.warnings().len(), 1);
        assert!(result.warnings()[0].message().contains("1.5"));
    }

    #[test]
    fn test_unknown_bindings() {
        let t = table(vec![
            ViewConfigEntry::new("A", "Game.A", "UI/A"),
            ViewConfigEntry::new("B", "Game.B", "UI/B"),
        ]);
        let result = validate_against_bindings(&t, ["Game.A"]);
        assert_eq!(result.warnings().len(), 1);
        assert!(matches!(
            result.warnings()[0],
            ValidationIssue::UnknownClassBinding { view_name, .. } if view_name == "B"
        ));
    }

    #[test]
    fn test_unusable_message_hold_is_reported() {
        let mut t = ViewTable::parse_toml("[manager]\nmessage_hold_secs = inf\n").unwrap();
        let result = validate_table(&t);
        assert!(!result.has_errors());
        assert!(matches!(
            result.warnings().as_slice(),
            [ValidationIssue::UnusableMessageHold { secs }] if secs.is_infinite()
        ));

        t.manager.message_hold_secs = -1.0;
        assert_eq!(validate_table(&t).warnings().len(), 1);

        t.manager.message_hold_secs = 0.0;
        assert!(validate_table(&t).issues.is_empty());
    }
}
