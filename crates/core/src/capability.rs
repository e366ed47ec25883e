//! Capability strings of the form `<entityName>:<operation>`.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Read,
    Write,
    Delete,
}

impl Operation {
    pub const ALL: [Operation; 3] = [Operation::Read, Operation::Write, Operation::Delete];

    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Read => "read",
            Operation::Write => "write",
            Operation::Delete => "delete",
        }
    }
}

impl FromStr for Operation {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(Operation::Read),
            "write" => Ok(Operation::Write),
            "delete" => Ok(Operation::Delete),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Capability {
    pub entity: String,
    pub operation: Operation,
}

impl Capability {
    /// Parses `entity:operation`; the entity is not checked against a registry.
    pub fn parse(raw: &str) -> Option<Self> {
        let (entity, operation) = raw.split_once(':')?;
        if entity.is_empty() {
            return None;
        }
        Some(Self {
            entity: entity.to_string(),
            operation: operation.parse().ok()?,
        })
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.entity, self.operation.as_str())
    }
}

/// Checks every capability against the known entity names.
///
/// Returns all invalid entries, in input order, when any entry is malformed.
pub fn validate_capabilities<S: AsRef<str>>(
    capabilities: &[S],
    entity_names: &[String],
) -> Result<(), Vec<String>> {
    let known: HashSet<&str> = entity_names.iter().map(String::as_str).collect();
    let invalid: Vec<String> = capabilities
        .iter()
        .map(AsRef::as_ref)
        .filter(|raw| {
            Capability::parse(raw).is_none_or(|cap| !known.contains(cap.entity.as_str()))
        })
        .map(str::to_string)
        .collect();

    if invalid.is_empty() {
        Ok(())
    } else {
        Err(invalid)
    }
}

/// Message reported for rejected capability sets.
pub fn invalid_capabilities_message(invalid: &[String]) -> String {
    format!("Invalid capabilities: [{}]", invalid.join(", "))
}

/// Every capability the given entities allow.
pub fn all_capabilities(entity_names: &[String]) -> Vec<String> {
    entity_names
        .iter()
        .flat_map(|entity| {
            Operation::ALL
                .iter()
                .map(move |op| format!("{entity}:{}", op.as_str()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<String> {
        vec!["site".to_string(), "organization".to_string(), "consumer".to_string()]
    }

    #[test]
    fn test_parse() {
        let cap = Capability::parse("site:read").unwrap();
        assert_eq!(cap.entity, "site");
        assert_eq!(cap.operation, Operation::Read);
        assert_eq!(cap.to_string(), "site:read");
        assert!(Capability::parse("site").is_none());
        assert!(Capability::parse(":read").is_none());
        assert!(Capability::parse("site:execute").is_none());
    }

    #[test]
    fn test_valid_capabilities_pass() {
        let caps = ["site:read", "organization:write", "consumer:delete"];
        assert_eq!(validate_capabilities(&caps, &names()), Ok(()));
    }

    #[test]
    fn test_empty_list_passes() {
        let caps: [&str; 0] = [];
        assert_eq!(validate_capabilities(&caps, &names()), Ok(()));
    }

    #[test]
    fn test_all_invalid_entries_reported_together() {
        let caps = ["admin", "site:read", "site:execute", "audit:read"];
        let invalid = validate_capabilities(&caps, &names()).unwrap_err();
        assert_eq!(invalid, vec!["admin", "site:execute", "audit:read"]);
        assert_eq!(
            invalid_capabilities_message(&invalid),
            "Invalid capabilities: [admin, site:execute, audit:read]"
        );
    }

    #[test]
    fn test_all_capabilities() {
        let all = all_capabilities(&["site".to_string()]);
        assert_eq!(all, vec!["site:read", "site:write", "site:delete"]);
    }
}
