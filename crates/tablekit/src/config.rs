use std::env;

use tablekit_core::storage::MAX_BATCH_WRITE;

/// Library configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Single table holding every entity (default: "tablekit")
    pub table_name: String,
    /// IMS organizations allowed to own consumers (default: empty)
    pub s2s_allowed_ims_org_ids: Vec<String>,
    /// Items per batch write (default and maximum: 25)
    pub batch_size: usize,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `DYNAMODB_TABLE_NAME` - Table name (default: "tablekit")
    /// - `S2S_ALLOWED_IMS_ORG_IDS` - Comma separated IMS org ids (default: none)
    /// - `TABLEKIT_BATCH_SIZE` - Batch write size, clamped to 1..=25 (default: 25)
    pub fn from_env() -> Self {
        Self {
            table_name: env::var("DYNAMODB_TABLE_NAME").unwrap_or_else(|_| "tablekit".to_string()),
            s2s_allowed_ims_org_ids: env::var("S2S_ALLOWED_IMS_ORG_IDS")
                .map(|raw| parse_list(&raw))
                .unwrap_or_default(),
            batch_size: env::var("TABLEKIT_BATCH_SIZE")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
                .map(|size| size.clamp(1, MAX_BATCH_WRITE))
                .unwrap_or(MAX_BATCH_WRITE),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            table_name: "tablekit".to_string(),
            s2s_allowed_ims_org_ids: Vec::new(),
            batch_size: MAX_BATCH_WRITE,
        }
    }
}

/// Splits a comma separated list, trimming entries and dropping empty ones.
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_trims_and_drops_empty_entries() {
        assert_eq!(
            parse_list(" org-a@AdobeOrg, ,org-b@AdobeOrg ,"),
            vec!["org-a@AdobeOrg", "org-b@AdobeOrg"]
        );
        assert!(parse_list("").is_empty());
    }

    #[test]
    fn test_default_values() {
        let config = Config::default();

        assert_eq!(config.table_name, "tablekit");
        assert!(config.s2s_allowed_ims_org_ids.is_empty());
        assert_eq!(config.batch_size, 25);
    }

    #[test]
    fn test_from_env() {
        // Only this test touches these variables.
        env::set_var("DYNAMODB_TABLE_NAME", "entities");
        env::set_var("S2S_ALLOWED_IMS_ORG_IDS", "a@AdobeOrg,b@AdobeOrg");
        env::set_var("TABLEKIT_BATCH_SIZE", "100");

        let config = Config::from_env();

        env::remove_var("DYNAMODB_TABLE_NAME");
        env::remove_var("S2S_ALLOWED_IMS_ORG_IDS");
        env::remove_var("TABLEKIT_BATCH_SIZE");

        assert_eq!(config.table_name, "entities");
        assert_eq!(config.s2s_allowed_ims_org_ids, vec!["a@AdobeOrg", "b@AdobeOrg"]);
        assert_eq!(config.batch_size, 25);
    }
}
