//! Name derivation helpers shared by the schema builder and the registry.

/// `SiteEnrollment` -> `siteEnrollment`.
pub fn decapitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `baseURL` -> `BaseURL`.
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `SiteEnrollment` -> `SITE_ENROLLMENT`.
pub fn upper_snake(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_uppercase() && i > 0 {
            out.push('_');
        }
        out.extend(c.to_uppercase());
    }
    out
}

/// Foreign key attribute for a reference target: `Organization` -> `organizationId`.
pub fn foreign_key_for(target: &str) -> String {
    format!("{}Id", decapitalize(target))
}

/// Index id derived from its partition attributes: `["siteId"]` -> `bySiteId`.
pub fn index_id_for(partition: &[String]) -> String {
    let joined: Vec<String> = partition.iter().map(|name| capitalize(name)).collect();
    format!("by{}", joined.join("And"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decapitalize_and_capitalize() {
        assert_eq!(decapitalize("SiteEnrollment"), "siteEnrollment");
        assert_eq!(capitalize("baseURL"), "BaseURL");
        assert_eq!(decapitalize(""), "");
    }

    #[test]
    fn test_upper_snake() {
        assert_eq!(upper_snake("Site"), "SITE");
        assert_eq!(upper_snake("SiteEnrollmentV2"), "SITE_ENROLLMENT_V2");
    }

    #[test]
    fn test_derived_names() {
        assert_eq!(foreign_key_for("Organization"), "organizationId");
        assert_eq!(
            index_id_for(&["imsOrgId".to_string(), "status".to_string()]),
            "byImsOrgIdAndStatus"
        );
    }
}
