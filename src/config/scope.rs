//! Delete scope parsing.

use json_types::DeleteScope;

/// Parse a delete scope name such as "matching-keys" or "all_keys".
///
/// Accepts:
/// - "matching-keys", "matching_keys", "matching"
/// - "all-keys", "all_keys", "all"
pub fn parse_delete_scope(s: &str) -> anyhow::Result<DeleteScope> {
    let s = s.trim();
    if s.is_empty() {
        anyhow::bail!("Empty delete scope");
    }

    match s.to_ascii_lowercase().replace('_', "-").as_str() {
        "matching-keys" | "matching" => Ok(DeleteScope::MatchingKeys),
        "all-keys" | "all" => Ok(DeleteScope::AllKeys),
        other => {
            anyhow::bail!("Invalid delete scope: {other} (expected matching-keys or all-keys)")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_delete_scope() {
        assert_eq!(parse_delete_scope("matching-keys").unwrap(), DeleteScope::MatchingKeys);
        assert_eq!(parse_delete_scope("all_keys").unwrap(), DeleteScope::AllKeys);
        assert_eq!(parse_delete_scope(" ALL ").unwrap(), DeleteScope::AllKeys);
        assert!(parse_delete_scope("").is_err());
        assert!(parse_delete_scope("everything").is_err());
    }
}
