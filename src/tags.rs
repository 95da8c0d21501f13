/// Keyword groups consulted in order. Only the first keyword found in a term
/// is used, even when a later group would have matched a vault tag.
const KEYWORD_GROUPS: &[(&str, &[&str])] = &[
    ("programming", &["computer-science", "software", "coding"]),
    ("computer", &["computer-science", "software"]),
    ("history", &["history"]),
    ("philosophy", &["philosophy"]),
    ("science", &["science", "physics", "biology", "chemistry"]),
    ("fiction", &["literature", "fiction"]),
    ("psychology", &["psychology", "neuroscience"]),
    ("economics", &["economics"]),
    ("business", &["economics", "business"]),
    ("math", &["mathematics"]),
    ("biology", &["biology"]),
    ("physics", &["physics"]),
    ("politics", &["politics"]),
    ("sociology", &["sociology"]),
];

/// Map a free-text genre or category onto an existing vault tag.
///
/// The first keyword group whose keyword occurs in `term` is walked candidate by
/// candidate; a vault tag matches when either string contains the other
/// (case-insensitive). Without a keyword hit the term itself is matched against
/// the vault tags the same way. The first vault tag in vault order wins.
pub fn fuzzy_match_tag(term: &str, vault_tags: &[String]) -> Option<String> {
    if vault_tags.is_empty() {
        return None;
    }

    let term_lower = term.to_lowercase();

    if let Some((_, candidates)) = KEYWORD_GROUPS
        .iter()
        .find(|(keyword, _)| term_lower.contains(keyword))
    {
        for candidate in candidates.iter() {
            let hit = vault_tags.iter().find(|tag| {
                let tag_lower = tag.to_lowercase();
                tag_lower.contains(candidate) || candidate.contains(tag_lower.as_str())
            });
            if let Some(tag) = hit {
                return Some(tag.clone());
            }
        }
    }

    vault_tags
        .iter()
        .find(|tag| {
            let tag_lower = tag.to_lowercase();
            tag_lower.contains(&term_lower) || term_lower.contains(tag_lower.as_str())
        })
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_keyword_group_match() {
        let vault = tags(&["computer-science", "fiction"]);
        assert_eq!(
            fuzzy_match_tag("functional programming", &vault),
            Some("computer-science".to_string())
        );
    }

    #[test]
    fn test_no_match() {
        let vault = tags(&["computer-science", "fiction"]);
        assert_eq!(fuzzy_match_tag("dinosaurs", &vault), None);
    }

    #[test]
    fn test_empty_vault() {
        assert_eq!(fuzzy_match_tag("programming", &[]), None);
    }

    #[test]
    fn test_candidate_order_then_vault_order() {
        let vault = tags(&["Coding", "Software-Engineering"]);
        // "software" is listed before "coding" in the programming group
        assert_eq!(
            fuzzy_match_tag("programming", &vault),
            Some("Software-Engineering".to_string())
        );
    }

    #[test]
    fn test_tag_contained_in_candidate() {
        let vault = tags(&["Science"]);
        // candidate "computer-science" contains the tag "science"
        assert_eq!(fuzzy_match_tag("computer", &vault), Some("Science".to_string()));
    }

    #[test]
    fn test_first_group_shadows_later_groups() {
        // "science fiction" hits the science group first; its candidates miss,
        // so the fiction group is never consulted and the direct fallback runs.
        let vault = tags(&["Literature"]);
        assert_eq!(fuzzy_match_tag("science fiction", &vault), None);
    }

    #[test]
    fn test_direct_fallback() {
        let vault = tags(&["Cooking", "Travel-Writing"]);
        assert_eq!(fuzzy_match_tag("travel", &vault), Some("Travel-Writing".to_string()));
        assert_eq!(fuzzy_match_tag("cooking & baking", &vault), Some("Cooking".to_string()));
    }
}
