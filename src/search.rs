use crate::error::ConfigError;

/// Accumulates Gerrit search clauses in insertion order.
#[derive(Debug, Default)]
pub struct SearchQueryBuilder {
    terms: Vec<String>,
}

impl SearchQueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&mut self, status: &str) -> &mut Self {
        self.terms.push(format!("status:{status}"));
        self
    }

    pub fn repo(&mut self, repository: &str) -> &mut Self {
        self.terms.push(format!("repo:{repository}"));
        self
    }

    pub fn merged_after(&mut self, date: &str) -> &mut Self {
        self.terms.push(format!("mergedafter:{date}"));
        self
    }

    pub fn build(&self) -> String {
        self.terms.join(" ")
    }
}

/// Builds `status:<status> repo:<repository> mergedafter:<date>`.
///
/// The query string is part of the emitted document, so clause order and
/// separators are fixed.
pub fn build_query(
    status: &str,
    repository: &str,
    merged_after: &str,
) -> Result<String, ConfigError> {
    let status = non_empty(status, "status")?;
    let repository = non_empty(repository, "repository")?;
    let merged_after = non_empty(merged_after, "merged_after")?;

    Ok(SearchQueryBuilder::new()
        .status(status)
        .repo(repository)
        .merged_after(merged_after)
        .build())
}

fn non_empty<'a>(value: &'a str, field: &'static str) -> Result<&'a str, ConfigError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ConfigError::EmptyField(field));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clauses_in_fixed_order() {
        assert_eq!(
            build_query("merged", "openstack/barbican", "2025-08-29").unwrap(),
            "status:merged repo:openstack/barbican mergedafter:2025-08-29"
        );
    }

    #[test]
    fn surrounding_whitespace_is_dropped() {
        assert_eq!(
            build_query(" open ", "openstack/nova\n", "2025-01-01").unwrap(),
            "status:open repo:openstack/nova mergedafter:2025-01-01"
        );
    }

    #[test]
    fn repository_format_is_not_checked() {
        assert_eq!(
            build_query("abandoned", "barbican", "2025-01-01").unwrap(),
            "status:abandoned repo:barbican mergedafter:2025-01-01"
        );
    }

    #[test]
    fn empty_fields_are_rejected() {
        assert!(matches!(
            build_query("merged", "", "2025-08-29"),
            Err(ConfigError::EmptyField("repository"))
        ));
        assert!(matches!(
            build_query("  ", "openstack/barbican", "2025-08-29"),
            Err(ConfigError::EmptyField("status"))
        ));
    }

    #[test]
    fn identical_inputs_give_identical_queries() {
        let first = build_query("merged", "openstack/barbican", "2025-08-29").unwrap();
        let second = build_query("merged", "openstack/barbican", "2025-08-29").unwrap();
        assert_eq!(first, second);
    }
}
