//! Log group resolution.
//!
//! Maps a base name and environment tag to exactly one log group by suffix
//! matching over the full listing. Ambiguity is always reported, never
//! broken by a heuristic.

#![warn(clippy::all, rust_2018_idioms)]

use std::fmt;

use crate::app::data_plane::cloudwatch_logs::{LogGroupDescriptor, LogGroupLister};
use crate::app::error::{ExportError, ExportResult, ResolutionError};

/// The single log group an export run reads from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLogGroup(String);

impl ResolvedLogGroup {
    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn into_name(self) -> String {
        self.0
    }
}

impl fmt::Display for ResolvedLogGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Suffix a log group name must end with: `{base_name}-{env}`
pub fn required_suffix(base_name: &str, env: &str) -> String {
    format!("{}-{}", base_name, env)
}

/// Matches accumulated across listing pages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuffixMatches {
    suffix: String,
    matches: Vec<String>,
}

impl SuffixMatches {
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
            matches: Vec::new(),
        }
    }

    /// Fold one listing page into the matches.
    pub fn absorb(mut self, page: &[LogGroupDescriptor]) -> Self {
        self.matches.extend(
            page.iter()
                .filter(|group| group.name.ends_with(&self.suffix))
                .map(|group| group.name.clone()),
        );
        self
    }

    pub fn matches(&self) -> &[String] {
        &self.matches
    }

    /// Exactly one match resolves; zero or several is an error.
    pub fn into_resolved(mut self) -> ExportResult<ResolvedLogGroup> {
        match self.matches.len() {
            0 => Err(ResolutionError::NotFound {
                suffix: self.suffix,
            }
            .into()),
            1 => Ok(ResolvedLogGroup(self.matches.remove(0))),
            _ => {
                self.matches.sort();
                Err(ResolutionError::Ambiguous {
                    suffix: self.suffix,
                    candidates: self.matches,
                }
                .into())
            }
        }
    }
}

/// Resolve `{base_name}-{env}` against every log group `lister` can see.
pub fn resolve_log_group<L>(
    base_name: &str,
    env: &str,
    lister: &mut L,
) -> ExportResult<ResolvedLogGroup>
where
    L: LogGroupLister + ?Sized,
{
    if base_name.is_empty() {
        return Err(ExportError::validation("Base log group name cannot be empty"));
    }
    if env.is_empty() {
        return Err(ExportError::validation("--env is required and cannot be empty"));
    }

    let mut state = SuffixMatches::new(required_suffix(base_name, env));
    let mut next_token: Option<String> = None;
    let mut pages = 0usize;
    loop {
        let page = lister.list_page(next_token.as_deref())?;
        pages += 1;
        state = state.absorb(&page.log_groups);
        match page.next_token {
            Some(token) => next_token = Some(token),
            None => break,
        }
    }

    tracing::debug!(
        "Scanned {} log group page(s), {} match(es) for suffix '{}'",
        pages,
        state.matches().len(),
        state.suffix
    );
    let resolved = state.into_resolved()?;
    tracing::info!("Resolved log group: {}", resolved);
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::data_plane::cloudwatch_logs::InMemoryPages;

    fn groups(names: &[&str]) -> Vec<LogGroupDescriptor> {
        names.iter().map(|n| LogGroupDescriptor::new(*n)).collect()
    }

    #[test]
    fn test_single_match_across_pages() {
        let mut lister = InMemoryPages::new(vec![
            groups(&["/aws/lambda/billing-sit", "/aws/lambda/orders-api-prod"]),
            groups(&["/aws/lambda/orders-api-sit"]),
            groups(&[]),
        ]);
        let resolved = resolve_log_group("orders-api", "sit", &mut lister).unwrap();
        assert_eq!(resolved.name(), "/aws/lambda/orders-api-sit");
        assert_eq!(lister.requests_served(), 3);
    }

    #[test]
    fn test_no_match_names_suffix() {
        let mut lister = InMemoryPages::new(vec![groups(&["/aws/lambda/orders-api-prod"])]);
        let err = resolve_log_group("orders-api", "sit", &mut lister).unwrap_err();
        match err {
            ExportError::Resolution(ResolutionError::NotFound { suffix }) => {
                assert_eq!(suffix, "orders-api-sit")
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_ambiguous_match_lists_sorted_candidates() {
        let mut lister = InMemoryPages::new(vec![
            groups(&["/zeta/svc-sit"]),
            groups(&["/alpha/svc-sit", "/alpha/svc-prod"]),
        ]);
        let err = resolve_log_group("svc", "sit", &mut lister).unwrap_err();
        match err {
            ExportError::Resolution(ResolutionError::Ambiguous { suffix, candidates }) => {
                assert_eq!(suffix, "svc-sit");
                assert_eq!(candidates, vec!["/alpha/svc-sit", "/zeta/svc-sit"]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_suffix_match_is_not_substring_match() {
        let state = SuffixMatches::new("orders-sit").absorb(&groups(&[
            "orders-sit-archive",
            "orders-sit",
            "xorders-sit",
        ]));
        assert_eq!(state.matches(), ["orders-sit", "xorders-sit"]);
    }

    #[test]
    fn test_empty_identifiers_are_rejected_before_listing() {
        let mut lister = InMemoryPages::new(vec![groups(&["a-sit"])]);
        assert!(matches!(
            resolve_log_group("", "sit", &mut lister),
            Err(ExportError::Validation(_))
        ));
        assert!(matches!(
            resolve_log_group("a", "", &mut lister),
            Err(ExportError::Validation(_))
        ));
        assert_eq!(lister.requests_served(), 0);
    }
}
