// Location Port - the shareable "URL" of a focus session

use crate::domain::QueueKind;

const IDS_KEY: &str = "ids";
const CURRENT_KEY: &str = "current";
const KIND_KEY: &str = "kind";

/// Query-string state of a focus session: `kind=tasks&ids=a,b,c&current=b`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusLocation {
    pub kind: QueueKind,
    pub ids: Vec<String>,
    pub current: Option<String>,
}

impl FocusLocation {
    pub fn new(kind: QueueKind, ids: Vec<String>) -> Self {
        Self {
            kind,
            ids,
            current: None,
        }
    }

    pub fn with_current(mut self, id: impl Into<String>) -> Self {
        self.current = Some(id.into());
        self
    }

    /// Parse a query string. Unknown keys are ignored, blank ids dropped,
    /// and a missing or unknown `kind` means a task queue.
    pub fn parse(query: &str) -> Self {
        let query = query.trim_start_matches('?');
        let mut location = Self::new(QueueKind::Tasks, Vec::new());

        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            match key {
                IDS_KEY => {
                    location.ids = value
                        .split(',')
                        .map(str::trim)
                        .filter(|id| !id.is_empty())
                        .map(String::from)
                        .collect();
                }
                CURRENT_KEY if !value.trim().is_empty() => {
                    location.current = Some(value.trim().to_string());
                }
                KIND_KEY if value == "leads" => location.kind = QueueKind::Leads,
                _ => {}
            }
        }

        location
    }

    pub fn to_query(&self) -> String {
        let mut query = format!("{}={}&{}={}", KIND_KEY, self.kind, IDS_KEY, self.ids.join(","));
        if let Some(current) = &self.current {
            query.push_str(&format!("&{}={}", CURRENT_KEY, current));
        }
        query
    }
}

/// Where the session writes its current location (history entry / share link)
pub trait LocationBar: Send + Sync {
    fn replace(&self, location: &FocusLocation);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ids_and_current() {
        let loc = FocusLocation::parse("?ids=a, b,,c&current=b");
        assert_eq!(loc.ids, vec!["a", "b", "c"]);
        assert_eq!(loc.current.as_deref(), Some("b"));
        assert_eq!(loc.kind, QueueKind::Tasks);
    }

    #[test]
    fn test_parse_leads_kind_and_empty_current() {
        let loc = FocusLocation::parse("kind=leads&ids=x&current=");
        assert_eq!(loc.kind, QueueKind::Leads);
        assert_eq!(loc.current, None);
    }

    #[test]
    fn test_query_roundtrip() {
        let loc = FocusLocation::new(QueueKind::Leads, vec!["a".into(), "b".into()]).with_current("b");
        assert_eq!(loc.to_query(), "kind=leads&ids=a,b&current=b");
        assert_eq!(FocusLocation::parse(&loc.to_query()), loc);
    }

    #[test]
    fn test_empty_query() {
        let loc = FocusLocation::parse("");
        assert!(loc.ids.is_empty());
        assert_eq!(loc.current, None);
    }
}
