// Contact Import - bulk lead upsert from a JSON array
//
// Email is the match key. Rows without a name are skipped; rows without an
// email always create a new lead.

use super::cycle::FollowUpCycle;
use crate::domain::{Lead, LeadStatus, Phone, PhoneKind, DEFAULT_RELATIONSHIP};
use crate::error::{AppError, Result};
use serde::Deserialize;
use tracing::{debug, info, warn};

/// One contact row as exported by spreadsheets
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ContactRow {
    name: Option<String>,
    email: Option<String>,
    phone1: Option<String>,
    phone1_type: Option<String>,
    phone2: Option<String>,
    phone2_type: Option<String>,
    relationship: Option<String>,
    course_name: Option<String>,
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl ContactRow {
    fn phones(&self) -> Vec<Phone> {
        [
            (&self.phone1, &self.phone1_type),
            (&self.phone2, &self.phone2_type),
        ]
        .into_iter()
        .filter_map(|(number, kind)| {
            trimmed(number.as_deref()).map(|number| Phone {
                number,
                kind: PhoneKind::parse_lenient(kind.as_deref().unwrap_or_default()),
            })
        })
        .collect()
    }

    /// Overwrite contact fields and restart the lifecycle
    fn apply_to(&self, lead: &mut Lead, name: String, email: Option<String>) {
        lead.name = name;
        lead.email = email;
        lead.phones = self.phones();
        lead.relationship = trimmed(self.relationship.as_deref())
            .unwrap_or_else(|| DEFAULT_RELATIONSHIP.to_string());
        lead.course = trimmed(self.course_name.as_deref());
        lead.status = Some(LeadStatus::Active);
        lead.afc_step = 0;
        lead.has_engaged = false;
        lead.on_follow_list = false;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
}

pub struct ContactImporter {
    cycle: FollowUpCycle,
}

impl ContactImporter {
    pub fn new(cycle: FollowUpCycle) -> Self {
        Self { cycle }
    }

    /// Import contacts. With `only_new`, rows matching an existing email are skipped
    /// instead of updating that lead.
    pub async fn import_json(&self, json: &str, only_new: bool) -> Result<ImportSummary> {
        let rows: Vec<serde_json::Value> = match serde_json::from_str(json) {
            Ok(serde_json::Value::Array(rows)) => rows,
            Ok(_) => {
                return Err(AppError::Validation(
                    "JSON data must be an array of contact objects".to_string(),
                ))
            }
            Err(e) => return Err(AppError::Validation(format!("Invalid JSON format: {}", e))),
        };

        let mut summary = ImportSummary::default();
        for (index, value) in rows.into_iter().enumerate() {
            let row: ContactRow = match serde_json::from_value(value) {
                Ok(row) => row,
                Err(e) => {
                    warn!(row = index, error = %e, "Malformed contact row skipped");
                    summary.skipped += 1;
                    continue;
                }
            };

            let Some(name) = trimmed(row.name.as_deref()) else {
                debug!(row = index, "Contact row without name skipped");
                summary.skipped += 1;
                continue;
            };
            let email = trimmed(row.email.as_deref());

            let existing = match &email {
                Some(email) => self.cycle.leads.find_by_email(email).await?,
                None => None,
            };

            match existing {
                Some(_) if only_new => summary.skipped += 1,
                Some(mut lead) => {
                    row.apply_to(&mut lead, name, email);
                    self.cycle.leads.replace(&lead).await?;
                    summary.updated += 1;
                }
                None => {
                    let mut lead =
                        Lead::new(self.cycle.id_provider.generate_id(), self.cycle.now(), "");
                    row.apply_to(&mut lead, name, email);
                    self.cycle.leads.insert(&lead).await?;
                    summary.created += 1;
                }
            }
        }

        info!(
            created = summary.created,
            updated = summary.updated,
            skipped = summary.skipped,
            only_new,
            "Contact import finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::mocks::{FixedTimeProvider, InMemoryStore, SequentialIdProvider};
    use crate::port::LeadRepository;
    use std::sync::Arc;

    fn importer(store: &Arc<InMemoryStore>) -> ContactImporter {
        ContactImporter::new(FollowUpCycle::new(
            store.clone(),
            store.clone(),
            store.clone(),
            Arc::new(SequentialIdProvider::new("lead")),
            Arc::new(FixedTimeProvider::new(5_000)),
        ))
    }

    async fn existing(store: &Arc<InMemoryStore>) {
        let mut lead = Lead::new("old", 0, "Old Name");
        lead.email = Some("amal@example.com".into());
        lead.status = Some(LeadStatus::Cooling);
        lead.afc_step = 4;
        LeadRepository::insert(&**store, &lead).await.unwrap();
    }

    const ROWS: &str = r#"[
        {"name": " Amal ", "email": "amal@example.com", "phone1": "555-1", "phone1Type": "WhatsApp",
         "phone2": "", "relationship": "", "courseName": "Design"},
        {"name": "Omar", "email": "omar@example.com", "phone1": "555-2", "relationship": "Parent"},
        {"name": "   ", "email": "blank@example.com"},
        {"email": "noname@example.com"}
    ]"#;

    #[tokio::test]
    async fn test_import_creates_new_leads() {
        let store = Arc::new(InMemoryStore::new());

        let summary = importer(&store).import_json(ROWS, false).await.unwrap();
        assert_eq!(
            summary,
            ImportSummary {
                created: 2,
                updated: 0,
                skipped: 2
            }
        );

        let amal = store.lead("lead-1").unwrap();
        assert_eq!(amal.name, "Amal");
        assert_eq!(amal.relationship, "Lead");
        assert_eq!(amal.course.as_deref(), Some("Design"));
        assert_eq!(amal.status, Some(LeadStatus::Active));
        assert_eq!(amal.afc_step, 0);
        assert_eq!(
            amal.phones,
            vec![Phone {
                number: "555-1".into(),
                kind: PhoneKind::Whatsapp
            }]
        );

        let omar = store.lead("lead-2").unwrap();
        assert_eq!(omar.relationship, "Parent");
        assert_eq!(omar.phones[0].kind, PhoneKind::Both);
        // Imports never schedule follow-ups
        assert!(store.tasks().is_empty());
    }

    #[tokio::test]
    async fn test_import_updates_by_email() {
        let store = Arc::new(InMemoryStore::new());
        existing(&store).await;

        let summary = importer(&store).import_json(ROWS, false).await.unwrap();
        assert_eq!(summary.created, 1);
        assert_eq!(summary.updated, 1);

        let updated = store.lead("old").unwrap();
        assert_eq!(updated.name, "Amal");
        assert_eq!(updated.status, Some(LeadStatus::Active));
        assert_eq!(updated.afc_step, 0);
    }

    #[tokio::test]
    async fn test_only_new_skips_existing() {
        let store = Arc::new(InMemoryStore::new());
        existing(&store).await;

        let summary = importer(&store).import_json(ROWS, true).await.unwrap();
        assert_eq!(
            summary,
            ImportSummary {
                created: 1,
                updated: 0,
                skipped: 3
            }
        );
        assert_eq!(store.lead("old").unwrap().name, "Old Name");
    }

    #[tokio::test]
    async fn test_rejects_non_array_and_bad_json() {
        let store = Arc::new(InMemoryStore::new());
        let importer = importer(&store);

        assert!(importer.import_json(r#"{"name": "x"}"#, false).await.unwrap_err().is_validation());
        assert!(importer.import_json("[{", false).await.unwrap_err().is_validation());
    }
}
