// Lead Domain Model

use super::error::{DomainError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Lead ID (UUID v4)
pub type LeadId = String;

/// Lifecycle status of a lead
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeadStatus {
    Active,
    Enrolled,
    Withdrawn,
    Cooling,
    Dormant,
}

impl std::fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LeadStatus::Active => write!(f, "Active"),
            LeadStatus::Enrolled => write!(f, "Enrolled"),
            LeadStatus::Withdrawn => write!(f, "Withdrawn"),
            LeadStatus::Cooling => write!(f, "Cooling"),
            LeadStatus::Dormant => write!(f, "Dormant"),
        }
    }
}

impl FromStr for LeadStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Active" => Ok(LeadStatus::Active),
            "Enrolled" => Ok(LeadStatus::Enrolled),
            "Withdrawn" => Ok(LeadStatus::Withdrawn),
            "Cooling" => Ok(LeadStatus::Cooling),
            "Dormant" => Ok(LeadStatus::Dormant),
            other => Err(DomainError::UnknownVariant {
                kind: "lead status",
                value: other.to_string(),
            }),
        }
    }
}

/// How a phone number may be used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhoneKind {
    Call,
    Whatsapp,
    Both,
}

impl PhoneKind {
    /// Lenient parse used by imports; anything unrecognised means `Both`.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "call" => PhoneKind::Call,
            "whatsapp" => PhoneKind::Whatsapp,
            _ => PhoneKind::Both,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phone {
    pub number: String,
    pub kind: PhoneKind,
}

/// Lead Entity (the record associated with every queue item)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: LeadId,
    pub name: String,
    pub email: Option<String>,
    pub phones: Vec<Phone>,
    pub relationship: String,
    pub course: Option<String>,

    // Lifecycle. `None` until intake has run.
    pub status: Option<LeadStatus>,
    pub afc_step: u8,
    pub has_engaged: bool,
    pub on_follow_list: bool,

    pub last_interaction_at: Option<i64>, // epoch ms
    pub created_at: i64,                  // epoch ms
}

impl Lead {
    /// Create a lead that has not been through intake yet
    pub fn new(id: impl Into<String>, created_at: i64, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: None,
            phones: Vec::new(),
            relationship: DEFAULT_RELATIONSHIP.to_string(),
            course: None,
            status: None,
            afc_step: 0,
            has_engaged: false,
            on_follow_list: false,
            last_interaction_at: None,
            created_at,
        }
    }

    /// A lead is closed once it enrolled or withdrew
    pub fn is_closed(&self) -> bool {
        matches!(
            self.status,
            Some(LeadStatus::Enrolled) | Some(LeadStatus::Withdrawn)
        )
    }
}

pub const DEFAULT_RELATIONSHIP: &str = "Lead";

/// Field-level partial update for a lead. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeadUpdate {
    pub status: Option<LeadStatus>,
    pub afc_step: Option<u8>,
    pub has_engaged: Option<bool>,
    pub last_interaction_at: Option<i64>,
}

impl LeadUpdate {
    pub fn status(mut self, status: LeadStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn afc_step(mut self, step: u8) -> Self {
        self.afc_step = Some(step);
        self
    }

    pub fn engaged(mut self) -> Self {
        self.has_engaged = Some(true);
        self
    }

    pub fn touched_at(mut self, now_millis: i64) -> Self {
        self.last_interaction_at = Some(now_millis);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == LeadUpdate::default()
    }

    /// Apply to an in-memory lead (used by the in-memory store)
    pub fn apply_to(&self, lead: &mut Lead) {
        if let Some(status) = self.status {
            lead.status = Some(status);
        }
        if let Some(step) = self.afc_step {
            lead.afc_step = step;
        }
        if let Some(engaged) = self.has_engaged {
            lead.has_engaged = engaged;
        }
        if let Some(at) = self.last_interaction_at {
            lead.last_interaction_at = Some(at);
        }
    }
}
