// Terminal output: notices, resume location, tables and the focus card

use cadence_core::application::focus::{FocusView, Progress};
use cadence_core::domain::{InteractionKind, InteractionRecord, Lead, Outcome, Task};
use cadence_core::port::{FocusLocation, LocationBar, Notice, NoticeLevel, Notifier};
use chrono::{DateTime, Utc};
use colored::Colorize;
use std::sync::Mutex;
use tabled::Tabled;

/// Prints notices as colored status lines
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, notice: Notice) {
        let line = match notice.level {
            NoticeLevel::Info => format!("ℹ {}", notice.message).cyan(),
            NoticeLevel::Success => format!("✓ {}", notice.message).green().bold(),
            NoticeLevel::Error => format!("✗ {}", notice.message).red().bold(),
        };
        println!("{}", line);
    }
}

/// Remembers the latest location so the session can be resumed
#[derive(Default)]
pub struct ResumeLocationBar {
    last: Mutex<Option<FocusLocation>>,
}

impl ResumeLocationBar {
    pub fn last(&self) -> Option<FocusLocation> {
        self.last.lock().ok().and_then(|last| last.clone())
    }
}

impl LocationBar for ResumeLocationBar {
    fn replace(&self, location: &FocusLocation) {
        if let Ok(mut last) = self.last.lock() {
            *last = Some(location.clone());
        }
    }
}

pub fn format_time(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| millis.to_string())
}

fn format_optional_time(millis: &Option<i64>) -> String {
    millis.map(format_time).unwrap_or_else(|| "-".to_string())
}

#[derive(Tabled)]
pub struct TaskTableRow {
    id: String,
    lead: String,
    description: String,
    nature: String,
    due: String,
}

impl From<Task> for TaskTableRow {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            lead: task.lead_name,
            description: task.description,
            nature: task.nature.to_string(),
            due: format_optional_time(&task.due_at),
        }
    }
}

#[derive(Tabled)]
pub struct LeadTableRow {
    id: String,
    name: String,
    email: String,
    status: String,
    step: u8,
    engaged: bool,
    last_contact: String,
}

impl From<Lead> for LeadTableRow {
    fn from(lead: Lead) -> Self {
        Self {
            id: lead.id,
            name: lead.name,
            email: lead.email.unwrap_or_default(),
            status: lead
                .status
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".to_string()),
            step: lead.afc_step,
            engaged: lead.has_engaged,
            last_contact: format_optional_time(&lead.last_interaction_at),
        }
    }
}

#[derive(Tabled)]
pub struct InteractionTableRow {
    at: String,
    kind: String,
    detail: String,
    notes: String,
}

impl From<InteractionRecord> for InteractionTableRow {
    fn from(record: InteractionRecord) -> Self {
        let detail = match &record.kind {
            InteractionKind::QuickLog { log_type, reasons } if reasons.is_empty() => {
                log_type.to_string()
            }
            InteractionKind::QuickLog { log_type, reasons } => {
                format!("{} ({})", log_type, reasons.join(", "))
            }
            InteractionKind::Feedback { perceptions, .. } => perceptions
                .iter()
                .map(|p| format!("{:?} {:?}", p.category, p.sentiment))
                .collect::<Vec<_>>()
                .join(", "),
            InteractionKind::Outcome(Outcome::Info) => "info requested".to_string(),
            InteractionKind::Outcome(Outcome::Later { follow_up_at }) => {
                format!("call back {}", format_time(*follow_up_at))
            }
            InteractionKind::Outcome(Outcome::EventScheduled { event_type, at, .. }) => {
                format!("{} at {}", event_type, format_time(*at))
            }
            InteractionKind::Outcome(Outcome::EventClosed { event_type, status }) => {
                format!("{} {:?}", event_type, status)
            }
        };
        Self {
            at: format_time(record.created_at),
            kind: record.kind.label().to_string(),
            detail,
            notes: record.notes.unwrap_or_default(),
        }
    }
}

pub fn print_progress(progress: &Progress) {
    let position = progress
        .position
        .map(|p| (p + 1).to_string())
        .unwrap_or_else(|| "-".to_string());
    println!(
        "{}",
        format!(
            "[{}/{}]  {} done",
            position, progress.total, progress.completed
        )
        .dimmed()
    );
}

pub fn print_view(view: &FocusView) {
    match view {
        FocusView::Finished => {
            println!("{}", "🎉 Queue finished. Every item is complete.".green().bold())
        }
        FocusView::Empty => println!("{}", "Nothing to show.".yellow()),
        FocusView::Loading { item } => {
            print_item_header(&item.name, &item.description, item.completed);
            println!("{}", "Loading lead…".dimmed());
        }
        FocusView::NoAssociatedRecord { item } => {
            print_item_header(&item.name, &item.description, item.completed);
            println!("{}", "No lead record linked to this item.".yellow());
        }
        FocusView::Ready { item, lead } => {
            print_item_header(&item.name, &item.description, item.completed);
            print_lead(lead);
        }
    }
}

fn print_item_header(name: &str, description: &str, completed: bool) {
    let marker = if completed { "✓".green() } else { "•".normal() };
    println!("{} {}", marker, name.bold());
    println!("  {}", description);
}

fn print_lead(lead: &Lead) {
    if let Some(email) = &lead.email {
        println!("  email:   {}", email);
    }
    for phone in &lead.phones {
        println!("  phone:   {} ({:?})", phone.number, phone.kind);
    }
    if let Some(course) = &lead.course {
        println!("  course:  {}", course);
    }
    let status = lead
        .status
        .map(|s| s.to_string())
        .unwrap_or_else(|| "new".to_string());
    println!(
        "  status:  {}  step {}{}",
        status.cyan(),
        lead.afc_step,
        if lead.has_engaged { "  engaged" } else { "" }
    );
}
