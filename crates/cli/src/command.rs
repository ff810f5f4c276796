// Focus prompt commands
//
// Anything after ` -- ` on a logging command becomes the interaction note.

use anyhow::{anyhow, bail, Context, Result};
use cadence_core::domain::{
    EventStatus, FeedbackCategory, InteractionKind, LogDraft, Outcome, Perception, QuickLogType,
    Sentiment,
};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Hour (UTC) used when a date is given without a time
const DEFAULT_HOUR: u32 = 9;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FocusCommand {
    Next,
    Previous,
    /// Zero-based index
    Goto(usize),
    Skip,
    Log(LogDraft),
    Where,
    Help,
    Quit,
}

pub const HELP: &str = "\
Navigation:
  n | next                 next item
  p | prev                 previous item
  g | goto <N>             jump to item N (1-based)
  s | skip                 next incomplete item
Logging (append ` -- <note>` to attach a note):
  log <type>               unresponsive | unchanged | followup | enrolled
  withdraw <reason>[, ...] withdrawn with reasons
  feedback <cat><+|-> ...  content, schedule, price; trailing words are an objection
  info <what>              lead asked for information
  later <date>             call back on <date> (YYYY-MM-DD[THH:MM], UTC)
  event <type> <date>      event scheduled
  reschedule <type> <date> <old date>
  cancel <type>            event cancelled
  attended <type>          event completed
Other:
  where                    print the resume location
  h | help                 this help
  q | quit                 leave the session";

impl FocusCommand {
    pub fn parse(line: &str) -> Result<Self> {
        let (body, note) = match line.split_once(" -- ") {
            Some((body, note)) => (body.trim(), Some(note.trim()).filter(|n| !n.is_empty())),
            None => (line.trim(), None),
        };
        let (verb, rest) = body
            .split_once(char::is_whitespace)
            .map(|(v, r)| (v, r.trim()))
            .unwrap_or((body, ""));

        let draft = match verb.to_lowercase().as_str() {
            "n" | "next" => return Ok(FocusCommand::Next),
            "p" | "prev" | "previous" => return Ok(FocusCommand::Previous),
            "s" | "skip" => return Ok(FocusCommand::Skip),
            "where" => return Ok(FocusCommand::Where),
            "h" | "help" | "?" => return Ok(FocusCommand::Help),
            "q" | "quit" | "exit" => return Ok(FocusCommand::Quit),
            "g" | "goto" => {
                let n: usize = rest.parse().context("goto needs an item number")?;
                if n == 0 {
                    bail!("item numbers start at 1");
                }
                return Ok(FocusCommand::Goto(n - 1));
            }
            "log" => {
                let log_type: QuickLogType = rest.parse()?;
                if log_type == QuickLogType::Withdrawn {
                    bail!("use `withdraw <reason>` to log a withdrawal");
                }
                LogDraft::quick(log_type)
            }
            "withdraw" => LogDraft::withdrawal(
                rest.split(',')
                    .map(str::trim)
                    .filter(|r| !r.is_empty()),
            ),
            "feedback" => parse_feedback(rest)?,
            "info" => LogDraft::outcome(Outcome::Info).with_notes(rest),
            "later" => LogDraft::outcome(Outcome::Later {
                follow_up_at: parse_when(rest)?,
            }),
            "event" => {
                let (event_type, dates) = split_event(rest, 1)?;
                LogDraft::outcome(Outcome::EventScheduled {
                    event_type,
                    at: parse_when(dates[0])?,
                    rescheduled_from: None,
                })
            }
            "reschedule" => {
                let (event_type, dates) = split_event(rest, 2)?;
                LogDraft::outcome(Outcome::EventScheduled {
                    event_type,
                    at: parse_when(dates[0])?,
                    rescheduled_from: Some(parse_when(dates[1])?),
                })
            }
            "cancel" | "attended" => {
                let status = if verb.eq_ignore_ascii_case("cancel") {
                    EventStatus::Cancelled
                } else {
                    EventStatus::Completed
                };
                LogDraft::outcome(Outcome::EventClosed {
                    event_type: rest.to_string(),
                    status,
                })
            }
            other => bail!("unknown command `{}` (try `help`)", other),
        };

        // Info carries its description as the note; an explicit note is appended
        let is_info = matches!(draft.kind, InteractionKind::Outcome(Outcome::Info));
        let draft = match note {
            Some(note) if is_info => {
                let merged = format!("{} {}", draft.notes.as_deref().unwrap_or_default(), note);
                draft.with_notes(merged.trim())
            }
            Some(note) => draft.with_notes(note),
            None => draft,
        };
        Ok(FocusCommand::Log(draft))
    }
}

/// Dates never contain spaces, so the last `dates` words are dates and
/// everything before them is the event type ("Open House 2024-03-15").
fn split_event(rest: &str, dates: usize) -> Result<(String, Vec<&str>)> {
    let mut words: Vec<&str> = rest.split_whitespace().collect();
    if words.len() <= dates {
        bail!("expected `<type> <date>`{}", if dates > 1 { " <old date>" } else { "" });
    }
    let when = words.split_off(words.len() - dates);
    Ok((words.join(" "), when))
}

fn parse_feedback(rest: &str) -> Result<LogDraft> {
    let mut perceptions = Vec::new();
    let mut objection = Vec::new();

    for token in rest.split_whitespace() {
        let rating = token
            .strip_suffix('+')
            .map(|c| (c, Sentiment::Positive))
            .or_else(|| token.strip_suffix('-').map(|c| (c, Sentiment::Negative)));
        match rating.and_then(|(c, s)| c.parse::<FeedbackCategory>().ok().map(|c| (c, s))) {
            Some((category, sentiment)) => perceptions.push(Perception {
                category,
                sentiment,
            }),
            None => objection.push(token),
        }
    }

    let objections = if objection.is_empty() {
        Vec::new()
    } else {
        vec![objection.join(" ")]
    };
    Ok(LogDraft {
        kind: InteractionKind::Feedback {
            perceptions,
            objections,
        },
        notes: None,
    })
}

/// `YYYY-MM-DD` or `YYYY-MM-DDTHH:MM`, interpreted as UTC
pub fn parse_when(input: &str) -> Result<i64> {
    let input = input.trim();
    let at = match NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M") {
        Ok(at) => at,
        Err(_) => {
            let date = NaiveDate::parse_from_str(input, "%Y-%m-%d")
                .with_context(|| format!("invalid date `{}`", input))?;
            let time = NaiveTime::from_hms_opt(DEFAULT_HOUR, 0, 0)
                .ok_or_else(|| anyhow!("invalid default hour"))?;
            date.and_time(time)
        }
    };
    Ok(at.and_utc().timestamp_millis())
}
