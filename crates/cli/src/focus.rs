// Interactive focus session over stdin

use crate::command::{FocusCommand, HELP};
use crate::output::{print_progress, print_view, ResumeLocationBar};
use anyhow::Result;
use cadence_core::application::focus::FocusSession;
use colored::Colorize;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run(mut session: FocusSession, location_bar: Arc<ResumeLocationBar>) -> Result<()> {
    show(&session);
    println!("{}", "Type `help` for commands.".dimmed());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", "focus>".bold());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let command = match FocusCommand::parse(&line) {
            Ok(command) => command,
            Err(e) => {
                println!("{}", format!("✗ {}", e).red());
                continue;
            }
        };

        match command {
            FocusCommand::Quit => break,
            FocusCommand::Help => println!("{}", HELP),
            FocusCommand::Where => print_resume(&location_bar),
            FocusCommand::Next => {
                if session.next().await {
                    show(&session);
                }
            }
            FocusCommand::Previous => {
                if session.previous().await {
                    show(&session);
                }
            }
            FocusCommand::Goto(index) => {
                if session.navigate_to(index).await {
                    show(&session);
                } else {
                    println!("{}", "No such item.".yellow());
                }
            }
            FocusCommand::Skip => {
                // Finished is announced by the session and shown by the view
                session.advance_to_next_incomplete().await;
                show(&session);
            }
            FocusCommand::Log(draft) => {
                // Errors were already reported through the notifier
                if session.submit(&draft).await.is_ok() {
                    show(&session);
                }
            }
        }
    }

    print_resume(&location_bar);
    Ok(())
}

fn show(session: &FocusSession) {
    println!();
    print_progress(&session.progress());
    print_view(&session.view());
}

fn print_resume(location_bar: &ResumeLocationBar) {
    if let Some(location) = location_bar.last() {
        println!(
            "{} cadence focus --location '{}'",
            "Resume with:".dimmed(),
            location.to_query()
        );
    }
}
