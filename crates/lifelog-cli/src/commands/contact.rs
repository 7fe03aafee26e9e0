use clap::Subcommand;
use lifelog_core::{CallId, ContactId, Tracker};

use super::session::{parse_local_datetime, print_json, resolve, CliResult, Session};

#[derive(Subcommand)]
pub enum ContactAction {
    /// Add a contact to keep in touch with
    Add {
        name: String,
        /// Follow up every N days
        #[arg(long, default_value = "14")]
        every: u32,
    },
    /// List contacts with their next follow-up
    List {
        #[arg(long)]
        json: bool,
    },
    /// Remove a contact
    Delete { contact: String },
    /// Schedule a call
    Call {
        contact: String,
        /// Local "YYYY-MM-DD HH:MM"
        #[arg(long)]
        at: String,
        #[arg(long, default_value = "")]
        note: String,
    },
    /// Mark a scheduled call as done
    Done { contact: String, call: CallId },
    /// Contacts whose follow-up is due
    Due,
}

fn find(tracker: &Tracker, query: &str) -> Result<ContactId, lifelog_core::CoreError> {
    resolve(
        "contact",
        query,
        tracker.contacts().iter().map(|c| (c.id, c.name.clone())),
    )
}

pub fn run(action: ContactAction) -> CliResult {
    let mut session = Session::open()?;
    let tracker = &mut session.tracker;

    match action {
        ContactAction::Add { name, every } => {
            print_json(&tracker.add_contact(&name, every)?)?;
        }
        ContactAction::List { json } => {
            let contacts: Vec<_> = tracker.contacts().iter().collect();
            if json {
                print_json(&contacts)?;
            } else if contacts.is_empty() {
                println!("No contacts.");
            } else {
                let now = tracker.now();
                for c in contacts {
                    println!("{:<20} due {}", c.name, c.due_at().format("%Y-%m-%d"));
                    if let Some(call) = c.next_call(now) {
                        println!("  call {} {}  [{}]", call.at.format("%Y-%m-%d %H:%M"), call.note, call.id);
                    }
                }
            }
        }
        ContactAction::Delete { contact } => {
            let id = find(tracker, &contact)?;
            print_json(&tracker.delete_contact(id)?)?;
        }
        ContactAction::Call { contact, at, note } => {
            let id = find(tracker, &contact)?;
            let at = parse_local_datetime(tracker, &at)?;
            print_json(&tracker.schedule_call(id, at, &note)?)?;
        }
        ContactAction::Done { contact, call } => {
            let id = find(tracker, &contact)?;
            print_json(&tracker.complete_call(id, call)?)?;
        }
        ContactAction::Due => {
            let due = tracker.contacts_due();
            if due.is_empty() {
                println!("Nobody is due.");
            }
            for c in due {
                println!("{:<20} since {}", c.name, c.due_at().format("%Y-%m-%d"));
            }
        }
    }

    session.close()
}
