//! Relationship follow-ups.
//!
//! Each contact carries a follow-up interval; a contact is "due" once that many
//! days have passed since the last completed call (or since it was added).

use chrono::{DateTime, Duration, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result, ValidationError};
use crate::ids::{CallId, ContactId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledCall {
    pub id: CallId,
    pub at: DateTime<Utc>,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactProfile {
    pub id: ContactId,
    pub name: String,
    #[serde(default)]
    pub notes: String,
    pub follow_up_days: u32,
    #[serde(default)]
    pub last_contacted: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub calls: Vec<ScheduledCall>,
}

impl ContactProfile {
    /// When the next follow-up becomes due.
    pub fn due_at(&self) -> DateTime<Utc> {
        self.last_contacted.unwrap_or(self.created_at) + Duration::days(i64::from(self.follow_up_days))
    }

    pub fn next_call(&self, now: DateTime<Utc>) -> Option<&ScheduledCall> {
        self.calls
            .iter()
            .filter(|c| !c.completed && c.at >= now)
            .min_by_key(|c| c.at)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ContactBook {
    contacts: IndexMap<ContactId, ContactProfile>,
}

impl ContactBook {
    pub fn from_contacts(contacts: impl IntoIterator<Item = ContactProfile>) -> Self {
        Self {
            contacts: contacts.into_iter().map(|c| (c.id, c)).collect(),
        }
    }

    pub fn get(&self, id: ContactId) -> Option<&ContactProfile> {
        self.contacts.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ContactProfile> {
        self.contacts.values()
    }

    /// Contacts whose follow-up is due at `now`, most overdue first.
    pub fn due(&self, now: DateTime<Utc>) -> Vec<&ContactProfile> {
        let mut due: Vec<&ContactProfile> =
            self.contacts.values().filter(|c| c.due_at() <= now).collect();
        due.sort_by_key(|c| c.due_at());
        due
    }

    pub fn add(
        &mut self,
        name: &str,
        follow_up_days: u32,
        now: DateTime<Utc>,
    ) -> Result<ContactId> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName { field: "name" }.into());
        }
        if follow_up_days == 0 {
            return Err(ValidationError::InvalidValue {
                field: "follow_up_days".into(),
                message: "must be at least 1".into(),
            }
            .into());
        }
        let contact = ContactProfile {
            id: ContactId::new(),
            name: name.to_string(),
            notes: String::new(),
            follow_up_days,
            last_contacted: None,
            created_at: now,
            calls: Vec::new(),
        };
        let id = contact.id;
        self.contacts.insert(id, contact);
        Ok(id)
    }

    pub fn delete(&mut self, id: ContactId) -> Result<ContactProfile> {
        self.contacts
            .shift_remove(&id)
            .ok_or_else(|| CoreError::not_found("contact", id))
    }

    pub fn schedule_call(&mut self, id: ContactId, at: DateTime<Utc>, note: &str) -> Result<CallId> {
        let contact = self.require_mut(id)?;
        let call = ScheduledCall {
            id: CallId::new(),
            at,
            note: note.trim().to_string(),
            completed: false,
        };
        let call_id = call.id;
        contact.calls.push(call);
        Ok(call_id)
    }

    /// Mark a call done and reset the follow-up clock to `now`.
    pub fn complete_call(&mut self, id: ContactId, call: CallId, now: DateTime<Utc>) -> Result<()> {
        let contact = self.require_mut(id)?;
        let entry = contact
            .calls
            .iter_mut()
            .find(|c| c.id == call)
            .ok_or_else(|| CoreError::not_found("call", call))?;
        if entry.completed {
            return Err(CoreError::invalid_state(format!("call {call} already completed")));
        }
        entry.completed = true;
        contact.last_contacted = Some(now);
        Ok(())
    }

    fn require_mut(&mut self, id: ContactId) -> Result<&mut ContactProfile> {
        self.contacts
            .get_mut(&id)
            .ok_or_else(|| CoreError::not_found("contact", id))
    }
}
