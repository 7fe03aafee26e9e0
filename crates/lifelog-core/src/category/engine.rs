//! Category book: the set of categories plus the timer commands.
//!
//! Like the rest of the core this is a wall-clock engine with no internal
//! thread. Every command takes the current instant; a host that wants a live
//! display simply calls [`CategoryBook::current_time`] on its own cadence.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use tracing::debug;

use super::{Category, CategoryKind, CategoryTimes};
use crate::calendar::Zone;
use crate::error::{CoreError, Result, ValidationError};
use crate::ids::CategoryId;

/// Result of starting a timer.
#[derive(Debug, Clone, PartialEq)]
pub struct StartOutcome {
    pub started: CategoryId,
    /// Timers that were running and got stopped first, with the minutes each
    /// one was credited.
    pub stopped: Vec<(CategoryId, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToggleOutcome {
    Started(StartOutcome),
    Stopped { id: CategoryId, elapsed_minutes: f64 },
}

/// Insertion-ordered categories keyed by id.
#[derive(Debug, Clone, Default)]
pub struct CategoryBook {
    zone: Zone,
    categories: IndexMap<CategoryId, Category>,
}

impl CategoryBook {
    pub fn new(zone: Zone) -> Self {
        Self {
            zone,
            categories: IndexMap::new(),
        }
    }

    /// Rebuild a book from persisted categories. Every category comes back
    /// stopped, because running state is never persisted.
    pub fn from_categories(zone: Zone, categories: impl IntoIterator<Item = Category>) -> Self {
        Self {
            zone,
            categories: categories.into_iter().map(|c| (c.id, c)).collect(),
        }
    }

    pub fn zone(&self) -> Zone {
        self.zone
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn get(&self, id: CategoryId) -> Option<&Category> {
        self.categories.get(&id)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// All categories in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.values()
    }

    pub fn of_kind(&self, kind: CategoryKind) -> impl Iterator<Item = &Category> {
        self.categories.values().filter(move |c| c.kind == kind)
    }

    pub fn running(&self) -> Option<&Category> {
        self.categories.values().find(|c| c.is_running())
    }

    pub fn any_running(&self, kind: CategoryKind) -> bool {
        self.of_kind(kind).any(Category::is_running)
    }

    pub fn current_time(&self, id: CategoryId, now: DateTime<Utc>) -> Result<CategoryTimes> {
        Ok(self.require(id)?.current_time(now, self.zone))
    }

    pub fn weekly_series(&self, id: CategoryId, now: DateTime<Utc>) -> Result<[f64; 7]> {
        Ok(self.require(id)?.weekly_series(now, self.zone))
    }

    /// Sum of the projections of every category of `kind`.
    pub fn totals(&self, kind: CategoryKind, now: DateTime<Utc>) -> CategoryTimes {
        let mut sum = CategoryTimes::default();
        for category in self.of_kind(kind) {
            sum += category.current_time(now, self.zone);
        }
        sum
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn add(
        &mut self,
        name: &str,
        kind: CategoryKind,
        now: DateTime<Utc>,
    ) -> Result<CategoryId> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName { field: "name" }.into());
        }
        let category = Category::new(name, kind, now, self.zone);
        let id = category.id;
        self.categories.insert(id, category);
        debug!(category = %id, %kind, "category added");
        Ok(id)
    }

    /// Remove a category, first crediting any in-flight segment.
    ///
    /// Returns the final state of the removed category.
    pub fn delete(&mut self, id: CategoryId, now: DateTime<Utc>) -> Result<Category> {
        let zone = self.zone;
        let category = self.require_mut(id)?;
        if let Some(elapsed) = category.stop(now, zone) {
            debug!(category = %id, elapsed, "stopped running category before delete");
        }
        self.categories
            .shift_remove(&id)
            .ok_or_else(|| CoreError::not_found("category", id))
    }

    /// Start `id`, stopping every other running timer first.
    pub fn start(&mut self, id: CategoryId, now: DateTime<Utc>) -> Result<StartOutcome> {
        let target = self.require(id)?;
        if target.is_running() {
            return Err(CoreError::invalid_state(format!(
                "category {id} is already running"
            )));
        }

        let zone = self.zone;
        let mut stopped = Vec::new();
        for (other_id, other) in self.categories.iter_mut() {
            if *other_id == id {
                continue;
            }
            if let Some(elapsed) = other.stop(now, zone) {
                debug!(category = %other_id, elapsed, "stopped by exclusivity");
                stopped.push((*other_id, elapsed));
            }
        }

        let started = self.require_mut(id)?.start(now, zone);
        debug_assert!(started);
        debug!(category = %id, "timer started");
        Ok(StartOutcome { started: id, stopped })
    }

    /// Stop `id`, returning the minutes credited.
    pub fn stop(&mut self, id: CategoryId, now: DateTime<Utc>) -> Result<f64> {
        let zone = self.zone;
        let elapsed = self
            .require_mut(id)?
            .stop(now, zone)
            .ok_or_else(|| CoreError::invalid_state(format!("category {id} is not running")))?;
        debug!(category = %id, elapsed, "timer stopped");
        Ok(elapsed)
    }

    pub fn toggle(&mut self, id: CategoryId, now: DateTime<Utc>) -> Result<ToggleOutcome> {
        if self.require(id)?.is_running() {
            let elapsed_minutes = self.stop(id, now)?;
            Ok(ToggleOutcome::Stopped { id, elapsed_minutes })
        } else {
            Ok(ToggleOutcome::Started(self.start(id, now)?))
        }
    }

    /// Re-attach a running segment remembered by the host across restarts.
    ///
    /// Any other running timer is stopped at `now` first, as with [`Self::start`].
    pub fn restore_running(
        &mut self,
        id: CategoryId,
        started_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let zone = self.zone;
        self.require(id)?;
        for (other_id, other) in self.categories.iter_mut() {
            if *other_id != id {
                if let Some(elapsed) = other.stop(now, zone) {
                    debug!(category = %other_id, elapsed, "stopped by restored timer");
                }
            }
        }
        let category = self.require_mut(id)?;
        if !category.is_running() {
            category.roll_over(started_at, zone);
            category.resume_from(started_at);
        }
        Ok(())
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn require(&self, id: CategoryId) -> Result<&Category> {
        self.categories
            .get(&id)
            .ok_or_else(|| CoreError::not_found("category", id))
    }

    fn require_mut(&mut self, id: CategoryId) -> Result<&mut Category> {
        self.categories
            .get_mut(&id)
            .ok_or_else(|| CoreError::not_found("category", id))
    }
}
