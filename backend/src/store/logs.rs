//! Delivery log rows and the contact listing derived from them.
//!
//! Timestamps are stored as RFC 3339 UTC with millisecond precision so that
//! comparing the strings orders them in time.

use crate::error::StoreResult;
use crate::store::Store;
use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, TimeDelta, Utc};
use common::model::log::{Contact, LogEntry};
use common::model::merge::DispatchOutcome;
use common::requests::{LogSort, SortOrder};
use rusqlite::{params, Row};
use uuid::Uuid;

const UNKNOWN_TEMPLATE: &str = "Unknown Template";

const SELECT: &str = "SELECT l.log_id, l.created_at, l.status, l.template_id, \
     COALESCE(t.name, ?1), l.service_id, l.email_address, l.name, l.message \
     FROM logs l LEFT JOIN templates t ON t.id = l.template_id";

/// Which log rows to list and in what order.
#[derive(Debug, Clone, Default)]
pub struct LogFilter<'a> {
    pub template_id: Option<&'a str>,
    /// Only rows created at or after this instant.
    pub since: Option<DateTime<Utc>>,
    /// Only rows created on this UTC day.
    pub day: Option<NaiveDate>,
    pub sort: LogSort,
    pub order: SortOrder,
}

/// Which contacts to list and in what order.
#[derive(Debug, Clone, Default)]
pub struct ContactFilter<'a> {
    pub search: Option<&'a str>,
    pub day: Option<NaiveDate>,
    pub order: SortOrder,
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Start of `day` and of the day after it.
fn day_bounds(day: Option<NaiveDate>) -> (Option<String>, Option<String>) {
    match day {
        Some(day) => {
            let start = day.and_time(NaiveTime::MIN).and_utc();
            (
                Some(timestamp(start)),
                Some(timestamp(start + TimeDelta::days(1))),
            )
        }
        None => (None, None),
    }
}

fn direction(order: SortOrder) -> &'static str {
    match order {
        SortOrder::Asc => "ASC",
        SortOrder::Desc => "DESC",
    }
}

fn order_by(sort: LogSort, order: SortOrder) -> String {
    let dir = direction(order);
    match sort {
        LogSort::Date => format!("l.created_at {dir}, l.rowid {dir}"),
        LogSort::Status => format!("LOWER(l.status) {dir}, l.created_at DESC, l.rowid DESC"),
    }
}

fn from_row(row: &Row<'_>) -> rusqlite::Result<LogEntry> {
    Ok(LogEntry {
        log_id: row.get(0)?,
        created_at: row.get(1)?,
        status: row.get(2)?,
        template_id: row.get(3)?,
        template_name: row.get(4)?,
        service_id: row.get(5)?,
        email_address: row.get(6)?,
        name: row.get(7)?,
        message: row.get(8)?,
    })
}

fn into_contact(entry: LogEntry) -> Contact {
    Contact {
        log_id: entry.log_id,
        sent_at: entry.created_at,
        email_address: entry.email_address,
        name: entry.name,
        template_name: entry.template_name,
    }
}

fn matches_search(contact: &Contact, needle: &str) -> bool {
    contact.email_address.to_lowercase().contains(needle)
        || contact.name.to_lowercase().contains(needle)
        || contact.template_name.to_lowercase().contains(needle)
}

impl Store {
    /// Writes one log row per outcome in a single transaction.
    pub fn record_outcomes(
        &self,
        template_id: &str,
        service_id: &str,
        outcomes: &[DispatchOutcome],
    ) -> StoreResult<usize> {
        self.record_outcomes_at(template_id, service_id, outcomes, Utc::now())
    }

    pub(crate) fn record_outcomes_at(
        &self,
        template_id: &str,
        service_id: &str,
        outcomes: &[DispatchOutcome],
        at: DateTime<Utc>,
    ) -> StoreResult<usize> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let created_at = timestamp(at);
        {
            let mut stmt = tx.prepare(
                "INSERT INTO logs (log_id, created_at, status, template_id, service_id, email_address, name, message) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for outcome in outcomes {
                let status = if outcome.success { "sent" } else { "failed" };
                stmt.execute(params![
                    Uuid::new_v4().to_string(),
                    created_at,
                    status,
                    template_id,
                    service_id,
                    outcome.email_address,
                    outcome.name,
                    outcome.message,
                ])?;
            }
        }
        tx.commit()?;
        Ok(outcomes.len())
    }

    pub fn list_logs(&self, filter: &LogFilter<'_>) -> StoreResult<Vec<LogEntry>> {
        let (day_start, day_end) = day_bounds(filter.day);
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!(
            "{SELECT} WHERE (?2 IS NULL OR l.template_id = ?2) \
             AND (?3 IS NULL OR l.created_at >= ?3) \
             AND (?4 IS NULL OR (l.created_at >= ?4 AND l.created_at < ?5)) \
             ORDER BY {}",
            order_by(filter.sort, filter.order)
        ))?;
        let entries = stmt
            .query_map(
                params![
                    UNKNOWN_TEMPLATE,
                    filter.template_id,
                    filter.since.map(timestamp),
                    day_start,
                    day_end,
                ],
                from_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    /// Recipients of every successful send, ordered by send time.
    pub fn list_contacts(&self, filter: &ContactFilter<'_>) -> StoreResult<Vec<Contact>> {
        let (day_start, day_end) = day_bounds(filter.day);
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!(
            "{SELECT} WHERE l.status = 'sent' \
             AND (?2 IS NULL OR (l.created_at >= ?2 AND l.created_at < ?3)) \
             ORDER BY {}",
            order_by(LogSort::Date, filter.order)
        ))?;
        let contacts = stmt
            .query_map(params![UNKNOWN_TEMPLATE, day_start, day_end], from_row)?
            .map(|entry| entry.map(into_contact))
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let needle = filter.search.map(str::to_lowercase).unwrap_or_default();
        if needle.is_empty() {
            return Ok(contacts);
        }
        Ok(contacts
            .into_iter()
            .filter(|contact| matches_search(contact, &needle))
            .collect())
    }
}
