// Dashboard aggregation: totals, highlight cards and formatted rows
//
// Pure over an already-loaded snapshot. The three highlights are only ever
// produced together by `summarize`, so cards never mix snapshots.

use crate::config::default_offset;
use crate::error::{DashboardError, DashboardResult};
use crate::format::{day_of_month_label, format_currency, format_short_date, month_interval_label};
use crate::models::{Category, DisplayZone, Transaction, TransactionType};
use chrono::{DateTime, FixedOffset, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const NO_TRANSACTIONS: &str = "Não há transações";
pub const NO_MOVEMENT: &str = "Não há movimentações";

/// Which date closes the "01 a ..." interval on the total card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TotalIntervalAnchor {
    /// Latest expense, as the mobile dashboard has always shown it
    #[default]
    LatestExpense,
    /// Latest transaction of either type
    LatestTransaction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayOptions {
    pub zone: DisplayZone,
    pub total_interval_anchor: TotalIntervalAnchor,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        DisplayOptions {
            zone: DisplayZone::Fixed(default_offset()),
            total_interval_anchor: TotalIntervalAnchor::default(),
        }
    }
}

// ============================================================================
// OUTPUT TYPES
// ============================================================================

/// Exact aggregates behind the cards. `None` dates mean no transaction of that type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub entries: Decimal,
    pub expenses: Decimal,
    /// entries - expenses
    pub net: Decimal,
    pub last_entry: Option<NaiveDate>,
    pub last_expense: Option<NaiveDate>,
}

impl Totals {
    fn interval_end(&self, anchor: TotalIntervalAnchor) -> Option<NaiveDate> {
        match anchor {
            TotalIntervalAnchor::LatestExpense => self.last_expense,
            TotalIntervalAnchor::LatestTransaction => self.last_entry.max(self.last_expense),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HighlightSummary {
    pub amount: String,
    pub last_transaction: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Highlights {
    pub entries: HighlightSummary,
    pub expenses: HighlightSummary,
    pub total: HighlightSummary,
}

/// One list row, every field ready to print
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionRow {
    pub id: String,
    pub name: String,
    pub amount: String,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub category: Category,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    pub transactions: Vec<TransactionRow>,
    pub highlights: Highlights,
    pub totals: Totals,
}

// ============================================================================
// AGGREGATION
// ============================================================================

/// Aggregate a snapshot into the dashboard. Rows keep the stored order.
pub fn summarize(transactions: &[Transaction], options: &DisplayOptions) -> DashboardResult<Dashboard> {
    let mut totals = Totals::default();
    let mut latest_entry: Option<DateTime<FixedOffset>> = None;
    let mut latest_expense: Option<DateTime<FixedOffset>> = None;
    let mut rows = Vec::with_capacity(transactions.len());

    for tx in transactions {
        let when = tx.local_datetime(options.zone)?;

        let (total, latest, label) = if tx.is_entry() {
            (&mut totals.entries, &mut latest_entry, "entries")
        } else {
            (&mut totals.expenses, &mut latest_expense, "expenses")
        };
        *total = total
            .checked_add(tx.amount)
            .ok_or(DashboardError::AmountOverflow { total: label })?;
        if latest.map_or(true, |current| when > current) {
            *latest = Some(when);
        }

        rows.push(TransactionRow {
            id: tx.id.clone(),
            name: tx.name.clone(),
            amount: format_currency(tx.amount),
            transaction_type: tx.transaction_type,
            category: tx.category.clone(),
            date: format_short_date(when.date_naive()),
        });
    }

    totals.last_entry = latest_entry.map(|dt| dt.date_naive());
    totals.last_expense = latest_expense.map(|dt| dt.date_naive());
    totals.net = totals
        .entries
        .checked_sub(totals.expenses)
        .ok_or(DashboardError::AmountOverflow { total: "net" })?;

    let highlights = build_highlights(&totals, options.total_interval_anchor);

    Ok(Dashboard {
        transactions: rows,
        highlights,
        totals,
    })
}

fn build_highlights(totals: &Totals, anchor: TotalIntervalAnchor) -> Highlights {
    Highlights {
        entries: HighlightSummary {
            amount: format_currency(totals.entries),
            last_transaction: last_transaction_label("Última entrada", totals.last_entry),
        },
        expenses: HighlightSummary {
            amount: format_currency(totals.expenses),
            last_transaction: last_transaction_label("Última saída", totals.last_expense),
        },
        total: HighlightSummary {
            amount: format_currency(totals.net),
            last_transaction: totals
                .interval_end(anchor)
                .map(month_interval_label)
                .unwrap_or_else(|| NO_MOVEMENT.to_string()),
        },
    }
}

fn last_transaction_label(prefix: &str, date: Option<NaiveDate>) -> String {
    match date {
        Some(date) => format!("{} dia {}", prefix, day_of_month_label(date)),
        None => NO_TRANSACTIONS.to_string(),
    }
}
