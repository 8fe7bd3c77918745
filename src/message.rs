// src/message.rs

use chrono::{Local, NaiveDate};
use tracing::{error, info};

use crate::error::{NotifierError, Result};
use crate::roster::RosterTable;

const STATUS_COLUMN: &str = "Status";
const NAME_COLUMN: &str = "Soldier Name";
const STATUS_SENTINEL: &str = "MRC4";

/// Render today's reminder from the roster.
pub fn compose(table: &RosterTable) -> Result<String> {
    compose_for_date(table, Local::now().date_naive())
}

/// Pure core: the message is a function of the roster and the date stamp.
pub fn compose_for_date(table: &RosterTable, today: NaiveDate) -> Result<String> {
    let status_col = table.column(STATUS_COLUMN).ok_or_else(|| missing(STATUS_COLUMN))?;
    let name_col = table.column(NAME_COLUMN).ok_or_else(|| missing(NAME_COLUMN))?;

    let names: Vec<&str> = table
        .rows
        .iter()
        .filter(|row| {
            row.get(status_col)
                .is_some_and(|status| status.eq_ignore_ascii_case(STATUS_SENTINEL))
        })
        .filter_map(|row| row.get(name_col).map(String::as_str))
        .collect();

    let stamp = today.format("%Y-%m-%d");
    let body = if names.is_empty() {
        format!("[{stamp}]\nAll soldiers are currently medically ready. Great job!")
    } else {
        format!(
            "[{stamp}]\n\
             Reminder: The following soldiers are currently listed as MRC4:\n\
             \n\
             {}\n\
             \n\
             Please have them schedule their medical readiness appointments ASAP.\n\
             \n\
             Also, please remind all soldiers on the flu shot list to send over the pictures of their flu shots uploaded to QTC.",
            names.join(",\n")
        )
    };

    info!("message composed");
    Ok(body)
}

fn missing(column: &str) -> NotifierError {
    error!("failed to compose message: roster has no '{column}' column");
    NotifierError::MissingColumn(column.to_string())
}
