//! `check-contacts`: who in the exported address book lives in a place.
//!
//! The location term is matched against the raw formatted address, but only
//! the sanitized address ever leaves this module: any address part that
//! starts with a street number is replaced wholesale.

use async_trait::async_trait;
use regex::RegexBuilder;
use std::path::PathBuf;
use tracing::debug;
use umbra_core::error::ToolError;
use umbra_core::tool::{Arity, Tool};

const NAME: &str = "check-contacts";
const FIRST_NAME: &str = "First Name";
const LAST_NAME: &str = "Last Name";
const ADDRESS: &str = "Address 1 - Formatted";
const ADDRESS_SEPARATOR: &str = ":::";
const REDACTED: &str = "[REDACTED - Street Address]";

pub struct ContactsTool {
    csv_path: PathBuf,
}

impl ContactsTool {
    pub fn new(csv_path: impl Into<PathBuf>) -> Self {
        Self { csv_path: csv_path.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Contact {
    full_name: String,
    address: String,
}

/// "123 Main St ::: Springfield ::: IL" → "[REDACTED - Street Address] ::: Springfield ::: IL"
fn sanitize_address(raw: &str) -> String {
    raw.split(ADDRESS_SEPARATOR)
        .map(str::trim)
        .map(|part| {
            if starts_with_street_number(part) {
                REDACTED
            } else {
                part
            }
        })
        .collect::<Vec<_>>()
        .join(" ::: ")
}

/// Leading digits followed by whitespace, like "42 Elm St".
fn starts_with_street_number(part: &str) -> bool {
    let digits = part.chars().take_while(char::is_ascii_digit).count();
    digits > 0 && part[digits..].starts_with(char::is_whitespace)
}

fn read_error(e: csv::Error) -> ToolError {
    ToolError::ExecutionFailed {
        tool_name: NAME.into(),
        reason: format!("contacts file is not valid CSV: {e}"),
    }
}

fn load_contacts(content: &str) -> Result<Vec<Contact>, ToolError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let header = reader.headers().map_err(read_error)?.clone();
    if header.is_empty() {
        return Err(ToolError::ExecutionFailed {
            tool_name: NAME.into(),
            reason: "contacts file is empty".into(),
        });
    }

    let column = |name: &str| header.iter().position(|h| h == name);
    let first_idx = column(FIRST_NAME);
    let last_idx = column(LAST_NAME);
    let address_idx = column(ADDRESS);
    if first_idx.is_none() && last_idx.is_none() {
        return Err(ToolError::ExecutionFailed {
            tool_name: NAME.into(),
            reason: format!("contacts file has no '{FIRST_NAME}' or '{LAST_NAME}' column"),
        });
    }

    let mut contacts = Vec::new();
    for record in reader.records() {
        let record = record.map_err(read_error)?;
        let cell = |idx: Option<usize>| idx.and_then(|i| record.get(i)).unwrap_or("");
        let full_name = [cell(first_idx), cell(last_idx)]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        let address = cell(address_idx);
        if full_name.is_empty() || address.is_empty() {
            continue;
        }
        contacts.push(Contact {
            full_name,
            address: address.to_string(),
        });
    }
    Ok(contacts)
}

fn find_matches(contacts: &[Contact], term: &str) -> Result<Vec<Contact>, ToolError> {
    let pattern = RegexBuilder::new(&format!(r"\b{}\b", regex::escape(term)))
        .case_insensitive(true)
        .build()
        .map_err(|e| ToolError::InvalidArguments(format!("search term: {e}")))?;
    Ok(contacts
        .iter()
        .filter(|c| pattern.is_match(&c.address))
        .cloned()
        .collect())
}

fn format_matches(term: &str, matches: &[Contact]) -> String {
    if matches.is_empty() {
        return format!("No contacts found matching '{term}'.");
    }
    let mut out = format!("Found {} contacts matching '{term}':", matches.len());
    for c in matches {
        out.push_str(&format!("\n- {} ({})", c.full_name, sanitize_address(&c.address)));
    }
    out
}

#[async_trait]
impl Tool for ContactsTool {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "List people in the user's address book who live in a place. Args: [city, state or country]."
    }

    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }

    async fn execute(&self, args: Vec<String>) -> Result<Option<String>, ToolError> {
        let term = args.first().map(String::as_str).unwrap_or("").trim();
        if term.is_empty() {
            return Err(ToolError::InvalidArguments("a location to look up is required".into()));
        }

        let content = match tokio::fs::read_to_string(&self.csv_path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ToolError::NotConfigured(format!(
                    "contacts file not found at {}",
                    self.csv_path.display()
                )));
            }
            Err(e) => {
                return Err(ToolError::ExecutionFailed {
                    tool_name: NAME.into(),
                    reason: format!("reading {}: {e}", self.csv_path.display()),
                });
            }
        };

        let contacts = load_contacts(content.trim_start_matches('\u{feff}'))?;
        let matches = find_matches(&contacts, term)?;
        debug!(term, total = contacts.len(), matched = matches.len(), "Checked contacts");
        Ok(Some(format_matches(term, &matches)))
    }
}
