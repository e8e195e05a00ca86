//! `show interfaces status` table parser.
//!
//! The table is whitespace aligned, but a column value may contain single
//! spaces (`10/100/1000BaseTX SFP`, `AP lobby`), so columns are split on runs
//! of two or more whitespace characters:
//!
//! ```text
//! Port      Name               Status       Vlan  Duplex  Speed   Type
//! ----      ----               ------       ----  ------  -----   ----
//! Gi1/0/1   uplink             connected    1     a-full  a-1000  10/100/1000BaseTX
//! ```
//!
//! Lines that come out with fewer than [`MIN_FIELDS`] columns (wrapped or
//! truncated rows, rows with an empty name) are dropped without error.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Columns a data line needs before it becomes a record.
pub const MIN_FIELDS: usize = 7;

static HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Port\s+Name\s+Status\b").expect("HEADER is a valid regex"));

static COLUMN_GAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("COLUMN_GAP is a valid regex"));

/// One row of the interface status table, as reported by the device.
///
/// Field values are passed through verbatim; nothing is interpreted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceStatus {
    #[serde(rename = "Port")]
    pub port: String,

    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "Status")]
    pub status: String,

    #[serde(rename = "Vlan")]
    pub vlan: String,

    #[serde(rename = "Duplex")]
    pub duplex: String,

    #[serde(rename = "Speed")]
    pub speed: String,

    /// Media or connector type (the `Type` column).
    #[serde(rename = "Type")]
    pub media_type: String,
}

impl InterfaceStatus {
    /// Column labels, in table order.
    pub const HEADERS: [&'static str; 7] =
        ["Port", "Name", "Status", "Vlan", "Duplex", "Speed", "Type"];

    /// Build a record from split columns; absent positions become empty.
    fn from_fields(fields: &[&str]) -> Self {
        let field = |i: usize| fields.get(i).map(|s| s.to_string()).unwrap_or_default();
        Self {
            port: field(0),
            name: field(1),
            status: field(2),
            vlan: field(3),
            duplex: field(4),
            speed: field(5),
            media_type: field(6),
        }
    }

    /// Field values in [`HEADERS`](Self::HEADERS) order.
    pub fn values(&self) -> [&str; 7] {
        [
            &self.port,
            &self.name,
            &self.status,
            &self.vlan,
            &self.duplex,
            &self.speed,
            &self.media_type,
        ]
    }

    /// Whether the port reports link up.
    pub fn is_connected(&self) -> bool {
        self.status.eq_ignore_ascii_case("connected")
    }
}

/// Extract interface records from raw `show interfaces status` output.
///
/// Everything before the header line (command echo, banners) is ignored.
/// Without a header the result is empty. Never fails.
pub fn parse_interface_status(raw: &str) -> Vec<InterfaceStatus> {
    let mut lines = raw.lines().map(str::trim);

    if !lines.by_ref().any(|line| HEADER.is_match(line)) {
        return Vec::new();
    }

    lines
        .filter(|line| !line.is_empty() && !is_separator(line))
        .filter_map(|line| {
            let fields: Vec<&str> = COLUMN_GAP.split(line).collect();
            (fields.len() >= MIN_FIELDS).then(|| InterfaceStatus::from_fields(&fields))
        })
        .collect()
}

/// A row of dash groups under the header.
fn is_separator(line: &str) -> bool {
    line.contains('-') && line.chars().all(|c| c == '-' || c.is_whitespace())
}
