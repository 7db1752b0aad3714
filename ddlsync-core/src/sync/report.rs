//! Run statistics and log line formats.

use crate::models::{FillKind, ObjectKind, ObjectState, Schema};

/// Outcome counts of one kind in one schema.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    /// Objects that failed
    pub error: usize,
    /// Files left untouched
    pub no_change: usize,
    /// Files created
    pub insert: usize,
    /// Files rewritten
    pub update: usize,
}

impl Tally {
    /// Counts one terminal state; `Ignore` and `Unprocessed` are not counted.
    pub fn record(&mut self, state: ObjectState) {
        match state {
            ObjectState::Error => self.error += 1,
            ObjectState::NoChange => self.no_change += 1,
            ObjectState::Insert => self.insert += 1,
            ObjectState::Update => self.update += 1,
            ObjectState::Ignore | ObjectState::Unprocessed => {}
        }
    }

    /// Adds another tally.
    pub fn merge(&mut self, other: &Self) {
        self.error += other.error;
        self.no_change += other.no_change;
        self.insert += other.insert;
        self.update += other.update;
    }

    /// Files written, created or rewritten.
    pub const fn writes(&self) -> usize {
        self.insert + self.update
    }
}

/// Tally of one report row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindTally {
    /// Schema name
    pub schema: String,
    /// Object kind or fill label
    pub label: &'static str,
    /// Outcome counts
    pub tally: Tally,
}

/// Result of a synchronization run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Schemas with their terminal object and fill states
    pub schemas: Vec<Schema>,
    /// Per-schema, per-kind outcome counts
    pub tallies: Vec<KindTally>,
}

impl SyncReport {
    /// Builds the report by scanning terminal states.
    pub fn from_schemas(schemas: Vec<Schema>) -> Self {
        let mut tallies = Vec::new();
        for schema in &schemas {
            for kind in ObjectKind::ALL {
                let mut objects = schema.objects.iter().filter(|o| o.kind == kind).peekable();
                if objects.peek().is_none() {
                    continue;
                }
                let mut tally = Tally::default();
                objects.for_each(|o| tally.record(o.state()));
                tallies.push(KindTally {
                    schema: schema.name.clone(),
                    label: kind.as_str(),
                    tally,
                });
            }
            for fill in [FillKind::Full, FillKind::Demo] {
                if schema.fill_count_of(fill) == 0 {
                    continue;
                }
                let mut tally = Tally::default();
                schema
                    .table_fills
                    .iter()
                    .filter(|f| f.fill == fill)
                    .for_each(|f| tally.record(f.state()));
                tallies.push(KindTally {
                    schema: schema.name.clone(),
                    label: fill.as_str(),
                    tally,
                });
            }
        }
        Self { schemas, tallies }
    }

    /// Sum over all rows.
    pub fn total(&self) -> Tally {
        let mut total = Tally::default();
        for row in &self.tallies {
            total.merge(&row.tally);
        }
        total
    }

    /// Tally of one schema and label, if present.
    pub fn tally_of(&self, schema: &str, label: &str) -> Option<Tally> {
        self.tallies
            .iter()
            .find(|t| t.schema == schema && t.label == label)
            .map(|t| t.tally)
    }
}

/// Inventory line of one kind: `TABLE            000012`.
pub fn stat_line(label: &str, count: usize, ignored: bool) -> String {
    let suffix = if ignored { " (ignored)" } else { "" };
    format!("{label:<16} {count:06}{suffix}")
}

/// Final tally line of one kind.
pub fn tally_line(label: &str, tally: &Tally) -> String {
    format!(
        "{label:<16}[error]={:06}; [no changes]={:06}; [create]={:06}; [update]={:06};",
        tally.error, tally.no_change, tally.insert, tally.update
    )
}

/// Running percentage of processed units, e.g. `07.5%`.
pub fn percent(done: usize, total: usize) -> String {
    let ratio = if total == 0 {
        100.0
    } else {
        done as f64 / total as f64 * 100.0
    };
    format!("{ratio:04.1}%")
}

/// Log word of a terminal state.
pub const fn state_label(state: ObjectState) -> &'static str {
    match state {
        ObjectState::Unprocessed => "unprocessed",
        ObjectState::NoChange => "no changes",
        ObjectState::Insert => "create",
        ObjectState::Update => "update",
        ObjectState::Error => "error",
        ObjectState::Ignore => "ignore",
    }
}
