//! Developer-facing dump of the most recently written rows.
//!
//! After a mutation the services can render the tail of a collection as a
//! fixed-width text table and emit it as a `tracing` debug event on the
//! `market::snapshot` target. Nothing here touches HTTP responses.

use market_types::domain::order::Order;
use market_types::domain::user::User;
use std::fmt::Write as _;

pub const SNAPSHOT_TARGET: &str = "market::snapshot";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotSettings {
    /// Rows kept from the end of the collection.
    pub rows: usize,
    /// Longest cell printed before truncation.
    pub max_width: usize,
    /// Rows with an id at or below this one came from the seeder and are
    /// left out. Generated ids always land above every seeded id.
    pub seeded_through: i64,
}

impl SnapshotSettings {
    pub const DEFAULT_ROWS: usize = 5;
    pub const DEFAULT_MAX_WIDTH: usize = 25;

    pub fn seeded_through(&self, id: i64) -> Self {
        Self {
            seeded_through: id,
            ..self.clone()
        }
    }

    /// Table of the last `rows` non-seeded entries of `all`, which is id-ordered.
    pub fn table<T: TableRow>(&self, all: &[T]) -> DebugTable {
        let fresh: Vec<&T> = all
            .iter()
            .filter(|row| row.id() > self.seeded_through)
            .collect();
        let start = fresh.len().saturating_sub(self.rows);
        let mut table = DebugTable::new(T::COLUMNS, self.max_width);
        for row in &fresh[start..] {
            table.add_row(row.cells());
        }
        table
    }
}

impl Default for SnapshotSettings {
    fn default() -> Self {
        Self {
            rows: Self::DEFAULT_ROWS,
            max_width: Self::DEFAULT_MAX_WIDTH,
            seeded_through: 0,
        }
    }
}

pub trait TableRow {
    const COLUMNS: &'static [&'static str];
    fn id(&self) -> i64;
    fn cells(&self) -> Vec<String>;
}

fn cell<T: ToString>(v: &Option<T>) -> String {
    v.as_ref().map(ToString::to_string).unwrap_or_default()
}

impl TableRow for User {
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "first_name",
        "last_name",
        "age",
        "email",
        "role",
        "phone",
    ];

    fn id(&self) -> i64 {
        self.id
    }

    fn cells(&self) -> Vec<String> {
        let f = &self.fields;
        vec![
            self.id.to_string(),
            cell(&f.first_name),
            cell(&f.last_name),
            cell(&f.age),
            cell(&f.email),
            cell(&f.role),
            cell(&f.phone),
        ]
    }
}

impl TableRow for Order {
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "description",
        "start_date",
        "end_date",
        "address",
        "price",
        "customer_id",
        "executor_id",
    ];

    fn id(&self) -> i64 {
        self.id
    }

    fn cells(&self) -> Vec<String> {
        let f = &self.fields;
        vec![
            self.id.to_string(),
            cell(&f.name),
            cell(&f.description),
            cell(&f.start_date),
            cell(&f.end_date),
            cell(&f.address),
            cell(&f.price),
            cell(&f.customer_id),
            cell(&f.executor_id),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct DebugTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
    max_width: usize,
}

impl DebugTable {
    pub fn new(columns: &[&str], max_width: usize) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
            max_width: max_width.max(4),
        }
    }

    pub fn add_row(&mut self, mut cells: Vec<String>) {
        cells.resize(self.columns.len(), String::new());
        self.rows.push(cells);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn clip(&self, s: &str) -> String {
        let s = s.replace(['\n', '\r'], " ");
        if s.chars().count() <= self.max_width {
            return s;
        }
        let mut out: String = s.chars().take(self.max_width - 3).collect();
        out.push_str("...");
        out
    }

    pub fn render(&self) -> String {
        let header: Vec<String> = self.columns.iter().map(|c| self.clip(c)).collect();
        let body: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|r| r.iter().map(|c| self.clip(c)).collect())
            .collect();

        let widths: Vec<usize> = (0..header.len())
            .map(|i| {
                body.iter()
                    .map(|r| r[i].chars().count())
                    .chain(std::iter::once(header[i].chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let rule = {
            let mut s = String::from("+");
            for w in &widths {
                s.push_str(&"-".repeat(w + 2));
                s.push('+');
            }
            s
        };
        let line = |cells: &[String]| {
            let mut s = String::from("|");
            for (c, w) in cells.iter().zip(&widths) {
                let _ = write!(s, " {:<w$} |", c, w = *w);
            }
            s
        };

        let mut out = String::new();
        out.push_str(&rule);
        out.push('\n');
        out.push_str(&line(&header));
        out.push('\n');
        out.push_str(&rule);
        out.push('\n');
        for r in &body {
            out.push_str(&line(r));
            out.push('\n');
        }
        if !body.is_empty() {
            out.push_str(&rule);
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use market_types::domain::user::UserFields;

    fn user(id: i64, name: &str) -> User {
        User::new(
            id,
            UserFields {
                first_name: Some(name.into()),
                ..Default::default()
            },
        )
    }

    #[test]
    fn renders_aligned_grid() {
        let mut t = DebugTable::new(&["id", "name"], 25);
        t.add_row(vec!["1".into(), "Ann".into()]);
        t.add_row(vec!["12".into(), "Bartholomew".into()]);
        let expected = "\
+----+-------------+
| id | name        |
+----+-------------+
| 1  | Ann         |
| 12 | Bartholomew |
+----+-------------+
";
        assert_eq!(t.render(), expected);
    }

    #[test]
    fn long_cells_are_truncated() {
        let mut t = DebugTable::new(&["email"], 10);
        t.add_row(vec!["someone@example.com".into()]);
        let out = t.render();
        assert!(out.contains("| someone... |"));
        assert!(!out.contains("example"));
    }

    #[test]
    fn snapshot_skips_seeded_rows_and_keeps_tail() {
        let users: Vec<User> = (1..=9).map(|i| user(i, &format!("u{i}"))).collect();
        let settings = SnapshotSettings {
            rows: 3,
            ..SnapshotSettings::default()
        }
        .seeded_through(5);
        let table = settings.table(&users);
        assert_eq!(table.len(), 3);
        let out = table.render();
        assert!(out.contains("u7") && out.contains("u9"));
        assert!(!out.contains("u6"));
    }

    #[test]
    fn snapshot_of_only_seeded_rows_is_empty() {
        let users = vec![user(1, "seed")];
        let table = SnapshotSettings::default().seeded_through(4).table(&users);
        assert!(table.is_empty());
        assert_eq!(table.render().lines().count(), 3);
    }

    #[test]
    fn deleting_a_seeded_row_keeps_created_rows_visible() {
        // Seeded 1..=6, seeded row 1 deleted, row 7 created afterwards.
        let users: Vec<User> = (2..=7).map(|i| user(i, &format!("u{i}"))).collect();
        let table = SnapshotSettings::default().seeded_through(6).table(&users);
        assert_eq!(table.len(), 1);
        let out = table.render();
        assert!(out.contains("u7"));
        assert!(!out.contains("u6"));
    }
}
