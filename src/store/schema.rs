//! Schema migrations for the SQLite record store.
//!
//! The on-disk version lives in `PRAGMA user_version`. Steps are applied in order,
//! one transaction each, and may only create tables or indexes: a database written
//! by a newer build stays readable by an older one.

#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: i64,
    pub description: &'static str,
    pub statements: &'static [&'static str],
}

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "connections",
        statements: &[r#"
        CREATE TABLE IF NOT EXISTS connections (
            friendly_name TEXT PRIMARY KEY NOT NULL,
            service_type TEXT NOT NULL,
            encrypted_key TEXT NOT NULL,
            endpoint TEXT NULL,
            model TEXT NULL,
            created_at TEXT NOT NULL, -- RFC3339
            updated_at TEXT NOT NULL -- RFC3339
        )
        "#],
    },
    Migration {
        version: 2,
        description: "local drafts",
        statements: &[r#"
        CREATE TABLE IF NOT EXISTS drafts (
            id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            is_public INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL, -- RFC3339
            updated_at TEXT NOT NULL -- RFC3339
        )
        "#],
    },
    Migration {
        version: 3,
        description: "index connections by service type",
        statements: &[
            "CREATE INDEX IF NOT EXISTS idx_connections_service_type ON connections(service_type)",
        ],
    },
];

/// Version a freshly opened store is migrated to.
pub const SCHEMA_VERSION: i64 = 3;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versions_are_contiguous_and_end_at_current() {
        for (idx, migration) in MIGRATIONS.iter().enumerate() {
            assert_eq!(migration.version, idx as i64 + 1);
            assert!(!migration.statements.is_empty());
        }
        assert_eq!(MIGRATIONS.last().map(|m| m.version), Some(SCHEMA_VERSION));
    }

    #[test]
    fn every_statement_is_additive() {
        for migration in MIGRATIONS {
            for stmt in migration.statements {
                let normalized = stmt.split_whitespace().collect::<Vec<_>>().join(" ");
                let upper = normalized.to_ascii_uppercase();
                assert!(
                    upper.starts_with("CREATE TABLE IF NOT EXISTS")
                        || upper.starts_with("CREATE INDEX IF NOT EXISTS"),
                    "migration {} is not additive: {normalized}",
                    migration.version
                );
                for forbidden in ["DROP ", "ALTER TABLE", "RENAME", "DELETE "] {
                    assert!(
                        !upper.contains(forbidden),
                        "migration {} contains {forbidden:?}",
                        migration.version
                    );
                }
            }
        }
    }
}
