#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Once;

use rusqlite::Connection;
use sql_oracle::execute::SqliteExecutor;
use tracing_subscriber::{filter::Directive, EnvFilter, FmtSubscriber};

pub const REFERENCE_SQL: &str = include_str!("../sql/reference.sql");

static INIT: Once = Once::new();
static NEXT_FILE: AtomicUsize = AtomicUsize::new(0);

pub fn trace() {
    INIT.call_once(|| {
        let log_level: Directive = tracing::Level::DEBUG.into();

        let filter = EnvFilter::from_default_env().add_directive(log_level.to_owned());

        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_file(true)
            .with_line_number(true)
            .with_target(true)
            .with_test_writer()
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .expect("setting default subscriber failed");
    });
}

/// An in-memory copy of the reference database.
pub fn reference() -> SqliteExecutor {
    let connection = Connection::open_in_memory().unwrap();
    connection.execute_batch(REFERENCE_SQL).unwrap();
    SqliteExecutor::from_connection(connection)
}

/// The reference database written to a file, removed when dropped.
pub struct ReferenceFile {
    path: PathBuf,
}

impl ReferenceFile {
    pub fn create() -> Self {
        let path = std::env::temp_dir().join(format!(
            "sql-oracle-reference-{}-{}.sqlite",
            std::process::id(),
            NEXT_FILE.fetch_add(1, Ordering::SeqCst)
        ));

        let connection = Connection::open(&path).unwrap();
        connection.execute_batch(REFERENCE_SQL).unwrap();

        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ReferenceFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// The latest trip per person, as a nested subquery and as a CTE. Aliases and projection order
/// differ between the two.
pub const WINDOW_OVER_SUBQUERY: &str = "
    SELECT id_card, name, to_place, to_place_address, start_time
    FROM (
        SELECT id_card, name, to_place, to_place_address, start_time,
            ROW_NUMBER() OVER (PARTITION BY id_card ORDER BY start_time DESC) T114514
        FROM zh_gj_info
        WHERE name = '张三'
    ) T1919810
    WHERE T114514 = 1";

pub const WINDOW_IN_CTE: &str = "
    WITH T1 AS (
        SELECT id_card, name, to_place, to_place_address, start_time,
            ROW_NUMBER() OVER (PARTITION BY id_card ORDER BY start_time DESC) T2
        FROM zh_gj_info
        WHERE name = '张三'
    )
    SELECT id_card, name, to_place_address, to_place, start_time
    FROM T1
    WHERE T2 = 1";

pub const SALES_OVER_100: &str = "SELECT name FROM emp WHERE dept = 'sales' AND salary > 100";

pub const ALL_SALES: &str = "SELECT name FROM emp WHERE dept = 'sales'";
