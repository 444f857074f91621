use crate::config::StorageConfig;
use crate::errors::{Result, StorageError};
use crate::models::{RunState, TaskLog};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex, MutexGuard};

/// Operational metadata kept beside the graph: the scheduler's run state and a
/// log of every import task.
pub struct Catalog {
    conn: Arc<Mutex<Connection>>,
}

impl Catalog {
    pub fn new(config: &StorageConfig) -> Result<Self> {
        if let Some(parent) = config.catalog_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&config.catalog_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StorageError::Poisoned(e.to_string()))
    }

    pub fn initialize_schema(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            "BEGIN;
            CREATE TABLE IF NOT EXISTS run_state (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                last_run_date TEXT NOT NULL,
                last_file_count INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS task_logs (
                task_id INTEGER PRIMARY KEY AUTOINCREMENT,
                task_name TEXT,
                start_time INTEGER NOT NULL,
                end_time INTEGER,
                status TEXT,
                details TEXT
            );
            COMMIT;",
        )?;
        Ok(())
    }

    pub fn get_run_state(&self) -> Result<Option<RunState>> {
        let conn = self.lock()?;
        let state = conn
            .query_row(
                "SELECT last_run_date, last_file_count FROM run_state WHERE id = 1",
                [],
                |row| {
                    Ok(RunState {
                        last_run_date: row.get(0)?,
                        last_file_count: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(state)
    }

    pub fn save_run_state(&self, state: &RunState) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO run_state (id, last_run_date, last_file_count)
             VALUES (1, ?1, ?2)
             ON CONFLICT(id) DO UPDATE SET
                last_run_date = excluded.last_run_date,
                last_file_count = excluded.last_file_count",
            params![state.last_run_date, state.last_file_count],
        )?;
        Ok(())
    }

    pub fn create_task_log(&self, task_name: &str) -> Result<i64> {
        let conn = self.lock()?;
        let start_time = chrono::Utc::now().timestamp();
        conn.execute(
            "INSERT INTO task_logs (task_name, start_time, status) VALUES (?1, ?2, 'RUNNING')",
            params![task_name, start_time],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn update_task_log_status(&self, task_id: i64, status: &str, details: &str) -> Result<()> {
        let conn = self.lock()?;
        let end_time = chrono::Utc::now().timestamp();
        conn.execute(
            "UPDATE task_logs SET status = ?1, details = ?2, end_time = ?3 WHERE task_id = ?4",
            params![status, details, end_time, task_id],
        )?;
        Ok(())
    }

    pub fn get_task_log(&self, task_id: i64) -> Result<Option<TaskLog>> {
        let conn = self.lock()?;
        let log = conn
            .query_row(
                "SELECT task_id, task_name, start_time, end_time, status, details
                 FROM task_logs WHERE task_id = ?1",
                params![task_id],
                |row| {
                    Ok(TaskLog {
                        task_id: row.get(0)?,
                        task_name: row.get(1)?,
                        start_time: row.get(2)?,
                        end_time: row.get(3)?,
                        status: row.get(4)?,
                        details: row.get(5)?,
                    })
                },
            )
            .optional()?;
        Ok(log)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use tempfile::tempdir;

    fn setup() -> (Catalog, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let config = StorageConfig::new(dir.path());
        let catalog = Catalog::new(&config).unwrap();
        catalog.initialize_schema().unwrap();
        (catalog, dir)
    }

    #[test]
    fn test_run_state_upsert() {
        let (catalog, _dir) = setup();
        assert!(catalog.get_run_state().unwrap().is_none());

        let state = RunState {
            last_run_date: "2024-05-01".to_string(),
            last_file_count: 10,
        };
        catalog.save_run_state(&state).unwrap();
        assert_eq!(catalog.get_run_state().unwrap(), Some(state));

        // Test update
        let updated = RunState {
            last_run_date: "2024-05-02".to_string(),
            last_file_count: 12,
        };
        catalog.save_run_state(&updated).unwrap();
        assert_eq!(catalog.get_run_state().unwrap(), Some(updated));
    }

    #[test]
    fn test_task_log_crud() {
        let (catalog, _dir) = setup();

        // Test create
        let task_id = catalog.create_task_log("import_matches").unwrap();
        assert_eq!(task_id, 1);
        let running = catalog.get_task_log(task_id).unwrap().unwrap();
        assert_eq!(running.status, "RUNNING");
        assert!(running.end_time.is_none());

        // Test update
        catalog
            .update_task_log_status(task_id, "SUCCESS", "3 imported")
            .unwrap();
        let done = catalog.get_task_log(task_id).unwrap().unwrap();
        assert_eq!(done.status, "SUCCESS");
        assert_eq!(done.details.as_deref(), Some("3 imported"));
        assert!(done.end_time.is_some());
    }
}
