use sqlx::MySqlPool;
use std::path::PathBuf;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: MySqlPool,
    pub upload_dir: PathBuf,
}

impl AppState {
    pub fn new(db_pool: MySqlPool, upload_dir: PathBuf) -> Self {
        Self {
            db_pool,
            upload_dir,
        }
    }
}
