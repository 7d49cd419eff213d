use std::sync::Arc;

use estate_db::Database;
use estate_media::Storage;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub storage: Storage,
}
