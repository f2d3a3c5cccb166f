use std::sync::Arc;

use ecg_viewer::{HttpDataSource, Session};

#[derive(Clone)]
pub struct AppState {
    pub session: Arc<Session<HttpDataSource>>,
}

impl AppState {
    pub fn new(source: HttpDataSource) -> Self {
        Self {
            session: Arc::new(Session::new(Arc::new(source))),
        }
    }
}
