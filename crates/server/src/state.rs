use orchestrator::RunDispatcher;

/// Shared handler state. Cloning shares the same run gate.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: RunDispatcher,
}

impl AppState {
    pub fn new(dispatcher: RunDispatcher) -> Self {
        Self { dispatcher }
    }

    pub fn run_in_progress(&self) -> bool {
        self.dispatcher.is_busy()
    }
}
