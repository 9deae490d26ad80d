use crate::pipeline::Coordinator;
use crate::settings::Settings;

#[derive(Clone)]
pub(crate) struct ServerState {
    pub(crate) coordinator: Coordinator,
}

impl ServerState {
    pub(crate) fn settings(&self) -> &Settings {
        self.coordinator.settings()
    }
}
