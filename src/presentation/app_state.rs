// Application state for HTTP handlers
use crate::application::machine_data_service::MachineDataService;

#[derive(Clone)]
pub struct AppState {
    pub machine_data_service: MachineDataService,
}
