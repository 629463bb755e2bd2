use std::sync::Arc;

use yota_service::YotaService;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<YotaService>,
}
impl AppState {
	pub fn new(config: yota_config::Config) -> Self {
		Self::with_service(YotaService::new(config))
	}

	pub fn with_service(service: YotaService) -> Self {
		Self { service: Arc::new(service) }
	}
}
