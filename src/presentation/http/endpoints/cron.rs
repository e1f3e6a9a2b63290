use std::sync::Arc;

use chrono::Utc;
use poem::Result as PoemResult;
use poem_openapi::{OpenApi, param::Header, payload::Json};

use crate::presentation::http::{
    endpoints::root::{ApiState, EndpointsTags},
    responses::CronRunResponseDto,
};

#[derive(Clone)]
pub struct CronEndpoints {
    state: Arc<ApiState>,
}

impl CronEndpoints {
    pub fn new(state: Arc<ApiState>) -> Self {
        Self { state }
    }
}

#[OpenApi]
impl CronEndpoints {
    /// One dispatcher pass, for deployments that trigger processing from
    /// an external cron instead of the built-in scheduler.
    #[oai(
        path = "/cron/process-nudges",
        method = "post",
        tag = EndpointsTags::Cron,
    )]
    pub async fn process_nudges(
        &self,
        #[oai(name = "X-Cron-Secret")] secret: Header<Option<String>>,
    ) -> PoemResult<Json<CronRunResponseDto>> {
        if secret.0.as_deref() != Some(self.state.cron_secret.as_str()) {
            return Err(poem::Error::from_string(
                "invalid cron secret",
                poem::http::StatusCode::FORBIDDEN,
            ));
        }

        let summary = self.state.dispatcher.run_tick().await;
        Ok(Json(CronRunResponseDto {
            status: "ok".to_string(),
            processed: summary.processed,
            errors: summary.errors,
            timestamp: Utc::now().to_rfc3339(),
        }))
    }
}
