use poem_openapi::Object;

#[derive(Object)]
pub struct WebhookAckDto {
    pub status: String,
}

#[derive(Object)]
pub struct CronRunResponseDto {
    pub status: String,
    pub processed: u32,
    pub errors: u32,
    pub timestamp: String,
}
