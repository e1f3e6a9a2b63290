use std::env::var;

use dotenvy::dotenv;

pub struct Config {
    pub port: u16,
    pub host: String,
    pub database_url: String,
    pub webhook_verify_token: String,
    pub cron_secret: String,
    pub graph_api_base: String,
    pub whatsapp_api_version: String,
    pub decision_api_url: Option<String>,
    pub send_timeout_secs: u64,
    pub scheduler_enabled: bool,
    pub scheduler_interval_secs: u64,
}

impl Config {
    pub fn try_parse() -> Result<Config, &'static str> {
        let _ = dotenv();

        Ok(Config {
            port: var("PORT")
                .map_err(|_| "An error occured while getting PORT env param")?
                .parse::<u16>()
                .map_err(|_| "An error occured while parsing PORT env param")?,
            host: var("HOST").map_err(|_| "An error occured while getting HOST env param")?,
            database_url: var("DATABASE_URL")
                .map_err(|_| "An error occured while getting DATABASE_URL env param")?,
            webhook_verify_token: var("WEBHOOK_VERIFY_TOKEN")
                .map_err(|_| "An error occured while getting WEBHOOK_VERIFY_TOKEN env param")?,
            cron_secret: var("CRON_SECRET")
                .map_err(|_| "An error occured while getting CRON_SECRET env param")?,
            graph_api_base: var("GRAPH_API_BASE")
                .unwrap_or_else(|_| "https://graph.facebook.com".to_string()),
            whatsapp_api_version: var("WHATSAPP_API_VERSION")
                .unwrap_or_else(|_| "v21.0".to_string()),
            decision_api_url: var("DECISION_API_URL").ok().filter(|url| !url.is_empty()),
            send_timeout_secs: match var("SEND_TIMEOUT_SECS") {
                Ok(value) => value
                    .parse::<u64>()
                    .map_err(|_| "An error occured while parsing SEND_TIMEOUT_SECS env param")?,
                Err(_) => 30,
            },
            scheduler_enabled: match var("SCHEDULER_ENABLED") {
                Ok(value) => value != "false" && value != "0",
                Err(_) => true,
            },
            scheduler_interval_secs: match var("SCHEDULER_INTERVAL_SECS") {
                Ok(value) => value.parse::<u64>().map_err(|_| {
                    "An error occured while parsing SCHEDULER_INTERVAL_SECS env param"
                })?,
                Err(_) => 60,
            },
        })
    }
}
