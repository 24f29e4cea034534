pub mod format;
pub mod sender;

use crate::model::NotifyError;
use format::ChannelMessage;
use reqwest::Client;
use std::time::Duration;

pub struct TelegramNotifier {
    pub bot_token: String,
    pub channel_id: String,
    pub client: Client,
}

impl TelegramNotifier {
    pub fn new(bot_token: String, channel_id: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("❗ Failed to create HTTP client");
        Self {
            bot_token,
            channel_id,
            client,
        }
    }

    pub async fn notify(&self, message: &ChannelMessage) -> Result<(), NotifyError> {
        sender::send_message(self, message).await
    }

    pub async fn notify_text(&self, text: &str) -> Result<(), NotifyError> {
        let message = ChannelMessage {
            text: text.to_string(),
            buttons: Vec::new(),
        };
        sender::send_message(self, &message).await
    }
}
