// notifier/telegram/sender.rs

use crate::model::NotifyError;
use crate::notifier::telegram::TelegramNotifier;
use crate::notifier::telegram::format::ChannelMessage;
use serde_json::json;
use tracing::{info, warn};

/// Sends one channel message via the Bot API. Button rows become an inline
/// keyboard; messages without buttons go out as plain text.
pub async fn send_message(
    notifier: &TelegramNotifier,
    message: &ChannelMessage,
) -> Result<(), NotifyError> {
    let url = format!(
        "https://api.telegram.org/bot{}/sendMessage",
        notifier.bot_token
    );

    let mut body = json!({
        "chat_id": notifier.channel_id,
        "text": message.text,
        "disable_web_page_preview": false,
    });
    if !message.buttons.is_empty() {
        let keyboard: Vec<Vec<serde_json::Value>> = message
            .buttons
            .iter()
            .map(|row| {
                row.iter()
                    .map(|b| json!({ "text": b.text, "url": b.url }))
                    .collect()
            })
            .collect();
        body["reply_markup"] = json!({ "inline_keyboard": keyboard });
    }

    let response = notifier.client.post(&url).json(&body).send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_else(|_| "unknown".into());
        warn!("❌ Telegram API responded [{}]: {}", status, body);
        return Err(NotifyError::Api { status, body });
    }
    info!("✅ Telegram message sent [{}]", status);
    Ok(())
}
