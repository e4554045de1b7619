// Trunkwatch — Discord Bridge
//
// Inbound: a Gateway WebSocket that forwards every MESSAGE_CREATE (content
// plus embed titles/descriptions) into the engine's event channel. No
// filtering happens here; the monitored author is itself a bot, so bot
// messages are not skipped. The engine decides what is relevant.
//
// Outbound: alerts are posted through the REST API as one embed per alert.
//
// Setup: discord.com/developers → Bot → enable "Message Content Intent",
// then export DISCORD_BOT_TOKEN.

use crate::http::reconnect_delay;
use async_trait::async_trait;
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use log::{error, info, warn};
use serde::Deserialize;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};
use trunkwatch_core::{AlertPayload, AlertSink, EngineError, EngineResult, InboundEvent};

/// Maximum reconnect attempts before giving up entirely.
const MAX_RECONNECT_ATTEMPTS: u32 = 8;

const DISCORD_GATEWAY_URL: &str = "wss://gateway.discord.gg/?v=10&encoding=json";
const DISCORD_API: &str = "https://discord.com/api/v10";
const CHANNEL: &str = "discord";

// Embed limits
const MAX_TITLE_CHARS: usize = 256;
const MAX_DESCRIPTION_CHARS: usize = 4096;
const MAX_FIELD_VALUE_CHARS: usize = 1024;
const MAX_FIELDS: usize = 25;

// ── Discord API Types ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct GatewayPayload {
    op: u8,
    d: Option<serde_json::Value>,
    s: Option<u64>,    // sequence number
    t: Option<String>, // event name
}

#[derive(Debug, Deserialize)]
struct ReadyEvent {
    user: DiscordUser,
}

#[derive(Debug, Clone, Deserialize)]
struct DiscordUser {
    id: String,
    username: String,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct DiscordEmbed {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DiscordMessage {
    pub channel_id: String,
    pub author: DiscordAuthor,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub embeds: Vec<DiscordEmbed>,
}

#[derive(Debug, Deserialize)]
pub struct DiscordAuthor {
    pub id: String,
}

fn channel_err(message: impl Into<String>) -> EngineError {
    EngineError::channel(CHANNEL, message)
}

// ── Message → event ────────────────────────────────────────────────────

/// Content followed by each embed's title and description, space-joined.
pub fn message_text(msg: &DiscordMessage) -> String {
    let mut text = msg.content.clone();
    for embed in &msg.embeds {
        for part in [&embed.title, &embed.description].into_iter().flatten() {
            text.push(' ');
            text.push_str(part);
        }
    }
    text
}

pub fn to_event(msg: &DiscordMessage) -> InboundEvent {
    InboundEvent {
        channel_id: msg.channel_id.clone(),
        author_id: msg.author.id.clone(),
        content: message_text(msg),
        received_at: Utc::now(),
    }
}

// ── Gateway ────────────────────────────────────────────────────────────

/// Spawn the gateway loop with reconnects. Events go to `tx`; the task ends
/// when `stop` is set, the receiver is dropped, or a fatal close code
/// (4004 bad token, 4014 disallowed intents) arrives.
pub fn spawn_gateway(
    token: String,
    tx: mpsc::Sender<InboundEvent>,
    stop: Arc<AtomicBool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut reconnect_attempt: u32 = 0;
        loop {
            match run_gateway_loop(&token, &tx, &stop).await {
                Ok(()) => {
                    if stop.load(Ordering::Relaxed) || tx.is_closed() {
                        break;
                    }
                    // Gateway asked us to reconnect.
                    reconnect_attempt = 0;
                }
                Err(e) => {
                    if stop.load(Ordering::Relaxed) {
                        break;
                    }
                    let msg = e.to_string();
                    if msg.contains("4004") || msg.contains("4014") {
                        error!("[discord] Fatal: {} — stopping (fix the bot configuration)", msg);
                        break;
                    }

                    reconnect_attempt += 1;
                    if reconnect_attempt > MAX_RECONNECT_ATTEMPTS {
                        error!("[discord] Max reconnect attempts ({}) reached — giving up", MAX_RECONNECT_ATTEMPTS);
                        break;
                    }
                    error!("[discord] Bridge error: {} — reconnecting", e);
                    let delay = reconnect_delay(reconnect_attempt - 1).await;
                    warn!("[discord] Reconnected after {}ms (attempt {})", delay.as_millis(), reconnect_attempt);
                }
            }
        }
        info!("[discord] Bridge stopped");
    })
}

async fn run_gateway_loop(
    token: &str,
    tx: &mpsc::Sender<InboundEvent>,
    stop: &Arc<AtomicBool>,
) -> EngineResult<()> {
    let (ws_stream, _) = connect_async(DISCORD_GATEWAY_URL)
        .await
        .map_err(|e| channel_err(e.to_string()))?;
    let (write, mut read) = ws_stream.split();

    // Hello (op 10) carries the heartbeat interval
    let hello = read
        .next()
        .await
        .ok_or_else(|| channel_err("Gateway closed before Hello"))?
        .map_err(|e| channel_err(e.to_string()))?;
    let hello_payload: GatewayPayload =
        serde_json::from_str(hello.to_text().map_err(|e| channel_err(e.to_string()))?)?;
    if hello_payload.op != 10 {
        return Err(channel_err(format!("Expected Hello (op 10), got op {}", hello_payload.op)));
    }
    let heartbeat_interval = hello_payload
        .d
        .as_ref()
        .and_then(|d| d["heartbeat_interval"].as_u64())
        .unwrap_or(41250);
    info!("[discord] Connected to gateway, heartbeat_interval={}ms", heartbeat_interval);

    let write = Arc::new(tokio::sync::Mutex::new(write));

    // Identify (op 2). Intents: GUILDS (1<<0) + GUILD_MESSAGES (1<<9) +
    // MESSAGE_CONTENT (1<<15, privileged; without it content arrives empty).
    let intents = (1 << 0) | (1 << 9) | (1 << 15);
    let identify = json!({
        "op": 2,
        "d": {
            "token": token,
            "intents": intents,
            "properties": {
                "os": std::env::consts::OS,
                "browser": "trunkwatch",
                "device": "trunkwatch"
            }
        }
    });
    write
        .lock()
        .await
        .send(WsMessage::Text(identify.to_string()))
        .await
        .map_err(|e| channel_err(e.to_string()))?;

    // Heartbeat task
    let (hb_tx, mut hb_rx) = mpsc::channel::<u64>(16);
    let hb_write = write.clone();
    let hb_stop = stop.clone();
    let heartbeat_task = tokio::spawn(async move {
        let mut seq: Option<u64> = None;
        loop {
            tokio::time::sleep(std::time::Duration::from_millis(heartbeat_interval)).await;
            if hb_stop.load(Ordering::Relaxed) {
                break;
            }
            while let Ok(s) = hb_rx.try_recv() {
                seq = Some(s);
            }
            let hb = json!({ "op": 1, "d": seq });
            if let Err(e) = hb_write.lock().await.send(WsMessage::Text(hb.to_string())).await {
                warn!("[discord] Heartbeat send failed: {}", e);
                break;
            }
        }
    });

    let result = read_events(&mut read, tx, stop, &hb_tx).await;
    heartbeat_task.abort();
    result
}

async fn read_events<R>(
    read: &mut R,
    tx: &mpsc::Sender<InboundEvent>,
    stop: &Arc<AtomicBool>,
    hb_tx: &mpsc::Sender<u64>,
) -> EngineResult<()>
where
    R: futures::Stream<Item = Result<WsMessage, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    while let Some(msg_result) = read.next().await {
        if stop.load(Ordering::Relaxed) {
            break;
        }
        let msg = match msg_result {
            Ok(m) => m,
            Err(e) => return Err(channel_err(format!("WS read error: {}", e))),
        };

        let text = match msg {
            WsMessage::Text(t) => t,
            WsMessage::Close(frame) => {
                let (code, reason) = frame
                    .map(|f| (f.code.into(), f.reason.to_string()))
                    .unwrap_or((0u16, String::new()));
                return match code {
                    4004 => Err(channel_err("Invalid bot token (4004)")),
                    4014 => Err(channel_err(
                        "Disallowed intents (4014) — enable 'Message Content Intent' in the Developer Portal",
                    )),
                    1000 | 0 => {
                        info!("[discord] Gateway closed normally (code={})", code);
                        Ok(())
                    }
                    _ => Err(channel_err(format!("Gateway closed: code={} {}", code, reason))),
                };
            }
            _ => continue,
        };

        let payload: GatewayPayload = match serde_json::from_str(&text) {
            Ok(p) => p,
            Err(_) => continue,
        };
        if let Some(s) = payload.s {
            let _ = hb_tx.try_send(s);
        }

        match payload.op {
            0 => match payload.t.as_deref().unwrap_or("") {
                "READY" => {
                    if let Some(ready) = payload.d.and_then(|d| serde_json::from_value::<ReadyEvent>(d).ok()) {
                        info!("[discord] Ready as {} ({})", ready.user.username, ready.user.id);
                    }
                }
                "MESSAGE_CREATE" => {
                    let Some(msg) = payload.d.and_then(|d| serde_json::from_value::<DiscordMessage>(d).ok())
                    else {
                        continue;
                    };
                    if tx.send(to_event(&msg)).await.is_err() {
                        info!("[discord] Engine stopped listening, closing gateway");
                        return Ok(());
                    }
                }
                _ => {}
            },
            // Heartbeat ACK
            11 => {}
            // Reconnect
            7 => {
                info!("[discord] Gateway requested reconnect");
                return Ok(());
            }
            // Invalid Session
            9 => return Err(channel_err("Invalid session — Discord rejected the connection")),
            _ => {}
        }
    }
    Ok(())
}

// ── Alert sink (REST) ──────────────────────────────────────────────────

pub struct DiscordSink {
    client: reqwest::Client,
    token: String,
    api_base: String,
}

impl DiscordSink {
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_api_base(token, DISCORD_API)
    }

    pub fn with_api_base(token: impl Into<String>, api_base: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), token: token.into(), api_base: api_base.into() }
    }
}

#[async_trait]
impl AlertSink for DiscordSink {
    fn name(&self) -> &str {
        CHANNEL
    }

    async fn deliver(&self, channel_id: &str, alert: &AlertPayload) -> EngineResult<()> {
        let url = format!("{}/channels/{}/messages", self.api_base, channel_id);
        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bot {}", self.token))
            .json(&render_alert(alert))
            .send()
            .await
            .map_err(|e| channel_err(format!("sendMessage failed: {}", e)))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(channel_err(format!("sendMessage {} failed: {} {}", channel_id, status, body)));
        }
        Ok(())
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// Message body for one alert: mention in `content`, details in one embed.
pub fn render_alert(alert: &AlertPayload) -> serde_json::Value {
    let fields: Vec<serde_json::Value> = alert
        .fields
        .iter()
        .take(MAX_FIELDS)
        .map(|f| {
            json!({
                "name": truncate_chars(&f.name, MAX_TITLE_CHARS),
                "value": truncate_chars(&f.value, MAX_FIELD_VALUE_CHARS),
                "inline": f.inline,
            })
        })
        .collect();

    json!({
        "content": alert.mention.as_mention(),
        "embeds": [{
            "title": truncate_chars(&alert.title, MAX_TITLE_CHARS),
            "description": truncate_chars(&alert.description, MAX_DESCRIPTION_CHARS),
            "color": alert.color,
            "fields": fields,
            "timestamp": alert.generated_at.to_rfc3339(),
            "footer": { "text": "trunkwatch" },
        }],
        // @here and @everyone are both governed by "everyone"
        "allowed_mentions": { "parse": ["everyone"] },
    })
}
