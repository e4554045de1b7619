// End-to-end: scripted sources through the engine into recording sinks.

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use parking_lot::Mutex;
use trunkwatch_app::monitor::run_monitor;
use trunkwatch_core::{
    AlertPayload, AlertSink, Engine, EngineError, EngineResult, InboundEvent, MonitorConfig,
    SeverityTier, StreamSource,
};

const LOG_CHANNEL: &str = "1460097551293218925";
const LOG_BOT: &str = "1460097576647790595";
const ALERT_CHANNEL: &str = "1461066823687602392";

/// Records every delivered alert with its target channel.
#[derive(Default)]
struct Recorder {
    delivered: Mutex<Vec<(String, AlertPayload)>>,
}

impl Recorder {
    fn alerts(&self) -> Vec<(String, AlertPayload)> {
        self.delivered.lock().clone()
    }
}

#[async_trait]
impl AlertSink for Recorder {
    fn name(&self) -> &str {
        "recorder"
    }

    async fn deliver(&self, channel_id: &str, alert: &AlertPayload) -> EngineResult<()> {
        self.delivered.lock().push((channel_id.to_string(), alert.clone()));
        Ok(())
    }
}

/// Always fails, like a Discord outage.
struct BrokenSink;

#[async_trait]
impl AlertSink for BrokenSink {
    fn name(&self) -> &str {
        "broken"
    }

    async fn deliver(&self, _channel_id: &str, _alert: &AlertPayload) -> EngineResult<()> {
        Err(EngineError::channel("broken", "HTTP 503"))
    }
}

fn config() -> MonitorConfig {
    MonitorConfig {
        source_channel_id: LOG_CHANNEL.into(),
        source_author_id: LOG_BOT.into(),
        alert_channel_id: ALERT_CHANNEL.into(),
        ..Default::default()
    }
}

fn t(secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 20, 0, 0).unwrap() + Duration::seconds(secs)
}

fn log_line(name: &str, license: &str, verb: &str, item: &str, place: &str, container: &str) -> String {
    format!(
        "O jogador **{}** (license:{}, 42) {} **{}** no {} do veículo {}",
        name, license, verb, item, place, container
    )
}

fn event(content: String, secs: i64) -> InboundEvent {
    InboundEvent {
        channel_id: LOG_CHANNEL.into(),
        author_id: LOG_BOT.into(),
        content,
        received_at: t(secs),
    }
}

fn glove_deposit(secs: i64) -> InboundEvent {
    event(log_line("JPZIN", "1b0779c0", "colocou", "dinheiro x200", "porta-luvas", "gloveboxAAA1"), secs)
}

#[tokio::test]
async fn three_deposits_raise_one_alert_on_the_third() {
    let sink = Recorder::default();
    let mut source = StreamSource::new(futures::stream::iter(vec![
        glove_deposit(0),
        glove_deposit(10),
        glove_deposit(20),
    ]));

    let stats = run_monitor(config(), &mut source, &sink).await.unwrap();
    let alerts = sink.alerts();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].0, ALERT_CHANNEL);
    assert_eq!(alerts[0].1.tier, SeverityTier::Initial);
    assert_eq!(alerts[0].1.generated_at, t(20));
    assert_eq!(stats.spam_signals, 1);
    assert_eq!(stats.alerts_delivered, 1);
}

#[tokio::test]
async fn fourth_deposit_escalates() {
    let sink = Recorder::default();
    let mut engine = Engine::new(config());
    for secs in [0, 5, 10, 15] {
        engine.handle(&glove_deposit(secs), &sink).await;
    }
    let alerts = sink.alerts();
    assert_eq!(alerts.len(), 2);
    assert_eq!(alerts[1].1.tier, SeverityTier::Recurrent);
    assert!(alerts[1].1.title.contains("#2"));
}

#[tokio::test]
async fn spaced_deposits_never_alert() {
    let sink = Recorder::default();
    let mut engine = Engine::new(config());
    for i in 0..10 {
        engine.handle(&glove_deposit(i * 60), &sink).await;
    }
    assert!(sink.alerts().is_empty());
    assert_eq!(engine.stats().live_buckets, 1);
}

#[tokio::test]
async fn hand_off_alerts_once_and_consumes_the_deposit() {
    let sink = Recorder::default();
    let mut engine = Engine::new(config());

    let a = log_line("Alice", "aaaa", "colocou", "dinheiro x200", "porta-malas", "trunkABC");
    let b = log_line("Bob", "bbbb", "retirou", "dinheiro x200", "porta-malas", "trunkABC");
    let c = log_line("Carol", "cccc", "retirou", "dinheiro x200", "porta-malas", "trunkABC");

    engine.handle(&event(a, 0), &sink).await;
    engine.handle(&event(b, 5), &sink).await;
    engine.handle(&event(c, 6), &sink).await;

    let alerts = sink.alerts();
    assert_eq!(alerts.len(), 1);
    let alert = &alerts[0].1;
    assert!(alert.title.contains("TRANSFERÊNCIA"));
    assert!(alert.description.contains("Alice") && alert.description.contains("Bob"));
    assert!(alert.fields.iter().any(|f| f.value == "`trunkABC` (porta-malas)"));
}

#[tokio::test]
async fn self_retrieval_keeps_deposit_for_real_partner() {
    let sink = Recorder::default();
    let mut engine = Engine::new(config());

    let dep = log_line("Alice", "aaaa", "colocou", "arma x1", "porta-malas", "trunkABC");
    let own = log_line("Alice", "aaaa", "retirou", "arma x1", "porta-malas", "trunkABC");
    let other = log_line("Bob", "bbbb", "pegou", "arma x1", "porta-malas", "trunkABC");

    engine.handle(&event(dep, 0), &sink).await;
    engine.handle(&event(own, 3), &sink).await;
    assert!(sink.alerts().is_empty());
    assert_eq!(engine.stats().pending_deposits, 1);

    engine.handle(&event(other, 30), &sink).await;
    assert_eq!(sink.alerts().len(), 1);
}

#[tokio::test]
async fn keyword_in_player_name_does_not_flip_the_action() {
    let sink = Recorder::default();
    let mut engine = Engine::new(config());
    let dep = log_line("Alice", "aaaa", "colocou", "pao x1", "porta-malas", "trunkABC");
    let wd = log_line("Guardouzinho", "gggg", "retirou", "pao x1", "porta-malas", "trunkABC");

    engine.handle(&event(dep, 0), &sink).await;
    engine.handle(&event(wd, 4), &sink).await;

    let alerts = sink.alerts();
    assert_eq!(alerts.len(), 1);
    assert!(alerts[0].1.title.contains("TRANSFERÊNCIA"));
    assert_eq!(engine.stats().pending_deposits, 0);
}

#[tokio::test]
async fn late_partner_is_not_a_transfer() {
    let sink = Recorder::default();
    let mut engine = Engine::new(config());
    let dep = log_line("Alice", "aaaa", "colocou", "arma x1", "porta-malas", "trunkABC");
    let late = log_line("Bob", "bbbb", "retirou", "arma x1", "porta-malas", "trunkABC");
    engine.handle(&event(dep, 0), &sink).await;
    engine.handle(&event(late, 60), &sink).await;
    assert!(sink.alerts().is_empty());
}

#[tokio::test]
async fn foreign_messages_are_ignored() {
    let sink = Recorder::default();
    let mut engine = Engine::new(config());
    for secs in 0..5 {
        let mut ev = glove_deposit(secs);
        ev.author_id = "someone-else".into();
        engine.handle(&ev, &sink).await;
    }
    assert!(sink.alerts().is_empty());
    assert_eq!(engine.stats().events_filtered, 5);
}

#[tokio::test]
async fn sink_failure_leaves_state_consistent() {
    let mut engine = Engine::new(config());
    for secs in [0, 1, 2] {
        assert_eq!(engine.handle(&glove_deposit(secs), &BrokenSink).await, 0);
    }
    let stats = engine.stats();
    assert_eq!(stats.spam_signals, 1);
    assert_eq!(stats.delivery_failures, 1);
    assert_eq!(stats.live_cooldowns, 1);

    // escalation still advances after a failed delivery
    let sink = Recorder::default();
    engine.handle(&glove_deposit(3), &sink).await;
    assert_eq!(sink.alerts()[0].1.tier, SeverityTier::Recurrent);
}

#[tokio::test]
async fn invalid_config_is_rejected_before_running() {
    let sink = Recorder::default();
    let mut source = StreamSource::new(futures::stream::iter(Vec::<InboundEvent>::new()));
    let bad = MonitorConfig { time_window_secs: 0, ..config() };
    assert!(run_monitor(bad, &mut source, &sink).await.is_err());
}

#[tokio::test]
async fn mixed_items_are_totalled_in_the_alert() {
    let sink = Recorder::default();
    let mut engine = Engine::new(config());
    for (secs, item) in [(0, "dinheiro x100"), (1, "dinheiro x50"), (2, "ouro x5")] {
        let text = log_line("JPZIN", "1b0779c0", "colocou", item, "porta-luvas", "gloveboxAAA1");
        engine.handle(&event(text, secs), &sink).await;
    }
    let alerts = sink.alerts();
    let items = alerts[0].1.fields.iter().find(|f| f.name.contains("Itens")).unwrap();
    assert!(items.value.contains("ouro x5"));
    assert!(items.value.ends_with("**Total:** 155"));
}
