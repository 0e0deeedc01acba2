//! 转换事件的可观测性测试：每次成功转换输出一条 `debug!`，失败不输出。

use std::sync::{Arc, Mutex};

use spark_msgconv::{
    ConversionContext, ConverterRegistry, InternalMessage, LegacyMessage, MessageProperties,
    Protocol, SourceMessage,
};
use tracing::{
    Event, Level, Subscriber,
    field::{Field, Visit},
};
use tracing_subscriber::{
    EnvFilter,
    layer::{Context, Layer, SubscriberExt},
};

#[derive(Debug, Default, Clone)]
struct Recorded {
    message: String,
    fields: Vec<(String, String)>,
}

impl Visit for Recorded {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let rendered = format!("{value:?}");
        if field.name() == "message" {
            self.message = rendered;
        } else {
            self.fields.push((field.name().to_owned(), rendered));
        }
    }
}

#[derive(Clone, Default)]
struct Capture {
    events: Arc<Mutex<Vec<Recorded>>>,
}

impl<S: Subscriber> Layer<S> for Capture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() != Level::DEBUG {
            return;
        }
        let mut recorded = Recorded::default();
        event.record(&mut recorded);
        self.events.lock().expect("锁未中毒").push(recorded);
    }
}

fn field<'a>(event: &'a Recorded, name: &str) -> Option<&'a str> {
    event
        .fields
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

#[test]
fn successful_conversion_emits_one_debug_event() {
    let capture = Capture::default();
    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::new("spark_msgconv=debug"))
        .with(capture.clone());

    tracing::subscriber::with_default(subscriber, || {
        let ctx = ConversionContext::default();
        let source: SourceMessage = LegacyMessage::legacy(
            ctx.pool(),
            Protocol::V0_8,
            Some("text/plain"),
            MessageProperties::default(),
            b"hello",
        )
        .expect("分配失败")
        .into();
        ConverterRegistry::new()
            .convert(&source, Protocol::V1_0, &ctx)
            .expect("文本可转换");

        let failing: SourceMessage = InternalMessage::new("x").into();
        ConverterRegistry::new()
            .convert(&failing, Protocol::Internal, &ctx)
            .expect_err("同协议不是转换");
    });

    let events = capture.events.lock().expect("锁未中毒");
    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.message, "message converted");
    assert_eq!(field(event, "source"), Some("0-8"));
    assert_eq!(field(event, "target"), Some("1.0"));
    assert_eq!(field(event, "kind"), Some("Some(Text)"));
}
