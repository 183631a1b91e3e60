use bon::Builder;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uow_domain::{
    domain_event::DomainEvent,
    entity::Entity,
    error::{DomainError, DomainResult},
};
use uuid::Uuid;

/// 发件箱消息内容：保留事件的具体类型、版本与载荷
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboxEnvelope {
    pub event_type: String,
    pub event_version: usize,
    pub payload: Value,
}

impl OutboxEnvelope {
    pub fn from_event(event: &dyn DomainEvent) -> DomainResult<Self> {
        Ok(Self {
            event_type: event.event_type().to_string(),
            event_version: event.event_version(),
            payload: event.payload()?,
        })
    }
}

/// 发件箱记录
///
/// 创建后只允许投递方修改 `processed_at_utc` 与 `error`。
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboxMessage {
    /// 消息唯一标识（主键）
    id: Uuid,
    /// 事件类型名
    #[serde(rename = "type")]
    message_type: String,
    /// JSON 序列化的 `OutboxEnvelope`
    content: String,
    /// 事件被转换为消息的时间
    occurred_at_utc: DateTime<Utc>,
    /// 投递完成时间，未投递时为空
    processed_at_utc: Option<DateTime<Utc>>,
    /// 最近一次投递失败的原因，默认为空串
    #[builder(default)]
    #[serde(default)]
    error: String,
}

impl OutboxMessage {
    /// 由领域事件生成一条待投递的消息
    pub fn from_event(event: &dyn DomainEvent, occurred_at: DateTime<Utc>) -> DomainResult<Self> {
        let envelope = OutboxEnvelope::from_event(event)?;
        Ok(OutboxMessage::builder()
            .id(Uuid::new_v4())
            .message_type(envelope.event_type.clone())
            .content(serde_json::to_string(&envelope)?)
            .occurred_at_utc(occurred_at)
            .build())
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn message_type(&self) -> &str {
        &self.message_type
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn occurred_at_utc(&self) -> DateTime<Utc> {
        self.occurred_at_utc
    }

    pub fn processed_at_utc(&self) -> Option<DateTime<Utc>> {
        self.processed_at_utc
    }

    pub fn error(&self) -> &str {
        &self.error
    }

    pub fn is_processed(&self) -> bool {
        self.processed_at_utc.is_some()
    }

    pub fn mark_processed(&mut self, at: DateTime<Utc>) {
        self.processed_at_utc = Some(at);
        self.error.clear();
    }

    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.error = error.into();
    }

    pub fn envelope(&self) -> DomainResult<OutboxEnvelope> {
        Ok(serde_json::from_str(&self.content)?)
    }

    /// 还原为具体事件类型
    pub fn decode<E: DeserializeOwned>(&self) -> DomainResult<E> {
        let envelope = self.envelope()?;
        serde_json::from_value(envelope.payload).map_err(|e| DomainError::TypeMismatch {
            expected: std::any::type_name::<E>().to_string(),
            found: format!("{} ({e})", envelope.event_type),
        })
    }
}

impl Entity for OutboxMessage {
    const TYPE: &'static str = "outbox_messages";

    fn id(&self) -> Uuid {
        self.id
    }
}
