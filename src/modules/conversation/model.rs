use serde::Serialize;
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(FromRow)]
pub struct ConversationRaw {
    pub id: Uuid,
    pub last_message_at: chrono::DateTime<chrono::Utc>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub participant_ids: Vec<Uuid>,

    pub last_id: Option<Uuid>,
    pub last_sender_id: Option<Uuid>,
    pub last_content: Option<String>,
    pub last_created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub last_read_at: Option<chrono::DateTime<chrono::Utc>>,

    pub unread_count: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LastMessage {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub read_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub id: Uuid,
    pub participant_ids: Vec<Uuid>,
    pub last_message_at: chrono::DateTime<chrono::Utc>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub last_message: Option<LastMessage>,
    pub unread_count: i64,
}

impl From<ConversationRaw> for ConversationSummary {
    fn from(r: ConversationRaw) -> Self {
        let last_message = match (r.last_id, r.last_sender_id, r.last_content, r.last_created_at) {
            (Some(id), Some(sender_id), Some(content), Some(created_at)) => {
                Some(LastMessage { id, sender_id, content, created_at, read_at: r.last_read_at })
            }
            _ => None,
        };

        ConversationSummary {
            id: r.id,
            participant_ids: r.participant_ids,
            last_message_at: r.last_message_at,
            created_at: r.created_at,
            last_message,
            unread_count: r.unread_count,
        }
    }
}
