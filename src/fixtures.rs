//! In-memory stand-ins for the Postgres and Redis repositories, shared by unit tests.

use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard,
    },
};

use actix_web::{dev::ServiceRequest, HttpMessage};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    api::error,
    modules::{
        conversation::{
            model::{ConversationSummary, LastMessage},
            repository::ConversationRepository,
            schema::ConversationEntity,
        },
        message::{model::InsertMessage, repository::MessageRepository, schema::MessageEntity},
        upload::{repository::UploadRepository, schema::UploadEntity},
    },
    utils::Claims,
};

/// Authenticates the request as the user named in the `x-user-id` header.
pub fn impersonate(req: &ServiceRequest) {
    let user_id = req
        .headers()
        .get("x-user-id")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| Uuid::parse_str(h).ok());

    if let Some(user_id) = user_id {
        req.extensions_mut().insert(Claims::new(&user_id, 3600));
    }
}

#[derive(Default)]
struct MessagingState {
    conversations: Vec<ConversationEntity>,
    participants: Vec<(Uuid, Uuid)>,
    messages: Vec<MessageEntity>,
    clock: Option<DateTime<Utc>>,
}

impl MessagingState {
    /// Strictly increasing timestamps so ordering assertions are deterministic.
    fn tick(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let next = match self.clock {
            Some(last) if now <= last => last + chrono::Duration::microseconds(1),
            _ => now,
        };
        self.clock = Some(next);
        next
    }

    fn is_participant(&self, conversation_id: Uuid, user_id: Uuid) -> bool {
        self.participants.iter().any(|&(c, u)| c == conversation_id && u == user_id)
    }

    fn insert_message(&mut self, conversation_id: Uuid, sender_id: Uuid, content: &str) -> MessageEntity {
        let created_at = self.tick();
        let message = MessageEntity {
            id: Uuid::now_v7(),
            conversation_id,
            sender_id,
            content: content.to_string(),
            created_at,
            read_at: None,
        };
        self.messages.push(message.clone());
        if let Some(c) = self.conversations.iter_mut().find(|c| c.id == conversation_id) {
            c.last_message_at = created_at;
        }
        message
    }

    fn create_conversation(&mut self, users: &[Uuid]) -> Uuid {
        let now = self.tick();
        let id = Uuid::now_v7();
        self.conversations.push(ConversationEntity { id, last_message_at: now, created_at: now });
        for user in users {
            self.participants.push((id, *user));
        }
        id
    }

    fn unread_for(&self, conversation_id: Uuid, user_id: Uuid) -> i64 {
        self.messages
            .iter()
            .filter(|m| {
                m.conversation_id == conversation_id && m.sender_id != user_id && m.read_at.is_none()
            })
            .count() as i64
    }
}

#[derive(Clone, Default)]
pub struct InMemoryMessaging {
    state: Arc<Mutex<MessagingState>>,
}

impl InMemoryMessaging {
    fn lock(&self) -> MutexGuard<'_, MessagingState> {
        self.state.lock().unwrap()
    }

    pub fn seed_conversation(&self, users: &[Uuid]) -> Uuid {
        self.lock().create_conversation(users)
    }

    pub fn seed_message(&self, conversation_id: Uuid, sender_id: Uuid, content: &str) -> MessageEntity {
        self.lock().insert_message(conversation_id, sender_id, content)
    }

    pub fn conversation_count(&self) -> usize {
        self.lock().conversations.len()
    }

    pub fn message_count(&self) -> usize {
        self.lock().messages.len()
    }

    pub fn participants_of(&self, conversation_id: Uuid) -> Vec<Uuid> {
        self.lock()
            .participants
            .iter()
            .filter(|(c, _)| *c == conversation_id)
            .map(|(_, u)| *u)
            .collect()
    }

    pub fn last_message_at(&self, conversation_id: Uuid) -> DateTime<Utc> {
        self.lock()
            .conversations
            .iter()
            .find(|c| c.id == conversation_id)
            .map(|c| c.last_message_at)
            .unwrap()
    }

    pub fn unread_in(&self, conversation_id: Uuid) -> usize {
        self.lock()
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id && m.read_at.is_none())
            .count()
    }
}

#[async_trait::async_trait]
impl ConversationRepository for InMemoryMessaging {
    async fn find_for_participant(
        &self,
        conversation_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<Option<ConversationEntity>, error::SystemError> {
        let state = self.lock();
        if !state.is_participant(*conversation_id, *user_id) {
            return Ok(None);
        }
        Ok(state.conversations.iter().find(|c| c.id == *conversation_id).cloned())
    }

    async fn find_between_users(
        &self,
        user_a: &Uuid,
        user_b: &Uuid,
    ) -> Result<Option<ConversationEntity>, error::SystemError> {
        let state = self.lock();
        Ok(state
            .conversations
            .iter()
            .find(|c| state.is_participant(c.id, *user_a) && state.is_participant(c.id, *user_b))
            .cloned())
    }

    async fn find_summaries_by_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<ConversationSummary>, error::SystemError> {
        let state = self.lock();
        let mut summaries: Vec<ConversationSummary> = state
            .conversations
            .iter()
            .filter(|c| state.is_participant(c.id, *user_id))
            .map(|c| {
                let last_message = state
                    .messages
                    .iter()
                    .filter(|m| m.conversation_id == c.id)
                    .max_by_key(|m| m.created_at)
                    .map(|m| LastMessage {
                        id: m.id,
                        sender_id: m.sender_id,
                        content: m.content.clone(),
                        created_at: m.created_at,
                        read_at: m.read_at,
                    });

                ConversationSummary {
                    id: c.id,
                    participant_ids: state
                        .participants
                        .iter()
                        .filter(|(conv, _)| *conv == c.id)
                        .map(|(_, u)| *u)
                        .collect(),
                    last_message_at: c.last_message_at,
                    created_at: c.created_at,
                    last_message,
                    unread_count: state.unread_for(c.id, *user_id),
                }
            })
            .collect();

        summaries.sort_by(|a, b| b.last_message_at.cmp(&a.last_message_at));
        Ok(summaries)
    }
}

#[async_trait::async_trait]
impl MessageRepository for InMemoryMessaging {
    async fn create(&self, message: &InsertMessage) -> Result<MessageEntity, error::SystemError> {
        Ok(self.lock().insert_message(message.conversation_id, message.sender_id, &message.content))
    }

    async fn create_direct(
        &self,
        sender_id: &Uuid,
        recipient_id: &Uuid,
        content: &str,
    ) -> Result<MessageEntity, error::SystemError> {
        let mut state = self.lock();
        let existing = state
            .conversations
            .iter()
            .find(|c| {
                state.is_participant(c.id, *sender_id) && state.is_participant(c.id, *recipient_id)
            })
            .map(|c| c.id);

        let conversation_id = match existing {
            Some(id) => id,
            None => state.create_conversation(&[*sender_id, *recipient_id]),
        };
        Ok(state.insert_message(conversation_id, *sender_id, content))
    }

    async fn find_thread_marking_read(
        &self,
        conversation_id: &Uuid,
        reader_id: &Uuid,
    ) -> Result<Vec<MessageEntity>, error::SystemError> {
        let mut state = self.lock();
        let now = state.tick();
        for message in state.messages.iter_mut() {
            if message.conversation_id == *conversation_id
                && message.sender_id != *reader_id
                && message.read_at.is_none()
            {
                message.read_at = Some(now);
            }
        }

        let mut thread: Vec<MessageEntity> = state
            .messages
            .iter()
            .filter(|m| m.conversation_id == *conversation_id)
            .cloned()
            .collect();
        thread.sort_by_key(|m| m.created_at);
        Ok(thread)
    }

    async fn count_unread(&self, user_id: &Uuid) -> Result<i64, error::SystemError> {
        let state = self.lock();
        Ok(state
            .conversations
            .iter()
            .filter(|c| state.is_participant(c.id, *user_id))
            .map(|c| state.unread_for(c.id, *user_id))
            .sum())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryUploads {
    records: Arc<Mutex<HashMap<Uuid, UploadEntity>>>,
    completing: Arc<Mutex<HashSet<Uuid>>>,
    failing_saves: Arc<AtomicBool>,
}

impl InMemoryUploads {
    pub fn get(&self, upload_id: &Uuid) -> Option<UploadEntity> {
        self.records.lock().unwrap().get(upload_id).cloned()
    }

    /// Makes every following `save` fail until switched back off.
    pub fn fail_saves(&self, failing: bool) {
        self.failing_saves.store(failing, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl UploadRepository for InMemoryUploads {
    async fn save(&self, upload: &UploadEntity) -> Result<(), error::SystemError> {
        if self.failing_saves.load(Ordering::SeqCst) {
            return Err(std::io::Error::other("upload store unavailable").into());
        }
        self.records.lock().unwrap().insert(upload.id, upload.clone());
        Ok(())
    }

    async fn find_by_id(&self, upload_id: &Uuid) -> Result<Option<UploadEntity>, error::SystemError> {
        Ok(self.get(upload_id))
    }

    async fn claim_completion(&self, upload_id: &Uuid) -> Result<bool, error::SystemError> {
        Ok(self.completing.lock().unwrap().insert(*upload_id))
    }

    async fn release_completion(&self, upload_id: &Uuid) -> Result<(), error::SystemError> {
        self.completing.lock().unwrap().remove(upload_id);
        Ok(())
    }
}
