use uuid::Uuid;

use crate::{
    api::error,
    modules::{
        conversation::{repository_pg::FIND_BETWEEN_USERS, schema::ConversationEntity},
        message::{model::InsertMessage, repository::MessageRepository, schema::MessageEntity},
    },
};

#[derive(Clone)]
pub struct MessageRepositoryPg {
    pool: sqlx::PgPool,
}

impl MessageRepositoryPg {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

async fn insert_message<'e, E>(
    message: &InsertMessage,
    tx: E,
) -> Result<MessageEntity, error::SystemError>
where
    E: sqlx::Executor<'e, Database = sqlx::Postgres>,
{
    let entity = sqlx::query_as::<_, MessageEntity>(
        r#"
        INSERT INTO messages (id, conversation_id, sender_id, content)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(Uuid::now_v7())
    .bind(message.conversation_id)
    .bind(message.sender_id)
    .bind(&message.content)
    .fetch_one(tx)
    .await?;

    Ok(entity)
}

async fn touch_conversation<'e, E>(
    conversation_id: &Uuid,
    at: chrono::DateTime<chrono::Utc>,
    tx: E,
) -> Result<(), error::SystemError>
where
    E: sqlx::Executor<'e, Database = sqlx::Postgres>,
{
    sqlx::query("UPDATE conversations SET last_message_at = $2 WHERE id = $1")
        .bind(conversation_id)
        .bind(at)
        .execute(tx)
        .await?;

    Ok(())
}

#[async_trait::async_trait]
impl MessageRepository for MessageRepositoryPg {
    async fn create(&self, message: &InsertMessage) -> Result<MessageEntity, error::SystemError> {
        let mut tx = self.pool.begin().await?;

        let entity = insert_message(message, &mut *tx).await?;
        touch_conversation(&entity.conversation_id, entity.created_at, &mut *tx).await?;

        tx.commit().await?;
        Ok(entity)
    }

    async fn create_direct(
        &self,
        sender_id: &Uuid,
        recipient_id: &Uuid,
        content: &str,
    ) -> Result<MessageEntity, error::SystemError> {
        let mut tx = self.pool.begin().await?;

        // serialize first messages between the same pair
        let (lo, hi) =
            if sender_id <= recipient_id { (sender_id, recipient_id) } else { (recipient_id, sender_id) };
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(format!("{lo}:{hi}"))
            .execute(&mut *tx)
            .await?;

        let existing = sqlx::query_as::<_, ConversationEntity>(FIND_BETWEEN_USERS)
            .bind(sender_id)
            .bind(recipient_id)
            .fetch_optional(&mut *tx)
            .await?;

        let conversation_id = match existing {
            Some(conversation) => conversation.id,
            None => {
                let conversation = sqlx::query_as::<_, ConversationEntity>(
                    "INSERT INTO conversations (id) VALUES ($1) RETURNING *",
                )
                .bind(Uuid::now_v7())
                .fetch_one(&mut *tx)
                .await?;

                sqlx::query(
                    r#"
                    INSERT INTO conversation_participants (conversation_id, user_id)
                    SELECT $1, unnest($2::uuid[])
                    "#,
                )
                .bind(conversation.id)
                .bind(vec![*sender_id, *recipient_id])
                .execute(&mut *tx)
                .await?;

                log::info!(
                    "Conversation {} started between {} and {}",
                    conversation.id,
                    sender_id,
                    recipient_id
                );
                conversation.id
            }
        };

        let entity = insert_message(
            &InsertMessage { conversation_id, sender_id: *sender_id, content: content.to_string() },
            &mut *tx,
        )
        .await?;
        touch_conversation(&conversation_id, entity.created_at, &mut *tx).await?;

        tx.commit().await?;
        Ok(entity)
    }

    async fn find_thread_marking_read(
        &self,
        conversation_id: &Uuid,
        reader_id: &Uuid,
    ) -> Result<Vec<MessageEntity>, error::SystemError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE messages
            SET read_at = NOW()
            WHERE conversation_id = $1
            AND sender_id <> $2
            AND read_at IS NULL
            "#,
        )
        .bind(conversation_id)
        .bind(reader_id)
        .execute(&mut *tx)
        .await?;

        let messages = sqlx::query_as::<_, MessageEntity>(
            "SELECT * FROM messages WHERE conversation_id = $1 ORDER BY created_at ASC, id ASC",
        )
        .bind(conversation_id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(messages)
    }

    async fn count_unread(&self, user_id: &Uuid) -> Result<i64, error::SystemError> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM messages m
            JOIN conversation_participants p
                ON p.conversation_id = m.conversation_id
                AND p.user_id = $1
            WHERE m.sender_id <> $1
            AND m.read_at IS NULL
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[sqlx::test]
    #[ignore = "needs a Postgres instance in DATABASE_URL"]
    async fn direct_messages_share_one_conversation(pool: sqlx::PgPool) {
        let repo = MessageRepositoryPg::new(pool.clone());
        let (alice, bob) = (Uuid::now_v7(), Uuid::now_v7());

        let first = repo.create_direct(&alice, &bob, "hello").await.unwrap();
        let reply = repo.create_direct(&bob, &alice, "hi").await.unwrap();
        assert_eq!(first.conversation_id, reply.conversation_id);

        let conversations: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM conversations")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(conversations, 1);

        let last_message_at: chrono::DateTime<chrono::Utc> =
            sqlx::query_scalar("SELECT last_message_at FROM conversations WHERE id = $1")
                .bind(first.conversation_id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(last_message_at, reply.created_at);
    }

    #[sqlx::test]
    #[ignore = "needs a Postgres instance in DATABASE_URL"]
    async fn reading_a_thread_marks_only_incoming_messages(pool: sqlx::PgPool) {
        let repo = MessageRepositoryPg::new(pool);
        let (alice, bob) = (Uuid::now_v7(), Uuid::now_v7());

        let incoming = repo.create_direct(&alice, &bob, "one").await.unwrap();
        repo.create(&InsertMessage {
            conversation_id: incoming.conversation_id,
            sender_id: alice,
            content: "two".to_string(),
        })
        .await
        .unwrap();
        let own = repo
            .create(&InsertMessage {
                conversation_id: incoming.conversation_id,
                sender_id: bob,
                content: "three".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(repo.count_unread(&bob).await.unwrap(), 2);
        assert_eq!(repo.count_unread(&alice).await.unwrap(), 1);

        let thread = repo.find_thread_marking_read(&incoming.conversation_id, &bob).await.unwrap();
        assert_eq!(thread.len(), 3);
        assert!(thread.iter().filter(|m| m.sender_id == alice).all(|m| m.read_at.is_some()));
        assert!(thread.iter().find(|m| m.id == own.id).unwrap().read_at.is_none());

        assert_eq!(repo.count_unread(&bob).await.unwrap(), 0);
        assert_eq!(repo.count_unread(&alice).await.unwrap(), 1);
    }
}
