use uuid::Uuid;

use crate::{
    api::error,
    modules::conversation::{
        model::{ConversationRaw, ConversationSummary},
        repository::ConversationRepository,
        schema::ConversationEntity,
    },
};

pub(crate) const FIND_BETWEEN_USERS: &str = r#"
    SELECT c.*
    FROM conversations c
    WHERE EXISTS (
        SELECT 1
        FROM conversation_participants p1
        WHERE p1.conversation_id = c.id
        AND p1.user_id = $1
    )
    AND EXISTS (
        SELECT 1
        FROM conversation_participants p2
        WHERE p2.conversation_id = c.id
        AND p2.user_id = $2
    )
    ORDER BY c.created_at
    LIMIT 1
"#;

#[derive(Clone)]
pub struct ConversationRepositoryPg {
    pool: sqlx::PgPool,
}

impl ConversationRepositoryPg {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ConversationRepository for ConversationRepositoryPg {
    async fn find_for_participant(
        &self,
        conversation_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<Option<ConversationEntity>, error::SystemError> {
        let conversation = sqlx::query_as::<_, ConversationEntity>(
            r#"
            SELECT c.*
            FROM conversations c
            JOIN conversation_participants p
                ON p.conversation_id = c.id
                AND p.user_id = $2
            WHERE c.id = $1
            "#,
        )
        .bind(conversation_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(conversation)
    }

    async fn find_between_users(
        &self,
        user_a: &Uuid,
        user_b: &Uuid,
    ) -> Result<Option<ConversationEntity>, error::SystemError> {
        let conversation = sqlx::query_as::<_, ConversationEntity>(FIND_BETWEEN_USERS)
            .bind(user_a)
            .bind(user_b)
            .fetch_optional(&self.pool)
            .await?;

        Ok(conversation)
    }

    async fn find_summaries_by_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<ConversationSummary>, error::SystemError> {
        let rows = sqlx::query_as::<_, ConversationRaw>(
            r#"
            SELECT
                c.id,
                c.last_message_at,
                c.created_at,

                ARRAY(
                    SELECT cp.user_id
                    FROM conversation_participants cp
                    WHERE cp.conversation_id = c.id
                    ORDER BY cp.joined_at, cp.user_id
                ) AS participant_ids,

                lm.id           AS last_id,
                lm.sender_id    AS last_sender_id,
                lm.content      AS last_content,
                lm.created_at   AS last_created_at,
                lm.read_at      AS last_read_at,

                COALESCE(u.unread_count, 0) AS unread_count

            FROM conversations c

            JOIN conversation_participants p
                ON p.conversation_id = c.id
            AND p.user_id = $1

            LEFT JOIN LATERAL (
                SELECT id, sender_id, content, created_at, read_at
                FROM messages m
                WHERE m.conversation_id = c.id
                ORDER BY m.created_at DESC, m.id DESC
                LIMIT 1
            ) lm ON TRUE

            LEFT JOIN (
                SELECT m.conversation_id, COUNT(*) AS unread_count
                FROM messages m
                WHERE m.conversation_id IN (
                    SELECT conversation_id
                    FROM conversation_participants
                    WHERE user_id = $1
                )
                AND m.sender_id <> $1
                AND m.read_at IS NULL
                GROUP BY m.conversation_id
            ) u ON u.conversation_id = c.id

            ORDER BY c.last_message_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ConversationSummary::from).collect())
    }
}
