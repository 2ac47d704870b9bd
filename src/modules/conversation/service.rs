use std::sync::Arc;
use uuid::Uuid;

use crate::{
    api::error,
    modules::conversation::{model::ConversationSummary, repository::ConversationRepository},
};

#[derive(Clone)]
pub struct ConversationService<R>
where
    R: ConversationRepository + Send + Sync + 'static,
{
    conversation_repo: Arc<R>,
}

impl<R> ConversationService<R>
where
    R: ConversationRepository + Send + Sync + 'static,
{
    pub fn with_dependencies(conversation_repo: Arc<R>) -> Self {
        log::info!("ConversationService initialized with dependencies");
        ConversationService { conversation_repo }
    }

    /// Conversations of `user_id`, most recently active first, each with its
    /// latest message and the number of messages the user has not read yet.
    pub async fn get_by_user_id(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<ConversationSummary>, error::SystemError> {
        self.conversation_repo.find_summaries_by_user(&user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::InMemoryMessaging;

    #[actix_web::test]
    async fn lists_most_recent_conversation_first_with_unread_counts() {
        let store = InMemoryMessaging::default();
        let (alice, bob, carol) = (Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7());

        let with_bob = store.seed_conversation(&[alice, bob]);
        let with_carol = store.seed_conversation(&[alice, carol]);

        store.seed_message(with_bob, bob, "hey alice");
        store.seed_message(with_bob, bob, "you there?");
        store.seed_message(with_carol, alice, "hi carol");
        store.seed_message(with_carol, carol, "hi!");

        let service = ConversationService::with_dependencies(Arc::new(store));
        let list = service.get_by_user_id(alice).await.unwrap();

        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id, with_carol);
        assert_eq!(list[0].unread_count, 1);
        assert_eq!(list[0].last_message.as_ref().map(|m| m.content.as_str()), Some("hi!"));
        assert_eq!(list[1].id, with_bob);
        assert_eq!(list[1].unread_count, 2);
    }

    #[actix_web::test]
    async fn own_messages_never_count_as_unread() {
        let store = InMemoryMessaging::default();
        let (alice, bob) = (Uuid::now_v7(), Uuid::now_v7());
        let conv = store.seed_conversation(&[alice, bob]);
        store.seed_message(conv, alice, "ping");

        let service = ConversationService::with_dependencies(Arc::new(store));

        let for_alice = service.get_by_user_id(alice).await.unwrap();
        assert_eq!(for_alice[0].unread_count, 0);

        let for_bob = service.get_by_user_id(bob).await.unwrap();
        assert_eq!(for_bob[0].unread_count, 1);
    }

    #[actix_web::test]
    async fn outsiders_see_nothing() {
        let store = InMemoryMessaging::default();
        let (alice, bob) = (Uuid::now_v7(), Uuid::now_v7());
        store.seed_conversation(&[alice, bob]);

        let service = ConversationService::with_dependencies(Arc::new(store));
        assert!(service.get_by_user_id(Uuid::now_v7()).await.unwrap().is_empty());
    }
}
