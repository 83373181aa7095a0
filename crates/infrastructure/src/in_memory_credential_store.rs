use async_trait::async_trait;
use portalgate_application::CredentialStore;
use portalgate_core::{AppResult, BearerToken};
use tokio::sync::RwLock;

/// Process-local credential store. Tokens do not survive a restart.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    token: RwLock<Option<BearerToken>>,
}

impl InMemoryCredentialStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn load(&self) -> AppResult<Option<BearerToken>> {
        Ok(self.token.read().await.clone())
    }

    async fn store(&self, token: BearerToken) -> AppResult<()> {
        *self.token.write().await = Some(token);
        Ok(())
    }

    async fn clear(&self) -> AppResult<()> {
        self.token.write().await.take();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use portalgate_application::CredentialStore;
    use portalgate_core::BearerToken;

    use super::InMemoryCredentialStore;

    #[tokio::test]
    async fn store_replaces_and_clear_empties() {
        let store = InMemoryCredentialStore::new();
        assert!(matches!(store.load().await, Ok(None)));

        for value in ["first", "second"] {
            let Ok(token) = BearerToken::new(value) else {
                panic!("token should be valid");
            };
            assert!(store.store(token).await.is_ok());
        }

        let Ok(Some(loaded)) = store.load().await else {
            panic!("token should be stored");
        };
        assert_eq!(loaded.expose(), "second");

        assert!(store.clear().await.is_ok());
        assert!(store.clear().await.is_ok());
        assert!(matches!(store.load().await, Ok(None)));
    }
}
