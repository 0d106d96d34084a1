//! Built-in inlet hooks.

use async_trait::async_trait;
use overture_core::error::EngineError;
use overture_core::hooks::InletHook;
use overture_core::types::{ChatRequest, Message, Role};

/// Inlet for backends that reject the system role.
///
/// Drops system messages and folds the rendered prompt into the first user
/// message instead, so the instructions still reach the model.
#[derive(Debug, Default, Clone)]
pub struct SystemlessInlet;

impl SystemlessInlet {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl InletHook for SystemlessInlet {
    async fn shape(
        &self,
        mut request: ChatRequest,
        prompt: &str,
    ) -> Result<ChatRequest, EngineError> {
        request.messages.retain(|m| m.role != Role::System);

        match request.messages.iter_mut().find(|m| m.role == Role::User) {
            Some(first_user) => {
                first_user.content = format!("{}\n\n{}", prompt, first_user.content);
            }
            None => request.messages.insert(0, Message::user(prompt)),
        }

        Ok(request)
    }
}
