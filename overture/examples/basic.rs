//! Basic example: run one templated request end to end.
//!
//! Uses the echo backend (no provider selector in the header) so it works
//! without a running model server. Point `ollama_url` at a local Ollama to
//! dispatch for real.
//!
//! ```bash
//! cargo run --example basic
//! ```

use futures::StreamExt;
use overture::hook::{builtin_registry, StaticPipe};
use overture::{ChatRequest, DefaultProviderFactory, IncomingChat, Message, Pipeline};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "overture=debug".into()),
        )
        .init();

    let mut registry = builtin_registry();
    registry.register_pipe(
        "canned",
        Arc::new(StaticPipe::new("canned reply for: {user_message}")),
    );

    let pipeline = Pipeline::builder(Arc::new(DefaultProviderFactory::new()))
        .hooks(registry)
        .finish();

    // Front-matter header plus a templated body. With no provider selector
    // the rendered prompt is echoed back as a single fragment.
    let prompt = "---\ntone: cheerful\n---\nYou are a {tone} assistant working in {workdir}.";

    let chat = IncomingChat {
        user_message: "What is Rust?".to_string(),
        model_id: "demo".to_string(),
        history: vec![],
        request: ChatRequest::new(
            vec![Message::system(prompt), Message::user("What is Rust?")],
            true,
        ),
    };

    let mut fragments = pipeline.run(chat).await;
    while let Some(fragment) = fragments.next().await {
        println!("{}", fragment);
    }
}
