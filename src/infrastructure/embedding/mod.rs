mod embedder_factory;
mod hashing_embedder;
mod openai_embedder;

pub use embedder_factory::{EmbedderFactory, EmbedderFactoryError};
pub use hashing_embedder::HashingEmbedder;
pub use openai_embedder::OpenAiEmbedder;
