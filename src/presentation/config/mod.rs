mod environment;
mod settings;

pub use environment::Environment;
pub use settings::{
    DatabaseSettings, EmbeddingProvider, EmbeddingsSettings, LoggingSettings, MirrorSettings,
    QdrantSettings, QueueSettings, ServerSettings, Settings, StorageProviderSetting,
    StorageSettings,
};
