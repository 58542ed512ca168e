use thiserror::Error;

/// Record collections addressed by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Users,
    Posts,
    Notifications,
    Sessions,
    History,
}

impl Collection {
    /// Collection name, shared by the redb table names
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Posts => "posts",
            Collection::Notifications => "notifications",
            Collection::Sessions => "sessions",
            Collection::History => "history",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Store error type
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{collection} record not found: {id}")]
    NotFound { collection: Collection, id: String },

    #[error("Conflict in {collection}: {reason}")]
    Conflict {
        collection: Collection,
        reason: String,
    },

    #[error("Store call timed out: {op}")]
    Timeout { op: &'static str },

    #[error("Database error: {0}")]
    Database(#[from] redb::Error),

    #[error("Database open error: {0}")]
    Open(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::error::EncodeError),

    #[error("Deserialization error: {0}")]
    Deserialization(#[from] bincode::error::DecodeError),

    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn not_found(collection: Collection, id: impl ToString) -> Self {
        StoreError::NotFound {
            collection,
            id: id.to_string(),
        }
    }

    pub fn conflict(collection: Collection, reason: impl Into<String>) -> Self {
        StoreError::Conflict {
            collection,
            reason: reason.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Result type alias for store calls
pub type StoreResult<T> = std::result::Result<T, StoreError>;
