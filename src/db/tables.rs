use redb::TableDefinition;

/// Users table: user_id -> User (serialized)
pub const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

/// User names index: name -> user_id
/// Kept in the same write transaction as the user record it points to
pub const USER_NAMES: TableDefinition<&str, &str> = TableDefinition::new("user_names");

/// Posts table: post_id -> Post (serialized)
pub const POSTS: TableDefinition<&str, &[u8]> = TableDefinition::new("posts");

/// Notifications table: notification_id -> Notification (serialized)
pub const NOTIFICATIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("notifications");

/// Sessions table: session_id -> Session (serialized)
pub const SESSIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("sessions");

/// History table: history_id -> HistoryEntry (serialized), append-only
pub const HISTORY: TableDefinition<&str, &[u8]> = TableDefinition::new("history");
