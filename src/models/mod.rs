pub mod ids;
pub mod notification;
pub mod post;
pub mod session;
pub mod user;

pub use ids::{HistoryId, NotificationId, PostId, SessionId, UserId};
pub use notification::{Notification, NotificationKind};
pub use post::{Post, PostFilter, PostUpdate};
pub use session::{HistoryEntry, Session};
pub use user::{Avatar, User, UserProfile, UserUpdate};
