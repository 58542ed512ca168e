//! Multi-record mutations over the [`Store`].
//!
//! The store offers no multi-record transactions. Each operation performs its
//! primary write first and fails fast if that write fails; follow-up writes
//! to denormalized fields are best-effort and surface as
//! [`AppError::PartialFailure`](crate::error::AppError::PartialFailure), a
//! degraded receipt, or a log line. The like guard in
//! [`Store::like_post`] is the only atomic check-and-set.
//!
//! Every operation draws its store calls from one
//! [`Store::multi_step`] budget.

mod likes;
mod notifications;
mod posts;
mod users;

pub use likes::{LikeReceipt, UserIndex};
pub use notifications::NotificationBatch;

use crate::store::Store;

/// Entry point for all writes that touch more than one record
#[derive(Clone)]
pub struct Mutations {
    store: Store,
}

impl Mutations {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }
}
