/// Stores
///
/// A store owns one entity family: it validates input, enforces the
/// cross-record rules (email uniqueness, referenced users) and then talks to
/// the repository traits. Expected failures come back as [`StoreError`]
/// values.
///
/// [`StoreError`]: crate::error::StoreError

mod task_store;
mod user_store;

pub use task_store::TaskStore;
pub use user_store::UserStore;
