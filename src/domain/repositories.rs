//! Aggregated repository access

use crate::domain::category::CategoryRepository;
use crate::domain::product::ProductRepository;
use crate::domain::reservation::ReservationRepository;
use crate::domain::review::ReviewRepository;
use crate::domain::user::UserRepository;

/// Unified per-aggregate repository accessor.
///
/// Holds one connection pool behind the scenes and hands out repository
/// references so services and handlers depend on traits, not on the
/// concrete storage backend.
///
/// ```ignore
/// let repos: Arc<dyn RepositoryProvider> = Arc::new(SeaOrmRepositoryProvider::new(db));
/// let user = repos.users().find_by_email("a@b.com").await?;
/// ```
pub trait RepositoryProvider: Send + Sync {
    fn users(&self) -> &dyn UserRepository;
    fn products(&self) -> &dyn ProductRepository;
    fn categories(&self) -> &dyn CategoryRepository;
    fn reservations(&self) -> &dyn ReservationRepository;
    fn reviews(&self) -> &dyn ReviewRepository;
}
