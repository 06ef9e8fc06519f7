//! Domain enums and request/response shapes shared across handlers.

pub mod manga;
pub mod pagination;
pub mod role;

pub use manga::{MangaKind, MangaSort, MangaStatus};
pub use pagination::{PageMeta, PageQuery, Paginated};
pub use role::{PRIVILEGED_ROLES, Role};
