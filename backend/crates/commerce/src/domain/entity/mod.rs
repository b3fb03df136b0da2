pub mod favorite;
pub mod order;
pub mod profile;

pub use favorite::{Favorite, FavoriteEntry, SortOrder};
pub use order::{ContactSnapshot, FulfilledOrder, Order, OrderItem, OrderStatus};
pub use profile::{ContactMethod, Profile, ProfileSummary};
