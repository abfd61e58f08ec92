//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the persisted collections of the card game and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod balance;
pub mod banned_user;
pub mod card;
pub mod rarity;
pub mod shop_item;
pub mod shop_pack_card;
pub mod trade;
pub mod user;
pub mod user_card;

// Re-export specific types to avoid conflicts
pub use balance::{Column as BalanceColumn, Entity as Balance, Model as BalanceModel};
pub use banned_user::{
    Column as BannedUserColumn, Entity as BannedUser, Model as BannedUserModel,
};
pub use card::{Column as CardColumn, Entity as Card, Model as CardModel};
pub use rarity::{Column as RarityColumn, Entity as Rarity, Model as RarityModel};
pub use shop_item::{
    Column as ShopItemColumn, Entity as ShopItem, Model as ShopItemModel, ShopItemKind,
};
pub use shop_pack_card::{
    Column as ShopPackCardColumn, Entity as ShopPackCard, Model as ShopPackCardModel,
};
pub use trade::{Column as TradeColumn, Entity as Trade, Model as TradeModel, TradeStatus};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
pub use user_card::{Column as UserCardColumn, Entity as UserCard, Model as UserCardModel};
