pub mod category;
pub mod game;
pub mod user;

pub use category::{Category, Choice, Taxonomy};
pub use game::{CategoryFilter, Game, NewGame};
pub use user::{NewUser, User};
