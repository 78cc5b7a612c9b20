//! Key pair creation, storage, rotation, and signing for self-certifying
//! identifiers.

pub mod creators;
pub mod keeper;
pub mod manager;

pub use creators::{Algos, Creator, Creatory, RandyCreator, SaltyCreator};
pub use keeper::{Keeper, PubLot, PubSit};
pub use manager::Manager;
