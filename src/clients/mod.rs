pub mod edamam;
pub mod provider;

pub use edamam::EdamamClient;
pub use provider::{FoodProvider, ProviderError};
