pub(crate) mod wealthsimple_provider;

pub use wealthsimple_provider::WealthsimpleProvider;
