pub mod campaigns;
pub(crate) mod health;
pub(crate) mod keys;
pub mod recipients;
