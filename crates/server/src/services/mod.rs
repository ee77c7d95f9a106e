pub mod audit;
pub mod credentials;
