pub mod analytics;
pub mod article;
pub mod filter;
pub mod pageview;
