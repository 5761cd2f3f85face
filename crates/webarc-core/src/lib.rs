pub mod config;
pub mod logging;

pub mod archive;
pub mod css;
pub mod dom;
pub mod fetch;
pub mod ledger;
pub mod render;
pub mod resolve;
pub mod store;
pub mod template;
pub mod token;
pub mod url_norm;
