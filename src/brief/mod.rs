pub mod audit;
pub mod config;
pub mod consent;
pub mod extract;
pub mod history;
pub mod host;
pub mod paths;
pub mod prefs;
pub mod send;
pub mod share_input;
pub mod site;
pub mod store;
pub mod submission;
pub mod util;
pub mod warn;
