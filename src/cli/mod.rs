//! Terminal front end for the rate resolver

pub mod rates;
pub mod setup;
pub mod ui;
