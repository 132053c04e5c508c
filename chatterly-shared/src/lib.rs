#![cfg_attr(not(test), forbid(unsafe_code))]

//! Wire models, live channel event unions, and client configuration shared by
//! the Chatterly client library and its command-line front end.

pub mod config;
pub mod models;
