//! Instagram webhook relay library — config, verification, dispatch, and the HTTP gateway
//! used by the `ig-relay` CLI.

pub mod channels;
pub mod config;
pub mod dispatch;
pub mod gateway;
pub mod verify;
