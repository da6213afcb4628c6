//! Notification trigger matching, payloads, ports and the check service

pub mod matcher;
pub mod message;
pub mod ports;
pub mod service;
