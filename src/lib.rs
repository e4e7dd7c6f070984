//! # CV Recognition Telegram Bot
//!
//! A Telegram bot that forwards user-submitted images to AWS Rekognition
//! and replies with an annotated image or the detected moderation labels.

pub mod bot;
pub mod config;
pub mod rekognition;
pub mod render;
pub mod session;
