mod common;

mod commands;
mod sessions;
mod transport;
