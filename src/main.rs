mod app;
mod audio;
mod config;
mod engine;
mod error;
mod events;
mod library;
mod runtime;
mod ui;

fn main() -> Result<(), error::Error> {
    runtime::run()
}
