use std::process::ExitCode;

mod app;
mod args;
mod constants;
mod logger;
mod prompt;
mod render;

use crate::app::App;

#[tokio::main]
async fn main() -> ExitCode {
    App::new().run().await
}
