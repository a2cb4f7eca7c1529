mod cli;
mod demo;
mod render;

use parkade_core::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
