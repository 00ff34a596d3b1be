mod cli;
mod commands;
mod logging;

use crate::cli::Cli;
use clap::Parser;
use mediastore_config::Settings;

/// Render layered errors, including their causes and locations, for miette.
pub(crate) trait IntoReport<T> {
    fn into_report(self) -> miette::Result<T>;
}
impl<T, E> IntoReport<T> for Result<T, exn::Exn<E>>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn into_report(self) -> miette::Result<T> {
        self.map_err(|err| miette::miette!("{err:?}"))
    }
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let settings = Settings::load(cli.config.as_deref()).into_report()?;
    commands::run(cli.command, &settings).await
}
