pub mod server;
pub mod sweep;

#[derive(Debug)]
pub enum Action {
    Server(server::Args),
    Sweep(sweep::Args),
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self) -> anyhow::Result<()> {
        match self {
            Self::Server(args) => server::execute(args).await,
            Self::Sweep(args) => sweep::execute(args).await,
        }
    }
}
