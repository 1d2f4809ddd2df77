use crate::command::CommandStrategy;

/// Strategy for printing the version.
pub struct VersionStrategy;

impl CommandStrategy for VersionStrategy {
    type Input = ();

    async fn execute(&self, (): Self::Input) -> anyhow::Result<()> {
        println!("glowbot {}", env!("CARGO_PKG_VERSION"));
        Ok(())
    }
}
