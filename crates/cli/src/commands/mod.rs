pub mod chain_id;
pub mod run;

use crate::cli::{Cli, Commands};
use crate::error::Result;
use crate::output::{OutputFormat, ResultBuilder, print_result};

pub async fn dispatch(cli: Cli, format: OutputFormat) -> Result<()> {
	match cli.command {
		Commands::Run(args) => {
			let data = run::execute(&args).await?;
			print_result(&ResultBuilder::new("run").data(data).build(), format);
		}
		Commands::ChainId(args) => {
			let data = chain_id::execute(&args)?;
			print_result(&ResultBuilder::new("chain-id").data(data).build(), format);
		}
	}
	Ok(())
}
