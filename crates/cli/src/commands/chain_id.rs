use sequence::RawChainId;

use crate::cli::ChainIdArgs;
use crate::error::{CliError, Result};
use crate::output::ChainIdData;

/// Normalizes `args.value` the way provider chain ids are normalized: text is
/// always hex, so `10` means 16. `--decimal` reads the value as a number.
pub fn execute(args: &ChainIdArgs) -> Result<ChainIdData> {
	let value = args.value.trim();
	let raw = if args.decimal {
		let number = value
			.parse::<u64>()
			.map_err(|err| CliError::InvalidArgument(format!("{value:?} is not a decimal chain id: {err}")))?;
		RawChainId::Number(number)
	} else {
		RawChainId::Text(value.to_string())
	};
	let chain_id = raw.normalize().map_err(sequence::Error::from)?;

	Ok(ChainIdData {
		input: args.value.clone(),
		chain_id: chain_id.get(),
		hex: format!("{:#x}", chain_id.get()),
	})
}
