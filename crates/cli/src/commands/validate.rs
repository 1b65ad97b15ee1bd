//! `validate` command implementation.

use anyhow::Result;
use serde_json::json;
use tracing::info;

use crate::cli::ValidateArgs;

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = config_loader::ConfigLoader::load_from_path(&args.config);

    if args.json {
        let output = match &result {
            Ok(_) => json!({ "valid": true, "config": args.config.display().to_string() }),
            Err(e) => json!({
                "valid": false,
                "config": args.config.display().to_string(),
                "error": e.to_string(),
            }),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        match &result {
            Ok(_) => println!("Configuration valid: {}", args.config.display()),
            Err(e) => println!("Configuration invalid: {e}"),
        }
    }

    result.map(|_| ()).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_ok_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tally.toml");
        std::fs::write(&path, "[input]\nmode = \"mock\"\n").unwrap();

        let args = ValidateArgs {
            config: path,
            json: false,
        };
        assert!(run_validate(&args).is_ok());
    }

    #[test]
    fn test_validate_bad_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tally.toml");
        std::fs::write(&path, "[workers]\nproducers = 0\n").unwrap();

        let args = ValidateArgs {
            config: path,
            json: true,
        };
        assert!(run_validate(&args).is_err());
    }
}
