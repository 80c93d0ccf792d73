use std::env;

use tokio::fs;

use crate::{
    error::{Error, Result},
    format::format_path,
    request::RestoreRequest,
};

use super::args::GlobalArgs;

const ENV_VAR_PARAMS: &str = "RESTORE_PARAMS";

/// Reads the restore parameters from `--config`, falling back to `RESTORE_PARAMS`.
pub async fn load_request(args: &GlobalArgs) -> Result<RestoreRequest> {
    let json = if let Some(path) = &args.config {
        fs::read_to_string(path).await.map_err(|err| {
            Error::InvalidConfig(format!("could not read {}: {err}", format_path(path)))
        })?
    } else {
        env::var(ENV_VAR_PARAMS).map_err(|_| {
            Error::InvalidConfig(format!("either `--config` or `{ENV_VAR_PARAMS}` must be set"))
        })?
    };

    RestoreRequest::from_json(&json)
}
